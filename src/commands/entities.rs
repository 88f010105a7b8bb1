use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{
    Category, Example, LabeledError, PipelineData, Record, Signature, SyntaxShape, Type, Value,
};

use crate::algo::annotate::Annotator;
use crate::StorylinePlugin;

pub struct Entities;

impl PluginCommand for Entities {
    type Plugin = StorylinePlugin;

    fn name(&self) -> &str {
        "storyline entities"
    }

    fn description(&self) -> &str {
        "List the named-entity terms extracted from a text"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .input_output_types(vec![
                (Type::Nothing, Type::table()),
                (Type::String, Type::table()),
            ])
            .optional("text", SyntaxShape::String, "Text to annotate")
            .switch("tokens", "Show every token with its tag instead", None)
            .category(Category::Experimental)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["entity", "ner", "pos", "lemma", "stem"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![
            Example {
                example: r#"storyline entities "Joe Biden met Xi Jinping in San Francisco""#,
                description: "Extract entity terms",
                result: None,
            },
            Example {
                example: r#""NASA delays Artemis 2" | storyline entities --tokens"#,
                description: "Show part-of-speech tags, lemmas and stems",
                result: None,
            },
        ]
    }

    fn run(
        &self,
        _plugin: &StorylinePlugin,
        _engine: &EngineInterface,
        call: &EvaluatedCall,
        input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        let head = call.head;
        let text = match call.opt::<String>(0)? {
            Some(text) => text,
            None => input
                .into_iter()
                .filter_map(|v| v.coerce_string().ok())
                .collect::<Vec<_>>()
                .join("\n"),
        };
        let tokens: bool = call.has_flag("tokens")?;
        let annotator = Annotator::default();

        let rows: Vec<Value> = if tokens {
            annotator
                .annotate(&text)
                .iter()
                .map(|t| {
                    let mut r = Record::new();
                    r.push("text", Value::string(&t.text, head));
                    r.push("pos", Value::string(t.pos.as_str(), head));
                    r.push("lemma", Value::string(&t.lemma, head));
                    r.push("stem", Value::string(&t.stem, head));
                    Value::record(r, head)
                })
                .collect()
        } else {
            annotator
                .terms(&text)
                .iter()
                .map(|t| {
                    let mut r = Record::new();
                    r.push("text", Value::string(t.text.trim(), head));
                    r.push("lemma", Value::string(t.lemma.trim(), head));
                    r.push("stem", Value::string(t.stem.trim(), head));
                    Value::record(r, head)
                })
                .collect()
        };

        Ok(PipelineData::Value(Value::list(rows, head), None))
    }
}
