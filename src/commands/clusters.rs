use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{
    Category, Example, LabeledError, PipelineData, Signature, SyntaxShape, Type, Value,
};

use crate::algo::annotate::Annotator;
use crate::algo::corpus::{Corpus, Snapshot};
use crate::algo::extract::{extract_clusters, ClusterConfig};
use crate::commands::util::{feed_row, normalize_input, report_to_value};
use crate::StorylinePlugin;

pub struct Clusters;

impl PluginCommand for Clusters {
    type Plugin = StorylinePlugin;

    fn name(&self) -> &str {
        "storyline clusters"
    }

    fn description(&self) -> &str {
        "Group news articles into story clusters ranked by importance"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .input_output_types(vec![
                (Type::table(), Type::table()),
                (Type::table(), Type::String),
            ])
            .named(
                "rounds",
                SyntaxShape::Int,
                "Number of clusters to extract (default: 20)",
                Some('r'),
            )
            .named(
                "members",
                SyntaxShape::Int,
                "Articles shown per cluster (default: 5)",
                Some('m'),
            )
            .named(
                "same-source-penalty",
                SyntaxShape::Number,
                "Edge weight factor for articles from the same source (default: 0.5)",
                None,
            )
            .named(
                "config",
                SyntaxShape::Filepath,
                "JSON file with cluster settings; flags override it",
                Some('c'),
            )
            .switch("text", "Render the plain-text listing instead of a table", Some('t'))
            .category(Category::Experimental)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["news", "cluster", "story", "rss", "headlines", "pagerank"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![
            Example {
                example: r#"open items.json | storyline clusters --rounds 10"#,
                description: "Cluster fetched items (title, description, link, source, feed)",
                result: None,
            },
            Example {
                example: r#"open items.json | storyline clusters --text"#,
                description: "Plain-text listing with ranks and lemma lists",
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
        let mut config = match call.get_flag::<String>("config")? {
            Some(path) => load_config(&path)?,
            None => ClusterConfig::default(),
        };
        if let Some(rounds) = call.get_flag::<i64>("rounds")? {
            config.rounds = rounds.max(0) as usize;
        }
        if let Some(members) = call.get_flag::<i64>("members")? {
            config.members = members.max(0) as usize;
        }
        if let Some(penalty) = call.get_flag::<f64>("same-source-penalty")? {
            config.same_source_penalty = penalty;
        }
        config
            .validate()
            .map_err(|e| LabeledError::new(e.to_string()).with_label("invalid settings", head))?;
        let text: bool = call.has_flag("text")?;

        let rows = normalize_input(input, head);
        let snapshot = Snapshot::from_rows(rows.iter().map(feed_row));
        let corpus = Corpus::build(&snapshot, &Annotator::default())
            .map_err(|e| LabeledError::new(e.to_string()))?;
        let clusters = extract_clusters(&corpus, &config);

        if text {
            let listing: String = clusters.iter().map(ToString::to_string).collect();
            return Ok(PipelineData::Value(Value::string(listing, head), None));
        }

        let output: Vec<Value> = clusters
            .iter()
            .map(|cluster| report_to_value(&cluster.report(), head))
            .collect();
        Ok(PipelineData::Value(Value::list(output, head), None))
    }
}

fn load_config(path: &str) -> Result<ClusterConfig, LabeledError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| LabeledError::new(format!("Failed to read config {path}: {e}")))?;
    serde_json::from_str(&raw)
        .map_err(|e| LabeledError::new(format!("Invalid config {path}: {e}")))
}
