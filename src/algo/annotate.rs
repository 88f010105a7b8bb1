//! Linguistic annotation: part-of-speech tags, lemmas, stems and the
//! proper-noun entity grammar that turns a text into weighted terms.

use std::collections::HashSet;

use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};

use crate::algo::tokenizer::{self, RawToken, Shape};

/// Universal-POS style tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PosTag {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Pronoun,
    Determiner,
    Adposition,
    Conjunction,
    Auxiliary,
    Numeral,
    Particle,
    Punctuation,
    ProperNoun,
}

impl PosTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PosTag::Noun => "NOUN",
            PosTag::Verb => "VERB",
            PosTag::Adjective => "ADJ",
            PosTag::Adverb => "ADV",
            PosTag::Pronoun => "PRON",
            PosTag::Determiner => "DET",
            PosTag::Adposition => "ADP",
            PosTag::Conjunction => "CCONJ",
            PosTag::Auxiliary => "AUX",
            PosTag::Numeral => "NUM",
            PosTag::Particle => "PART",
            PosTag::Punctuation => "PUNCT",
            PosTag::ProperNoun => "PROPN",
        }
    }
}

/// An annotated token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub lemma: String,
    pub stem: String,
    pub pos: PosTag,
}

/// One matched entity, stored as three parallel space-padded strings so that
/// `" new york "` never substring-matches inside `" new yorker "`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Term {
    pub text: String,
    pub lemma: String,
    pub stem: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Description fields shorter than this (in characters) are treated as empty.
    pub min_description_chars: usize,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            min_description_chars: 15,
        }
    }
}

/// Tags, lemmatises and stems English text, then extracts entity terms.
pub struct Annotator {
    stemmer: Stemmer,
    config: AnnotatorConfig,
}

impl std::fmt::Debug for Annotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotator")
            .field("config", &self.config)
            .finish()
    }
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new(AnnotatorConfig::default())
    }
}

impl Annotator {
    pub fn new(config: AnnotatorConfig) -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
            config,
        }
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    /// Description text below the minimum length is blanked.
    pub fn normalize_description<'a>(&self, text: &'a str) -> &'a str {
        if text.chars().count() < self.config.min_description_chars {
            ""
        } else {
            text
        }
    }

    /// Tokenize and tag a text.
    pub fn annotate(&self, text: &str) -> Vec<Token> {
        let raw = tokenizer::tokenize(text);
        let title_case = is_title_case(&raw);
        let uncapitalised = uncapitalised_words(&raw);
        raw.iter()
            .map(|t| {
                let pos = tag(t, title_case, &uncapitalised);
                let lower = t.text.to_lowercase();
                let lemma = lemmatize(&lower, pos);
                let stem = self.stemmer.stem(&lower).into_owned();
                Token {
                    text: t.text.clone(),
                    lemma,
                    stem,
                    pos,
                }
            })
            .collect()
    }

    /// Annotate a text and return its entity terms in order of appearance.
    pub fn terms(&self, text: &str) -> Vec<Term> {
        let tokens = self.annotate(text);
        let tags: Vec<PosTag> = tokens.iter().map(|t| t.pos).collect();
        entity_spans(&tags)
            .into_iter()
            .map(|(start, end)| {
                let span = &tokens[start..end];
                Term {
                    text: join_padded(span.iter().map(|t| t.text.as_str())),
                    lemma: join_padded(span.iter().map(|t| t.lemma.as_str())),
                    stem: join_padded(span.iter().map(|t| t.stem.as_str())),
                }
            })
            .collect()
    }
}

fn join_padded<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    format!(" {} ", parts.collect::<Vec<_>>().join(" "))
}

// ── Entity grammar ───────────────────────────────────────────────────────────

/// Find entity spans `[start, end)` over a tag sequence.
///
/// Patterns, tried at every position, longest match wins:
///   1. PROPN PROPN? PROPN? PROPN?
///   2. PROPN (ADJ|PROPN) PROPN? PROPN?
///   3. (PROPN|ADJ) PROPN
///   4. PROPN NUM
///
/// Matches never overlap; scanning resumes after the end of each match.
pub fn entity_spans(tags: &[PosTag]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut i = 0;
    while i < tags.len() {
        let len = [
            match_propn_run(&tags[i..]),
            match_propn_modifier(&tags[i..]),
            match_modified_propn(&tags[i..]),
            match_propn_cardinal(&tags[i..]),
        ]
        .into_iter()
        .max()
        .unwrap_or(0);

        if len > 0 {
            spans.push((i, i + len));
            i += len;
        } else {
            i += 1;
        }
    }
    spans
}

fn is_propn(tag: Option<&PosTag>) -> bool {
    matches!(tag, Some(PosTag::ProperNoun))
}

fn match_propn_run(tags: &[PosTag]) -> usize {
    tags.iter()
        .take(4)
        .take_while(|t| **t == PosTag::ProperNoun)
        .count()
}

fn match_propn_modifier(tags: &[PosTag]) -> usize {
    if !is_propn(tags.first()) {
        return 0;
    }
    if !matches!(
        tags.get(1),
        Some(PosTag::Adjective) | Some(PosTag::ProperNoun)
    ) {
        return 0;
    }
    let tail = tags[2..]
        .iter()
        .take(2)
        .take_while(|t| **t == PosTag::ProperNoun)
        .count();
    2 + tail
}

fn match_modified_propn(tags: &[PosTag]) -> usize {
    match (tags.first(), tags.get(1)) {
        (Some(PosTag::ProperNoun | PosTag::Adjective), Some(PosTag::ProperNoun)) => 2,
        _ => 0,
    }
}

fn match_propn_cardinal(tags: &[PosTag]) -> usize {
    match (tags.first(), tags.get(1)) {
        (Some(PosTag::ProperNoun), Some(PosTag::Numeral)) => 2,
        _ => 0,
    }
}

// ── Tagger ───────────────────────────────────────────────────────────────────

/// Headlines capitalise most words; there a capitalised common word is not
/// taken as a name.
fn is_title_case(tokens: &[RawToken]) -> bool {
    let words: Vec<&RawToken> = tokens.iter().filter(|t| t.shape == Shape::Word).collect();
    if words.len() < 3 {
        return false;
    }
    let capitalised = words.iter().filter(|t| starts_upper(&t.text)).count();
    capitalised * 4 >= words.len() * 3
}

/// Lowercased forms of the words a text writes in lower case.
fn uncapitalised_words(tokens: &[RawToken]) -> HashSet<String> {
    tokens
        .iter()
        .filter(|t| t.shape == Shape::Word && !starts_upper(&t.text))
        .map(|t| t.text.to_lowercase())
        .collect()
}

fn starts_upper(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

fn is_all_caps(word: &str) -> bool {
    let mut letters = word.chars().filter(|c| c.is_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(char::is_uppercase)
}

fn tag(token: &RawToken, title_case: bool, uncapitalised: &HashSet<String>) -> PosTag {
    match token.shape {
        Shape::Punct => return PosTag::Punctuation,
        Shape::Number => return PosTag::Numeral,
        Shape::Possessive => return PosTag::Particle,
        Shape::Word => {}
    }

    let lower = token.text.to_lowercase();
    if let Some(closed) = closed_class(&lower) {
        // An all-caps closed-class word ("US", "IT") is an acronym.
        if !(is_all_caps(&token.text) && token.text.chars().count() > 1) {
            return closed;
        }
    }
    if is_number_word(&lower) {
        return PosTag::Numeral;
    }
    if is_demonym(&lower) {
        return PosTag::Adjective;
    }

    // Capitalisation carries no signal at a sentence start or in a headline.
    // There a word is demoted only when it is a known common word or the
    // same text uses it in lower case.
    if starts_upper(&token.text) {
        let ambiguous = token.sentence_start || title_case;
        let common = is_common_word(&lower) || uncapitalised.contains(&lower);
        if !(ambiguous && common) {
            return PosTag::ProperNoun;
        }
    }

    open_class(&lower)
}

fn closed_class(word: &str) -> Option<PosTag> {
    let tag = match word {
        "a" | "an" | "the" | "this" | "that" | "these" | "those" | "every" | "each" | "some"
        | "any" | "no" | "all" | "both" | "either" | "neither" | "another" => PosTag::Determiner,
        "of" | "to" | "in" | "for" | "on" | "with" | "at" | "by" | "from" | "as" | "into"
        | "over" | "after" | "before" | "about" | "against" | "between" | "during" | "under"
        | "through" | "amid" | "among" | "across" | "near" | "without" | "within" | "since"
        | "until" | "via" | "per" | "despite" | "toward" | "towards" | "behind" | "beyond"
        | "upon" | "onto" | "off" | "above" | "below" => PosTag::Adposition,
        "i" | "me" | "you" | "he" | "him" | "she" | "her" | "it" | "we" | "us" | "they"
        | "them" | "his" | "its" | "our" | "their" | "my" | "your" | "who" | "whom" | "what"
        | "which" | "whose" | "itself" | "themselves" | "himself" | "herself" => PosTag::Pronoun,
        "and" | "or" | "but" | "nor" | "yet" | "so" | "if" | "because" | "while" | "although"
        | "though" | "when" | "where" | "whether" | "than" => PosTag::Conjunction,
        "is" | "are" | "was" | "were" | "be" | "been" | "being" | "am" | "has" | "have"
        | "had" | "do" | "does" | "did" | "will" | "would" | "can" | "could" | "should"
        | "may" | "might" | "must" | "shall" => PosTag::Auxiliary,
        "not" | "n't" | "up" | "out" | "down" => PosTag::Particle,
        "very" | "also" | "just" | "now" | "then" | "here" | "there" | "again" | "still"
        | "even" | "only" | "how" | "why" | "too" | "more" | "most" | "less" | "never"
        | "ever" | "already" | "soon" => PosTag::Adverb,
        _ => return None,
    };
    Some(tag)
}

fn is_number_word(word: &str) -> bool {
    matches!(
        word,
        "one" | "two" | "three" | "four" | "five" | "six" | "seven" | "eight" | "nine" | "ten"
            | "eleven" | "twelve" | "twenty" | "thirty" | "forty" | "fifty" | "hundred"
            | "thousand" | "million" | "billion" | "trillion"
    )
}

fn is_demonym(word: &str) -> bool {
    matches!(
        word,
        "american" | "british" | "chinese" | "russian" | "ukrainian" | "israeli"
            | "palestinian" | "iranian" | "french" | "german" | "italian" | "spanish"
            | "japanese" | "korean" | "indian" | "african" | "european" | "asian" | "mexican"
            | "canadian" | "australian" | "turkish" | "syrian" | "saudi" | "egyptian"
            | "brazilian" | "polish" | "dutch" | "irish" | "scottish" | "welsh" | "english"
            | "afghan" | "pakistani" | "iraqi" | "lebanese" | "taiwanese" | "venezuelan"
            | "democratic" | "republican" | "federal" | "national" | "international"
            | "northern" | "southern" | "eastern" | "western" | "royal"
    )
}

/// Words that are capitalised in headlines and sentence starts but are not
/// names. Closed-class words are handled separately. No suffix guessing:
/// "Texas", "Brussels" or "Beijing" look like inflected words.
fn is_common_word(word: &str) -> bool {
    matches!(
        word,
        "new" | "top" | "big" | "first" | "last" | "says" | "say" | "said" | "man" | "woman"
            | "men" | "women" | "people" | "how" | "why" | "what" | "watch" | "live" | "video"
            | "news" | "report" | "reports" | "police" | "government" | "court" | "judge"
            | "election" | "vote" | "votes" | "war" | "attack" | "attacks" | "deal" | "talks"
            | "plan" | "plans" | "bill" | "law" | "world" | "year" | "years" | "day" | "week"
            | "after" | "over" | "more" | "most" | "old" | "young" | "dead" | "killed" | "kill"
            | "kills" | "dies" | "death" | "home" | "back" | "backs" | "make" | "makes" | "take"
            | "takes" | "get" | "gets" | "set" | "sets" | "show" | "shows" | "hit" | "hits"
            | "warn" | "warns" | "call" | "calls" | "win" | "wins" | "face" | "faces" | "seek"
            | "seeks" | "urge" | "urges" | "meet" | "meets" | "met" | "visit" | "visits"
            | "arrive" | "arrives" | "announce" | "announces" | "beat" | "beats" | "end"
            | "ends" | "begin" | "begins" | "launch" | "launches" | "delay" | "delays"
            | "sign" | "signs" | "ban" | "bans" | "vow" | "vows" | "slam" | "slams" | "cut"
            | "cuts" | "raise" | "raises" | "rise" | "rises" | "fall" | "falls" | "strike"
            | "strikes" | "storm" | "fire" | "crash" | "officials" | "leaders" | "could"
            | "may" | "will" | "here" | "there" | "inside" | "opinion" | "analysis"
            | "review" | "breaking" | "exclusive" | "update" | "latest"
    )
}

fn open_class(word: &str) -> PosTag {
    if has_suffix(word, &["ly"]) {
        return PosTag::Adverb;
    }
    if has_suffix(
        word,
        &["ous", "ful", "ive", "able", "ible", "less", "ical", "ic", "al", "ish", "ary"],
    ) {
        return PosTag::Adjective;
    }
    if has_suffix(word, &["ing", "ed", "ize", "ise", "ify", "ate"]) {
        return PosTag::Verb;
    }
    PosTag::Noun
}

/// Suffix match that leaves at least three characters of stem.
fn has_suffix(word: &str, suffixes: &[&str]) -> bool {
    suffixes
        .iter()
        .any(|s| word.len() >= s.len() + 3 && word.ends_with(s))
}

// ── Lemmatizer ───────────────────────────────────────────────────────────────

/// Lowercase dictionary form. Proper nouns keep their full lowercase form;
/// common nouns drop regular plural endings.
fn lemmatize(lower: &str, pos: PosTag) -> String {
    match pos {
        PosTag::Particle if lower.ends_with('s') => "'s".to_string(),
        PosTag::Auxiliary => match lower {
            "is" | "are" | "was" | "were" | "am" | "been" | "being" => "be".to_string(),
            "has" | "had" => "have".to_string(),
            "does" | "did" => "do".to_string(),
            other => other.to_string(),
        },
        PosTag::Noun => singularize(lower),
        _ => lower.to_string(),
    }
}

fn singularize(word: &str) -> String {
    match word {
        "people" => return "person".into(),
        "men" => return "man".into(),
        "women" => return "woman".into(),
        "children" => return "child".into(),
        _ => {}
    }
    if word.len() > 4 {
        if let Some(base) = word.strip_suffix("ies") {
            return format!("{base}y");
        }
        if word.ends_with("sses") || word.ends_with("ches") || word.ends_with("shes") {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us")
    {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity_texts(annotator: &Annotator, text: &str) -> Vec<String> {
        annotator
            .terms(text)
            .into_iter()
            .map(|t| t.text.trim().to_string())
            .collect()
    }

    #[test]
    fn extracts_multi_token_names() {
        let a = Annotator::default();
        let entities = entity_texts(&a, "it was reported that Joe Biden met Xi Jinping in San Francisco.");
        assert_eq!(entities, vec!["Joe Biden", "Xi Jinping", "San Francisco"]);
    }

    #[test]
    fn proper_noun_with_cardinal() {
        let a = Annotator::default();
        let entities = entity_texts(&a, "The launch of Artemis 2 was delayed again.");
        assert_eq!(entities, vec!["Artemis 2"]);
    }

    #[test]
    fn adjective_before_proper_noun() {
        let a = Annotator::default();
        let entities = entity_texts(&a, "the talks with Russian officials and Chinese Premier Li");
        assert_eq!(entities, vec!["Chinese Premier", "Li"]);
    }

    #[test]
    fn punctuation_breaks_entities() {
        let a = Annotator::default();
        let entities = entity_texts(&a, "leaders from Germany, France and Italy");
        assert_eq!(entities, vec!["Germany", "France", "Italy"]);
    }

    #[test]
    fn terms_are_padded() {
        let a = Annotator::default();
        let terms = a.terms("A storm reached Florida yesterday");
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].text, " Florida ");
        assert_eq!(terms[0].lemma, " florida ");
        assert!(terms[0].stem.starts_with(' ') && terms[0].stem.ends_with(' '));
    }

    #[test]
    fn possessive_is_not_part_of_entity() {
        let a = Annotator::default();
        let entities = entity_texts(&a, "shares of Apple's supplier fell");
        assert_eq!(entities, vec!["Apple"]);
    }

    #[test]
    fn sentence_start_common_word_is_not_a_name() {
        let a = Annotator::default();
        let tokens = a.annotate("Police arrested a man in Ohio");
        assert_eq!(tokens[0].pos, PosTag::Noun);
        assert_eq!(tokens[5].pos, PosTag::ProperNoun);
    }

    #[test]
    fn headline_closed_class_words_break_runs() {
        let a = Annotator::default();
        let entities = entity_texts(&a, "Macron Meets Scholz In Berlin For Talks");
        assert!(entities.contains(&"Berlin".to_string()));
        assert!(!entities.iter().any(|e| e.contains("In")));
    }

    #[test]
    fn sentence_start_place_names_stay_names() {
        let a = Annotator::default();
        let cases: [(&str, &[&str]); 7] = [
            ("Beijing warns Taiwan over drills", &["Beijing", "Taiwan"]),
            ("Italy beats Spain in semifinal", &["Italy", "Spain"]),
            ("Texas floods kill dozens", &["Texas"]),
            ("Brussels summit ends without deal", &["Brussels"]),
            ("Philippines evacuates coast", &["Philippines"]),
            ("Athens braces for heatwave", &["Athens"]),
            ("Wales names squad", &["Wales"]),
        ];
        for (headline, expected) in cases {
            assert_eq!(entity_texts(&a, headline), expected, "{headline}");
        }
    }

    #[test]
    fn sentence_start_word_used_in_lower_case_is_demoted() {
        let a = Annotator::default();
        let tokens = a.annotate("Rescue crews joined the rescue near Dover");
        assert_ne!(tokens[0].pos, PosTag::ProperNoun);
        assert_eq!(tokens[6].pos, PosTag::ProperNoun);
    }

    #[test]
    fn headline_verbs_are_not_names() {
        let a = Annotator::default();
        let entities = entity_texts(&a, "Biden Visits Kyiv To Meet Zelensky");
        assert_eq!(entities, vec!["Biden", "Kyiv", "Zelensky"]);
    }

    #[test]
    fn dotted_abbreviation_joins_entity() {
        let a = Annotator::default();
        let entities = entity_texts(&a, "U.S. Senate passes border bill");
        assert_eq!(entities, vec!["U.S. Senate"]);
    }

    #[test]
    fn acronym_is_proper_noun() {
        let a = Annotator::default();
        let tokens = a.annotate("sanctions by the US and NATO");
        assert_eq!(tokens[3].pos, PosTag::ProperNoun);
        assert_eq!(tokens[5].pos, PosTag::ProperNoun);
    }

    #[test]
    fn longest_match_wins() {
        use PosTag::*;
        assert_eq!(entity_spans(&[ProperNoun, Adjective, ProperNoun]), vec![(0, 3)]);
        assert_eq!(
            entity_spans(&[ProperNoun, ProperNoun, ProperNoun, ProperNoun, ProperNoun]),
            vec![(0, 4), (4, 5)]
        );
        assert_eq!(entity_spans(&[ProperNoun, Numeral, Noun]), vec![(0, 2)]);
        assert_eq!(entity_spans(&[Adjective, Noun]), Vec::<(usize, usize)>::new());
    }

    #[test]
    fn short_description_is_blanked() {
        let a = Annotator::default();
        assert_eq!(a.normalize_description("Too short"), "");
        assert_eq!(
            a.normalize_description("Long enough description"),
            "Long enough description"
        );
    }

    #[test]
    fn singularize_common_nouns() {
        assert_eq!(singularize("cities"), "city");
        assert_eq!(singularize("talks"), "talk");
        assert_eq!(singularize("glasses"), "glass");
        assert_eq!(singularize("status"), "status");
        assert_eq!(singularize("people"), "person");
    }
}
