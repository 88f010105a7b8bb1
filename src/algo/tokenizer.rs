use std::sync::LazyLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

static CARDINAL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\d+(?:[.,]\d+)*$").ok());

/// Surface shape of a raw token, decided before tagging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Word,
    Number,
    Punct,
    /// The `'s` split off a possessive noun.
    Possessive,
}

/// A token as cut from the text, before part-of-speech tagging.
#[derive(Debug, Clone, PartialEq)]
pub struct RawToken {
    pub text: String,
    pub shape: Shape,
    /// First word of a sentence (capitalisation carries no signal there).
    pub sentence_start: bool,
}

/// Split text on Unicode word boundaries, keeping punctuation as tokens and
/// dropping whitespace. Possessive `'s` becomes its own token. A period
/// glued to an abbreviation ("U.S.", "J.") stays on the word and does not
/// end the sentence.
pub fn tokenize(text: &str) -> Vec<RawToken> {
    let mut tokens: Vec<RawToken> = Vec::new();
    let mut at_sentence_start = true;
    let mut after_word = false;

    for segment in text.split_word_bounds() {
        let follows_word = after_word;
        after_word = false;

        if segment.chars().all(char::is_whitespace) {
            continue;
        }

        if !segment.chars().any(char::is_alphanumeric) {
            if segment == "." && follows_word {
                if let Some(last) = tokens.last_mut().filter(|t| is_abbreviation(t)) {
                    last.text.push('.');
                    continue;
                }
            }
            if matches!(segment, "." | "!" | "?") {
                at_sentence_start = true;
            }
            tokens.push(RawToken {
                text: segment.to_string(),
                shape: Shape::Punct,
                sentence_start: false,
            });
            continue;
        }

        let sentence_start = at_sentence_start;
        at_sentence_start = false;

        if is_cardinal(segment) {
            tokens.push(RawToken {
                text: segment.to_string(),
                shape: Shape::Number,
                sentence_start,
            });
            continue;
        }

        match split_possessive(segment) {
            Some((base, suffix)) => {
                tokens.push(RawToken {
                    text: base.to_string(),
                    shape: Shape::Word,
                    sentence_start,
                });
                tokens.push(RawToken {
                    text: suffix.to_string(),
                    shape: Shape::Possessive,
                    sentence_start: false,
                });
            }
            None => {
                tokens.push(RawToken {
                    text: segment.to_string(),
                    shape: Shape::Word,
                    sentence_start,
                });
                after_word = true;
            }
        }
    }

    tokens
}

/// Dotted initialisms and single capital initials.
fn is_abbreviation(token: &RawToken) -> bool {
    if token.shape != Shape::Word {
        return false;
    }
    let mut chars = token.text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.is_uppercase(),
        _ => token.text.contains('.'),
    }
}

/// Digits with optional thousands/decimal separators.
pub fn is_cardinal(word: &str) -> bool {
    CARDINAL
        .as_ref()
        .map(|re| re.is_match(word))
        .unwrap_or_else(|| word.chars().all(|c| c.is_ascii_digit()))
}

fn split_possessive(word: &str) -> Option<(&str, &str)> {
    for suffix in ["'s", "\u{2019}s", "'S", "\u{2019}S"] {
        if let Some(base) = word.strip_suffix(suffix) {
            if !base.is_empty() {
                return Some((base, &word[base.len()..]));
            }
        }
    }
    None
}
