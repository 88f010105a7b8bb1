use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::algo::annotate::Term;

/// Canonicalization dictionaries for one corpus run.
///
/// `lemma_to_text` and `stem_to_lemma` only move toward a more
/// authoritative value (see [`is_more_authoritative`]); `lemma_to_stem` is
/// last-write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lexicon {
    lemma_to_stem: HashMap<String, String>,
    stem_to_lemma: HashMap<String, String>,
    lemma_to_text: HashMap<String, String>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one extracted term into the dictionaries.
    pub fn record(&mut self, term: &Term) {
        self.lemma_to_stem
            .insert(term.lemma.clone(), term.stem.clone());
        update_if_more_authoritative(&mut self.lemma_to_text, &term.lemma, &term.text);
        update_if_more_authoritative(&mut self.stem_to_lemma, &term.stem, &term.lemma);
    }

    pub fn stem_of(&self, lemma: &str) -> Option<&str> {
        self.lemma_to_stem.get(lemma).map(String::as_str)
    }

    pub fn lemma_of(&self, stem: &str) -> Option<&str> {
        self.stem_to_lemma.get(stem).map(String::as_str)
    }

    pub fn text_of(&self, lemma: &str) -> Option<&str> {
        self.lemma_to_text.get(lemma).map(String::as_str)
    }

    /// Best surface text for a stem (stem -> lemma -> text), untrimmed.
    pub fn stem_to_text(&self, stem: &str) -> Option<&str> {
        self.lemma_of(stem).and_then(|lemma| self.text_of(lemma))
    }

    /// Human-readable keyword for a stem. Unknown stems fall back to the
    /// stem itself.
    pub fn display(&self, stem: &str) -> String {
        self.stem_to_text(stem).unwrap_or(stem).trim().to_string()
    }

    pub fn len(&self) -> usize {
        self.lemma_to_text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lemma_to_text.is_empty()
    }
}

/// Count of characters that are unchanged by uppercasing. Spaces and
/// punctuation count, matching how display strings are compared.
fn uppercase_count(s: &str) -> usize {
    s.chars()
        .filter(|&c| c.to_uppercase().eq(std::iter::once(c)))
        .count()
}

/// True if `a` has strictly more uppercase-stable characters than `b`.
pub fn more_capitalized(a: &str, b: &str) -> bool {
    uppercase_count(a) > uppercase_count(b)
}

/// A candidate replaces the current value if it is shorter, or if it is no
/// longer and more capitalised. Lengths are in characters.
pub fn is_more_authoritative(candidate: &str, current: &str) -> bool {
    let (new_len, old_len) = (candidate.chars().count(), current.chars().count());
    new_len < old_len || (new_len <= old_len && more_capitalized(candidate, current))
}

/// Insert or replace `key` when `value` is more authoritative than what is
/// stored. Returns whether the map changed.
pub fn update_if_more_authoritative(
    dict: &mut HashMap<String, String>,
    key: &str,
    value: &str,
) -> bool {
    match dict.get_mut(key) {
        None => {
            dict.insert(key.to_string(), value.to_string());
            true
        }
        Some(current) if is_more_authoritative(value, current) => {
            *current = value.to_string();
            true
        }
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(text: &str, lemma: &str, stem: &str) -> Term {
        Term {
            text: text.into(),
            lemma: lemma.into(),
            stem: stem.into(),
        }
    }

    #[test]
    fn more_capitalized_counts_uppercase() {
        assert!(more_capitalized("NASA", "Nasa"));
        assert!(!more_capitalized("nasa", "Nasa"));
        assert!(!more_capitalized("Nasa", "Nasa"));
    }

    #[test]
    fn shorter_text_wins() {
        let mut dict = HashMap::new();
        update_if_more_authoritative(&mut dict, "k", "United States");
        assert!(update_if_more_authoritative(&mut dict, "k", "U.S."));
        assert_eq!(dict["k"], "U.S.");
        assert!(!update_if_more_authoritative(&mut dict, "k", "United States"));
        assert_eq!(dict["k"], "U.S.");
    }

    #[test]
    fn capitalization_breaks_length_ties() {
        let mut dict = HashMap::new();
        update_if_more_authoritative(&mut dict, "k", " nato ");
        assert!(update_if_more_authoritative(&mut dict, "k", " NATO "));
        assert!(!update_if_more_authoritative(&mut dict, "k", " Nato "));
        assert_eq!(dict["k"], " NATO ");
    }

    #[test]
    fn record_builds_display_chain() {
        let mut lex = Lexicon::new();
        lex.record(&term(" white house ", " white house ", " white hous "));
        lex.record(&term(" White House ", " white house ", " white hous "));
        assert_eq!(lex.stem_of(" white house "), Some(" white hous "));
        assert_eq!(lex.lemma_of(" white hous "), Some(" white house "));
        assert_eq!(lex.display(" white hous "), "White House");
    }

    #[test]
    fn stem_to_lemma_prefers_shorter_lemma() {
        let mut lex = Lexicon::new();
        lex.record(&term(" Gazas ", " gazas ", " gaza "));
        lex.record(&term(" Gaza ", " gaza ", " gaza "));
        assert_eq!(lex.lemma_of(" gaza "), Some(" gaza "));
        assert_eq!(lex.display(" gaza "), "Gaza");
    }

    #[test]
    fn display_unknown_stem_falls_back() {
        let lex = Lexicon::new();
        assert_eq!(lex.display(" unknown "), "unknown");
        assert!(lex.is_empty());
    }
}
