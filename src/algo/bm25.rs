//! BM25 weighting: document frequencies are collected over the whole corpus,
//! then frozen into IDF values used to weight every document vector.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StorylineError};

/// Sparse term -> weight vector for one document. Insertion-ordered so
/// floating-point sums over it are reproducible.
pub type Bow = IndexMap<String, f64>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Phase {
    Collecting,
    Ready {
        idf: IndexMap<String, f64>,
        avg_dl: f64,
    },
}

/// BM25 term weighting over a corpus of term sequences.
///
/// Two phases: every document is [`learn`](Self::learn)ed, then the model is
/// [`freeze`](Self::freeze)d, and only then can vectors be requested.
/// Document statistics are corpus-wide, so a vector requested before the
/// last document was learned would carry wrong weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bm25Vectorizer {
    params: Bm25Params,
    /// term -> number of documents containing it
    doc_freq: IndexMap<String, u32>,
    num_docs: u32,
    total_len: u64,
    phase: Phase,
}

impl Bm25Vectorizer {
    pub fn new() -> Self {
        Self::with_params(Bm25Params::default())
    }

    pub fn with_params(params: Bm25Params) -> Self {
        Self {
            params,
            doc_freq: IndexMap::new(),
            num_docs: 0,
            total_len: 0,
            phase: Phase::Collecting,
        }
    }

    /// Register one document's terms.
    pub fn learn(&mut self, terms: &[String]) -> Result<()> {
        if self.is_ready() {
            return Err(StorylineError::ModelFrozen);
        }
        let distinct: IndexSet<&str> = terms.iter().map(String::as_str).collect();
        for term in distinct {
            *self.doc_freq.entry(term.to_string()).or_insert(0) += 1;
        }
        self.num_docs += 1;
        self.total_len += terms.len() as u64;
        Ok(())
    }

    /// Close the learning phase and compute IDF for every known term.
    /// Freezing twice is a no-op.
    pub fn freeze(&mut self) {
        if self.is_ready() {
            return;
        }
        let idf = self
            .doc_freq
            .keys()
            .map(|term| (term.clone(), self.raw_idf(term)))
            .collect();
        let avg_dl = if self.num_docs == 0 {
            0.0
        } else {
            self.total_len as f64 / self.num_docs as f64
        };
        self.phase = Phase::Ready { idf, avg_dl };
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.phase, Phase::Ready { .. })
    }

    /// IDF: ln(1 + (N - df + 0.5) / (df + 0.5))
    fn raw_idf(&self, term: &str) -> f64 {
        let df = *self.doc_freq.get(term).unwrap_or(&0) as f64;
        let n = self.num_docs as f64;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    /// All IDF values, cached at freeze time.
    pub fn inverse_document_frequencies(&self) -> Result<&IndexMap<String, f64>> {
        match &self.phase {
            Phase::Ready { idf, .. } => Ok(idf),
            Phase::Collecting => Err(StorylineError::ModelNotReady),
        }
    }

    /// IDF of a single term. Terms never learned get the df = 0 value.
    pub fn idf(&self, term: &str) -> Result<f64> {
        let idf = self.inverse_document_frequencies()?;
        Ok(idf.get(term).copied().unwrap_or_else(|| self.raw_idf(term)))
    }

    /// BM25-weighted bag of terms for one document.
    pub fn weighted_vector(&self, terms: &[String]) -> Result<Bow> {
        let (idf, avg_dl) = match &self.phase {
            Phase::Ready { idf, avg_dl } => (idf, *avg_dl),
            Phase::Collecting => return Err(StorylineError::ModelNotReady),
        };

        let mut counts: IndexMap<&str, u32> = IndexMap::new();
        for term in terms {
            *counts.entry(term.as_str()).or_insert(0) += 1;
        }

        let Bm25Params { k1, b } = self.params;
        let dl = terms.len() as f64;
        let length_norm = if avg_dl > 0.0 {
            1.0 - b + b * dl / avg_dl
        } else {
            1.0 - b
        };

        let mut bow = Bow::with_capacity(counts.len());
        for (term, count) in counts {
            let tf = count as f64;
            let term_idf = idf.get(term).copied().unwrap_or_else(|| self.raw_idf(term));
            let weight = term_idf * tf * (k1 + 1.0) / (tf + k1 * length_norm);
            bow.insert(term.to_string(), weight);
        }
        Ok(bow)
    }

    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    pub fn vocabulary_size(&self) -> usize {
        self.doc_freq.len()
    }
}

impl Default for Bm25Vectorizer {
    fn default() -> Self {
        Self::new()
    }
}
