pub mod annotate;
pub mod bm25;
pub mod corpus;
pub mod extract;
pub mod keywords;
pub mod lexicon;
pub mod pagerank;
pub mod relevance;
pub mod similarity;
pub mod tokenizer;
