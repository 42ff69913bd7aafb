//! Ranked retrieval over a small text corpus: normalization, inverted index,
//! TF-IDF weighting and cosine-similarity queries.
//!
//! The lifecycle is build -> freeze -> query. An [`index::IndexBuilder`]
//! accumulates postings and term counts, [`index::InvertedIndex`] is the frozen
//! result, [`weighting`] derives the IDF table and document vectors from it and
//! [`search::QueryEngine`] answers queries against that immutable snapshot.

pub mod config;
pub mod corpus;
pub mod error;
pub mod index;
pub mod persist;
pub mod search;
pub mod tokenizer;
pub mod weighting;

pub type DocId = String;
pub type Term = String;
pub type Weight = f64;

pub use config::EngineConfig;
pub use corpus::{load_corpus, Corpus, MissingDocumentPolicy};
pub use error::{CorpusError, SnapshotError};
pub use index::{IndexBuilder, InvertedIndex, PostingList, TermFrequencyTable};
pub use search::{QueryEngine, ScoredDoc};
pub use tokenizer::{normalize, EnglishNormalizer, Normalizer};
pub use weighting::{IdfMode, IdfTable, SparseVector, TfMode, Weighting};
