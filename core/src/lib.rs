pub mod corpus;
pub mod error;
pub mod index;
pub mod postings;
pub mod retrieval;
pub mod tokenizer;
pub mod weighting;

pub use error::{Error, Result};
pub use index::{IndexConfig, SearchIndex};
pub use postings::{PostingEntry, PostingIndex, PostingList};
pub use retrieval::{full_scan, retrieve, Retrieval};
pub use tokenizer::{Analyzer, Preprocess};
pub use weighting::{Document, Index, QueryTermWeight, QueryVector, TermStats};

/// Normalized token produced by a [`Preprocess`] implementation.
pub type Term = String;
/// Stable document identifier, e.g. the file name relative to the corpus root.
pub type DocumentId = String;
