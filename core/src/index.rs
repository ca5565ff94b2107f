use crate::corpus::load_directory;
use crate::postings::{PostingIndex, DEFAULT_POSTING_DEPTH};
use crate::retrieval::{full_scan, retrieve, Retrieval};
use crate::tokenizer::{Analyzer, Preprocess};
use crate::weighting::{Index, QueryVector};
use crate::{DocumentId, Error, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Entries kept per posting list (K).
    pub posting_depth: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { posting_depth: DEFAULT_POSTING_DEPTH }
    }
}

impl IndexConfig {
    pub fn validate(&self) -> Result<()> {
        if self.posting_depth == 0 {
            return Err(Error::InvalidDepth);
        }
        Ok(())
    }
}

/// Read-only query surface over a built corpus.
///
/// Immutable after [`SearchIndex::build`]; share it behind an `Arc` and
/// rebuild-then-swap to re-index.
pub struct SearchIndex<P = Analyzer> {
    index: Index,
    postings: PostingIndex,
    preprocessor: P,
    config: IndexConfig,
}

impl SearchIndex<Analyzer> {
    pub fn from_corpus<I>(corpus: I, config: IndexConfig) -> Result<Self>
    where
        I: IntoIterator<Item = (DocumentId, String)>,
    {
        Self::build(corpus, Analyzer, config)
    }

    pub fn from_directory<T: AsRef<Path>>(root: T, config: IndexConfig) -> Result<Self> {
        config.validate()?;
        Self::from_corpus(load_directory(root)?, config)
    }
}

impl<P: Preprocess> SearchIndex<P> {
    pub fn build<I>(corpus: I, preprocessor: P, config: IndexConfig) -> Result<Self>
    where
        I: IntoIterator<Item = (DocumentId, String)>,
    {
        config.validate()?;
        let start = Instant::now();
        let corpus: Vec<(DocumentId, String)> = corpus.into_iter().collect();
        let documents: Vec<_> = corpus
            .into_par_iter()
            .map(|(id, text)| {
                let terms = preprocessor.preprocess(&text);
                (id, terms)
            })
            .collect();

        let index = Index::build(documents)?;
        let postings = PostingIndex::build(&index, config.posting_depth)?;
        info!(
            documents = index.total_docs(),
            terms = index.total_terms(),
            posting_depth = config.posting_depth,
            took_ms = start.elapsed().as_millis() as u64,
            "index built"
        );
        Ok(Self { index, postings, preprocessor, config })
    }

    pub fn query_vector(&self, text: &str) -> QueryVector {
        QueryVector::build(&self.preprocessor.preprocess(text))
    }

    /// Best single match using the bounded posting lists.
    pub fn query(&self, text: &str) -> Retrieval {
        retrieve(&self.postings, &self.query_vector(text))
    }

    /// Like [`SearchIndex::query`], falling back to a full scan when the
    /// bounded lists are inconclusive.
    pub fn query_exhaustive(&self, text: &str) -> Retrieval {
        let query = self.query_vector(text);
        match retrieve(&self.postings, &query) {
            Retrieval::NeedsDeeperScan { max_actual, max_upper_bound } => {
                debug!(max_actual, max_upper_bound, "falling back to full scan");
                full_scan(&self.index, &query)
            }
            outcome => outcome,
        }
    }

    /// Normalized weight of an already-normalized term, `0.0` when the
    /// document or term is unknown.
    pub fn weight(&self, document: &str, term: &str) -> f64 {
        self.index.normalized_weight(document, term).unwrap_or(0.0)
    }

    /// `log10(total_docs / df)`, or `-1.0` for a term no document contains.
    pub fn idf(&self, term: &str) -> f64 {
        self.index.idf(term).unwrap_or(-1.0)
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn postings(&self) -> &PostingIndex {
        &self.postings
    }

    pub fn config(&self) -> IndexConfig {
        self.config
    }
}
