//! TF-IDF weighting for documents and queries.
//!
//! Documents go through a staged pipeline where every stage returns a new value:
//! raw term counts, corpus document frequencies, log-TF * IDF weights, and
//! finally cosine normalization. Queries use log-TF without IDF.

use crate::{DocumentId, Error, Result, Term};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// Term counts of a single document or query.
pub type RawCounts = BTreeMap<Term, u32>;

/// Weights of one term inside one document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TermStats {
    pub tf: u32,
    /// Corpus-wide document frequency of the term.
    pub df: u32,
    /// `(1 + log10(tf)) * log10(total_docs / df)`
    pub idf_weight: f64,
    pub normalized_weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    terms: BTreeMap<Term, TermStats>,
}

impl Document {
    pub fn get(&self, term: &str) -> Option<&TermStats> {
        self.terms.get(term)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Term, &TermStats)> {
        self.terms.iter()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Weighted document map for a whole corpus. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct Index {
    documents: BTreeMap<DocumentId, Document>,
    document_frequency: BTreeMap<Term, u32>,
    total_docs: u32,
}

impl Index {
    /// Build the index from preprocessed documents.
    ///
    /// Fails on an empty corpus (IDF would be undefined) and on repeated
    /// document ids. Nothing is returned unless every document was weighted.
    pub fn build<I>(documents: I) -> Result<Self>
    where
        I: IntoIterator<Item = (DocumentId, Vec<Term>)>,
    {
        let mut corpus: Vec<(DocumentId, Vec<Term>)> = documents.into_iter().collect();
        if corpus.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        corpus.sort_by(|a, b| a.0.cmp(&b.0));
        if let Some(pair) = corpus.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(Error::DuplicateDocument(pair[0].0.clone()));
        }
        let total_docs = corpus.len() as u32;

        let counts: Vec<(DocumentId, RawCounts)> = corpus
            .into_par_iter()
            .map(|(id, terms)| (id, count_terms(&terms)))
            .collect();
        let document_frequency = document_frequencies(counts.iter().map(|(_, raw)| raw));

        let documents = counts
            .into_iter()
            .map(|(id, raw)| {
                let weighted = weigh_document(&raw, &document_frequency, total_docs);
                (id, normalize_document(weighted))
            })
            .collect();

        Ok(Self { documents, document_frequency, total_docs })
    }

    pub fn total_docs(&self) -> u32 {
        self.total_docs
    }

    /// Number of distinct terms across the corpus.
    pub fn total_terms(&self) -> usize {
        self.document_frequency.len()
    }

    pub fn document(&self, id: &str) -> Option<&Document> {
        self.documents.get(id)
    }

    /// Documents in ascending id order.
    pub fn documents(&self) -> impl Iterator<Item = (&DocumentId, &Document)> {
        self.documents.iter()
    }

    pub fn document_frequency(&self, term: &str) -> Option<u32> {
        self.document_frequency.get(term).copied()
    }

    /// Plain IDF, `log10(total_docs / df)`, for a term present in the corpus.
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.document_frequency(term)
            .map(|df| inverse_document_frequency(self.total_docs, df))
    }

    pub fn normalized_weight(&self, id: &str, term: &str) -> Option<f64> {
        self.document(id)?.get(term).map(|stats| stats.normalized_weight)
    }
}

/// Per-term weights of a query: `1 + log10(tf)`, cosine-normalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QueryTermWeight {
    pub tf: u32,
    pub weight: f64,
    pub normalized_weight: f64,
}

/// Query-local weight vector. Carries no IDF factor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryVector {
    terms: BTreeMap<Term, QueryTermWeight>,
}

impl QueryVector {
    pub fn build(terms: &[Term]) -> Self {
        let counts = count_terms(terms);
        // every weight is >= 1, so a non-empty query always has a non-zero norm
        let norm = l2_norm(counts.values().map(|&tf| log_tf(tf)));
        let terms = counts
            .into_iter()
            .map(|(term, tf)| {
                let weight = log_tf(tf);
                (term, QueryTermWeight { tf, weight, normalized_weight: weight / norm })
            })
            .collect();
        Self { terms }
    }

    pub fn get(&self, term: &str) -> Option<&QueryTermWeight> {
        self.terms.get(term)
    }

    /// Terms in ascending order; retrieval and full scans both sum in this order.
    pub fn iter(&self) -> impl Iterator<Item = (&Term, &QueryTermWeight)> {
        self.terms.iter()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

pub fn log_tf(tf: u32) -> f64 {
    1.0 + (tf as f64).log10()
}

pub fn inverse_document_frequency(total_docs: u32, df: u32) -> f64 {
    (total_docs as f64 / df as f64).log10()
}

pub fn count_terms(terms: &[Term]) -> RawCounts {
    let mut counts = RawCounts::new();
    for term in terms {
        *counts.entry(term.clone()).or_insert(0) += 1;
    }
    counts
}

/// One pass over each document's distinct terms.
fn document_frequencies<'a, I>(documents: I) -> BTreeMap<Term, u32>
where
    I: Iterator<Item = &'a RawCounts>,
{
    let mut df: BTreeMap<Term, u32> = BTreeMap::new();
    for raw in documents {
        for term in raw.keys() {
            *df.entry(term.clone()).or_insert(0) += 1;
        }
    }
    df
}

#[derive(Debug, Clone, Copy)]
struct Weighted {
    tf: u32,
    df: u32,
    idf_weight: f64,
}

fn weigh_document(
    raw: &RawCounts,
    document_frequency: &BTreeMap<Term, u32>,
    total_docs: u32,
) -> BTreeMap<Term, Weighted> {
    raw.iter()
        .map(|(term, &tf)| {
            // every counted term was seen by document_frequencies
            let df = document_frequency.get(term).copied().unwrap_or(1);
            let idf_weight = log_tf(tf) * inverse_document_frequency(total_docs, df);
            (term.clone(), Weighted { tf, df, idf_weight })
        })
        .collect()
}

fn normalize_document(weighted: BTreeMap<Term, Weighted>) -> Document {
    let norm = l2_norm(weighted.values().map(|w| w.idf_weight));
    let terms = weighted
        .into_iter()
        .map(|(term, w)| {
            // all-zero documents (every term in every document) stay at zero
            let normalized_weight = if norm > 0.0 { w.idf_weight / norm } else { 0.0 };
            (
                term,
                TermStats { tf: w.tf, df: w.df, idf_weight: w.idf_weight, normalized_weight },
            )
        })
        .collect();
    Document { terms }
}

pub(crate) fn l2_norm<I>(weights: I) -> f64
where
    I: Iterator<Item = f64>,
{
    weights.map(|w| w * w).sum::<f64>().sqrt()
}
