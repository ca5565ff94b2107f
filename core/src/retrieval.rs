//! Top-1 retrieval over depth-bounded posting lists.
//!
//! Every candidate found in a fetched list is scored against every fetched
//! query term. A term whose list does not contain the candidate contributes an
//! upper bound instead of a true weight, which turns the candidate's score into
//! an upper bound too. The best exact score is only returned when it dominates
//! every upper bound; otherwise the caller is told to run [`full_scan`].

use crate::postings::PostingIndex;
use crate::weighting::{Document, Index, QueryVector};
use crate::DocumentId;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tracing::debug;

/// Outcome of a single-best-match query.
#[must_use]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Retrieval {
    /// Best document and its exact cosine similarity to the query.
    Match { document: DocumentId, score: f64 },
    /// No document shares a term with the query.
    NoMatch,
    /// The bounded lists cannot prove the best exact candidate optimal.
    NeedsDeeperScan { max_actual: f64, max_upper_bound: f64 },
}

impl Retrieval {
    pub const DEEPER_SCAN_MARKER: &'static str = "NEEDS_DEEPER_SCAN";

    pub fn document(&self) -> Option<&str> {
        match self {
            Retrieval::Match { document, .. } => Some(document),
            _ => None,
        }
    }

    /// Score of a match, `0.0` for the other outcomes.
    pub fn score(&self) -> f64 {
        match self {
            Retrieval::Match { score, .. } => *score,
            _ => 0.0,
        }
    }

    pub fn needs_deeper_scan(&self) -> bool {
        matches!(self, Retrieval::NeedsDeeperScan { .. })
    }
}

impl fmt::Display for Retrieval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Retrieval::Match { document, score } => write!(f, "({document}, {score:.12})"),
            Retrieval::NoMatch => write!(f, "(None, {:.12})", 0.0),
            Retrieval::NeedsDeeperScan { .. } => {
                write!(f, "({}, {:.12})", Self::DEEPER_SCAN_MARKER, 0.0)
            }
        }
    }
}

struct FetchedTerm<'a> {
    query_weight: f64,
    weights: HashMap<&'a str, f64>,
    unseen_bound: f64,
}

pub fn retrieve(postings: &PostingIndex, query: &QueryVector) -> Retrieval {
    let depth = postings.depth();
    let fetched: Vec<FetchedTerm<'_>> = query
        .iter()
        .filter_map(|(term, q)| {
            let list = postings.get(term)?;
            Some(FetchedTerm {
                query_weight: q.normalized_weight,
                weights: list
                    .entries()
                    .iter()
                    .map(|entry| (entry.document.as_str(), entry.weight))
                    .collect(),
                unseen_bound: list.unseen_bound(depth),
            })
        })
        .collect();
    if fetched.is_empty() {
        debug!(query_terms = query.len(), "no query term is indexed");
        return Retrieval::NoMatch;
    }

    let candidates: BTreeSet<&str> = fetched
        .iter()
        .flat_map(|term| term.weights.keys().copied())
        .collect();

    let mut best: Option<&str> = None;
    let mut max_actual = 0.0;
    let mut max_upper_bound = 0.0;
    for &document in &candidates {
        let mut score = 0.0;
        let mut exact = true;
        for term in &fetched {
            let weight = match term.weights.get(document) {
                Some(&weight) => weight,
                None => {
                    exact = false;
                    term.unseen_bound
                }
            };
            score += term.query_weight * weight;
        }
        if exact {
            if score > max_actual {
                max_actual = score;
                best = Some(document);
            }
        } else if score > max_upper_bound {
            max_upper_bound = score;
        }
    }
    debug!(
        candidates = candidates.len(),
        max_actual, max_upper_bound, "threshold retrieval"
    );

    if max_actual >= max_upper_bound {
        match best {
            Some(document) => Retrieval::Match { document: document.to_string(), score: max_actual },
            None => Retrieval::NoMatch,
        }
    } else {
        Retrieval::NeedsDeeperScan { max_actual, max_upper_bound }
    }
}

/// Cosine similarity of a query against a document's full weight vector.
pub fn cosine(document: &Document, query: &QueryVector) -> f64 {
    let mut score = 0.0;
    for (term, q) in query.iter() {
        if let Some(stats) = document.get(term) {
            score += q.normalized_weight * stats.normalized_weight;
        }
    }
    score
}

/// Exhaustive fallback: scores every document. Never asks for a deeper scan.
pub fn full_scan(index: &Index, query: &QueryVector) -> Retrieval {
    let mut best: Option<&DocumentId> = None;
    let mut max = 0.0;
    for (id, document) in index.documents() {
        let score = cosine(document, query);
        if score > max {
            max = score;
            best = Some(id);
        }
    }
    match best {
        Some(document) => Retrieval::Match { document: document.clone(), score: max },
        None => Retrieval::NoMatch,
    }
}
