use crate::weighting::Index;
use crate::{DocumentId, Error, Result, Term};
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_POSTING_DEPTH: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostingEntry {
    pub document: DocumentId,
    pub weight: f64, // normalized tf-idf weight
}

/// Entries of one term, heaviest first, cut at the index depth.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostingList {
    entries: Vec<PostingEntry>,
}

impl PostingList {
    pub fn entries(&self) -> &[PostingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Upper bound on the weight of a document missing from this list.
    ///
    /// A list holding exactly `depth` entries may have been cut, so an absent
    /// document weighs at most the last entry. A shorter list is exhaustive and
    /// an absent document has weight 0.
    pub fn unseen_bound(&self, depth: usize) -> f64 {
        match self.entries.last() {
            Some(last) if self.entries.len() == depth => last.weight,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostingIndex {
    lists: BTreeMap<Term, PostingList>,
    depth: usize,
}

impl PostingIndex {
    pub fn build(index: &Index, depth: usize) -> Result<Self> {
        if depth == 0 {
            return Err(Error::InvalidDepth);
        }
        let mut lists: BTreeMap<Term, Vec<PostingEntry>> = BTreeMap::new();
        // documents come in ascending id order, so the stable sort below breaks ties by id
        for (id, doc) in index.documents() {
            for (term, stats) in doc.terms() {
                lists.entry(term.clone()).or_default().push(PostingEntry {
                    document: id.clone(),
                    weight: stats.normalized_weight,
                });
            }
        }
        let lists = lists
            .into_iter()
            .map(|(term, mut entries)| {
                entries.sort_by(|a, b| b.weight.total_cmp(&a.weight));
                entries.truncate(depth);
                (term, PostingList { entries })
            })
            .collect();
        Ok(Self { lists, depth })
    }

    pub fn get(&self, term: &str) -> Option<&PostingList> {
        self.lists.get(term)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Term, &PostingList)> {
        self.lists.iter()
    }
}
