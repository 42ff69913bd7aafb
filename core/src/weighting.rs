use crate::index::{distinct_docs, PostingList, TermFrequencyTable};
use crate::{DocId, Term, Weight};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Term-frequency dampening.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TfMode {
    /// `ln(1 + count)`
    #[default]
    LogOnePlus,
    /// `1 + ln(count)` for `count > 0`, else 0
    OnePlusLog,
}

impl TfMode {
    pub fn apply(self, count: u32) -> Weight {
        if count == 0 {
            return 0.0;
        }
        let c = count as Weight;
        match self {
            TfMode::LogOnePlus => (1.0 + c).ln(),
            TfMode::OnePlusLog => 1.0 + c.ln(),
        }
    }
}

/// Inverse-document-frequency formula.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdfMode {
    /// `ln(N / df)`; zero for a term found in every document.
    #[default]
    Standard,
    /// `ln(N / df) + 1`
    Smoothed,
}

impl IdfMode {
    /// `None` when `df` or `num_docs` is 0: such terms get no IDF entry.
    pub fn apply(self, num_docs: usize, df: usize) -> Option<Weight> {
        if df == 0 || num_docs == 0 {
            return None;
        }
        let base = (num_docs as Weight / df as Weight).ln();
        Some(match self {
            IdfMode::Standard => base,
            IdfMode::Smoothed => base + 1.0,
        })
    }
}

/// Corpus-wide IDF values. Lookups of absent terms yield 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdfTable {
    weights: HashMap<Term, Weight>,
    num_docs: usize,
}

impl IdfTable {
    pub fn get(&self, term: &str) -> Weight {
        self.weights.get(term).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, term: &str) -> bool { self.weights.contains_key(term) }

    pub fn len(&self) -> usize { self.weights.len() }

    pub fn is_empty(&self) -> bool { self.weights.is_empty() }

    /// The `N` the table was computed against.
    pub fn num_docs(&self) -> usize { self.num_docs }

    pub fn iter(&self) -> impl Iterator<Item = (&Term, Weight)> {
        self.weights.iter().map(|(t, w)| (t, *w))
    }
}

/// Sparse term -> weight map. Absent terms weigh 0 and zero weights are
/// never stored. The Euclidean norm is computed once on construction.
///
/// Terms are kept ordered so sums run in the same order on every build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    weights: BTreeMap<Term, Weight>,
    norm: Weight,
}

impl SparseVector {
    pub fn from_weights<I>(weights: I) -> Self
    where
        I: IntoIterator<Item = (Term, Weight)>,
    {
        let weights: BTreeMap<Term, Weight> = weights.into_iter().filter(|(_, w)| *w != 0.0).collect();
        let norm = weights.values().map(|w| w * w).sum::<Weight>().sqrt();
        Self { weights, norm }
    }

    pub fn get(&self, term: &str) -> Weight {
        self.weights.get(term).copied().unwrap_or(0.0)
    }

    pub fn norm(&self) -> Weight { self.norm }

    pub fn len(&self) -> usize { self.weights.len() }

    pub fn is_empty(&self) -> bool { self.weights.is_empty() }

    /// Terms in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (&Term, Weight)> {
        self.weights.iter().map(|(t, w)| (t, *w))
    }

    /// Dot product, walking only the smaller of the two vectors.
    pub fn dot(&self, other: &SparseVector) -> Weight {
        let (small, large) = if self.len() <= other.len() { (self, other) } else { (other, self) };
        small.weights.iter().map(|(t, w)| w * large.get(t)).sum()
    }

    /// Cosine similarity; 0 when either vector has zero norm.
    pub fn cosine(&self, other: &SparseVector) -> Weight {
        let denom = self.norm * other.norm;
        if denom == 0.0 {
            return 0.0;
        }
        self.dot(other) / denom
    }
}

/// The TF and IDF formulas in use. Applied identically to documents and queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weighting {
    pub tf: TfMode,
    pub idf: IdfMode,
}

impl Weighting {
    /// IDF per term from distinct document counts. Terms with no postings are left out.
    pub fn compute_idf(&self, postings: &PostingList, num_docs: usize) -> IdfTable {
        let weights: HashMap<Term, Weight> = postings
            .par_iter()
            .filter_map(|(term, ids)| {
                let df = distinct_docs(ids);
                if df > num_docs {
                    tracing::warn!(term = %term, df, num_docs, "document frequency exceeds corpus size");
                }
                self.idf.apply(num_docs, df).map(|idf| (term.clone(), idf))
            })
            .collect();
        tracing::debug!(num_terms = weights.len(), num_docs, mode = ?self.idf, "computed idf table");
        IdfTable { weights, num_docs }
    }

    /// One TF-IDF vector per document, each computed independently.
    pub fn compute_tfidf(&self, term_frequencies: &TermFrequencyTable, idf: &IdfTable) -> HashMap<DocId, SparseVector> {
        term_frequencies
            .par_iter()
            .map(|(doc_id, counts)| (doc_id.clone(), self.vector(counts, idf)))
            .collect()
    }

    /// Weight raw counts against `idf`. Terms without an IDF entry drop out.
    pub fn vector(&self, counts: &HashMap<Term, u32>, idf: &IdfTable) -> SparseVector {
        SparseVector::from_weights(
            counts
                .iter()
                .map(|(term, count)| (term.clone(), self.tf.apply(*count) * idf.get(term))),
        )
    }
}
