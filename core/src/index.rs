use crate::corpus::Corpus;
use crate::tokenizer::Normalizer;
use crate::{DocId, Term};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// Term -> document IDs, one entry per occurrence (a document that mentions a
/// term three times appears three times).
pub type PostingList = HashMap<Term, Vec<DocId>>;

/// Document -> term -> raw occurrence count.
pub type TermFrequencyTable = HashMap<DocId, HashMap<Term, u32>>;

/// Owns postings and term counts while documents are being added.
///
/// Builders for disjoint document sets can be filled independently and merged,
/// which is how [`InvertedIndex::build`] spreads the work over rayon workers.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    postings: PostingList,
    term_frequencies: TermFrequencyTable,
}

impl IndexBuilder {
    pub fn new() -> Self { Self::default() }

    /// Record an already-normalized term sequence for `doc_id`.
    ///
    /// A document with no terms still counts towards `N`.
    pub fn add_terms(&mut self, doc_id: &str, terms: Vec<Term>) {
        let counts = self.term_frequencies.entry(doc_id.to_string()).or_default();
        for term in terms {
            *counts.entry(term.clone()).or_insert(0) += 1;
            self.postings.entry(term).or_default().push(doc_id.to_string());
        }
    }

    pub fn add_document(&mut self, doc_id: &str, text: &str, normalizer: &dyn Normalizer) {
        self.add_terms(doc_id, normalizer.normalize(text));
    }

    /// Fold another builder's documents into this one. Document sets must be disjoint.
    pub fn merge(mut self, other: IndexBuilder) -> Self {
        for (term, ids) in other.postings {
            self.postings.entry(term).or_default().extend(ids);
        }
        self.term_frequencies.extend(other.term_frequencies);
        self
    }

    pub fn num_docs(&self) -> usize { self.term_frequencies.len() }

    /// Finish building. Posting lists are sorted by document ID; duplicates stay.
    pub fn freeze(self) -> InvertedIndex {
        InvertedIndex::from_parts(self.postings, self.term_frequencies)
    }
}

/// Frozen postings and term counts. Never mutated after construction; a
/// changed corpus means building a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct InvertedIndex {
    postings: PostingList,
    term_frequencies: TermFrequencyTable,
}

impl InvertedIndex {
    /// Normalize and count every document in parallel, then merge the partial builders.
    pub fn build(corpus: &Corpus, normalizer: &dyn Normalizer) -> Self {
        let builder = corpus
            .par_iter()
            .fold(IndexBuilder::new, |mut b, (id, text)| {
                b.add_document(id, text, normalizer);
                b
            })
            .reduce(IndexBuilder::new, IndexBuilder::merge);
        let index = builder.freeze();
        tracing::info!(num_docs = index.num_docs(), num_terms = index.num_terms(), "built inverted index");
        index
    }

    /// Pair postings read from a snapshot with term counts recomputed from `corpus`.
    ///
    /// `N` is the number of documents in `corpus`; postings are taken as given.
    pub fn from_snapshot(postings: PostingList, corpus: &Corpus, normalizer: &dyn Normalizer) -> Self {
        let term_frequencies: TermFrequencyTable = corpus
            .par_iter()
            .map(|(id, text)| {
                let mut counts: HashMap<Term, u32> = HashMap::new();
                for term in normalizer.normalize(text) {
                    *counts.entry(term).or_insert(0) += 1;
                }
                (id.clone(), counts)
            })
            .collect();
        let index = Self::from_parts(postings, term_frequencies);
        tracing::info!(num_docs = index.num_docs(), num_terms = index.num_terms(), "loaded inverted index from snapshot");
        index
    }

    fn from_parts(mut postings: PostingList, term_frequencies: TermFrequencyTable) -> Self {
        for ids in postings.values_mut() {
            ids.sort();
        }
        Self { postings, term_frequencies }
    }

    pub fn postings(&self) -> &PostingList { &self.postings }

    pub fn term_frequencies(&self) -> &TermFrequencyTable { &self.term_frequencies }

    pub fn num_docs(&self) -> usize { self.term_frequencies.len() }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    /// Number of distinct documents containing `term`; 0 for unknown terms.
    pub fn doc_frequency(&self, term: &str) -> usize {
        self.postings.get(term).map(|ids| distinct_docs(ids)).unwrap_or(0)
    }
}

/// Distinct document IDs in a posting list, in any order.
pub(crate) fn distinct_docs(ids: &[DocId]) -> usize {
    ids.iter().collect::<HashSet<_>>().len()
}
