use crate::config::EngineConfig;
use crate::corpus::Corpus;
use crate::index::{InvertedIndex, PostingList};
use crate::tokenizer::{EnglishNormalizer, Normalizer};
use crate::weighting::{IdfTable, SparseVector, Weighting};
use crate::{DocId, Term, Weight};
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: Weight,
}

/// Immutable snapshot of an index with its IDF table and document vectors.
///
/// Queries only read from it, so one engine can serve any number of
/// concurrent callers. Rebuilding means constructing a new engine.
pub struct QueryEngine {
    index: InvertedIndex,
    idf: IdfTable,
    vectors: HashMap<DocId, SparseVector>,
    weighting: Weighting,
    normalizer: Arc<dyn Normalizer>,
}

impl QueryEngine {
    /// Index `corpus` from scratch with the default English normalizer.
    pub fn build(corpus: &Corpus, config: &EngineConfig) -> Self {
        Self::build_with(corpus, config.weighting, Arc::new(EnglishNormalizer::default()))
    }

    pub fn build_with(corpus: &Corpus, weighting: Weighting, normalizer: Arc<dyn Normalizer>) -> Self {
        let index = InvertedIndex::build(corpus, normalizer.as_ref());
        Self::from_index(index, weighting, normalizer)
    }

    /// Use persisted postings; term counts are recomputed from `corpus`.
    pub fn from_snapshot(postings: PostingList, corpus: &Corpus, config: &EngineConfig) -> Self {
        let normalizer: Arc<dyn Normalizer> = Arc::new(EnglishNormalizer::default());
        let index = InvertedIndex::from_snapshot(postings, corpus, normalizer.as_ref());
        Self::from_index(index, config.weighting, normalizer)
    }

    /// IDF needs the complete postings, so weighting starts only once the index is frozen.
    pub fn from_index(index: InvertedIndex, weighting: Weighting, normalizer: Arc<dyn Normalizer>) -> Self {
        let idf = weighting.compute_idf(index.postings(), index.num_docs());
        let vectors = weighting.compute_tfidf(index.term_frequencies(), &idf);
        tracing::info!(num_docs = vectors.len(), num_terms = idf.len(), tf = ?weighting.tf, idf = ?weighting.idf, "weighted document vectors");
        Self { index, idf, vectors, weighting, normalizer }
    }

    pub fn index(&self) -> &InvertedIndex { &self.index }

    pub fn idf(&self) -> &IdfTable { &self.idf }

    pub fn weighting(&self) -> Weighting { self.weighting }

    pub fn num_docs(&self) -> usize { self.vectors.len() }

    pub fn vector(&self, doc_id: &str) -> Option<&SparseVector> { self.vectors.get(doc_id) }

    pub fn vectors(&self) -> &HashMap<DocId, SparseVector> { &self.vectors }

    /// Vector for `text` in the corpus vector space. Never touches corpus statistics.
    pub fn query_vector(&self, text: &str) -> SparseVector {
        self.weighting.vector(&self.query_counts(text), &self.idf)
    }

    fn query_counts(&self, text: &str) -> HashMap<Term, u32> {
        let mut counts: HashMap<Term, u32> = HashMap::new();
        for term in self.normalizer.normalize(text) {
            *counts.entry(term).or_insert(0) += 1;
        }
        counts
    }

    /// Rank every document by cosine similarity to `text`, best first, at most `top_k`.
    ///
    /// Equal scores are ordered by document ID ascending. A query with no terms
    /// after normalization, or an empty corpus, gives an empty result.
    pub fn query(&self, text: &str, top_k: usize) -> Vec<ScoredDoc> {
        let counts = self.query_counts(text);
        if top_k == 0 || self.vectors.is_empty() || counts.is_empty() {
            return Vec::new();
        }
        let q = self.weighting.vector(&counts, &self.idf);
        let mut scored: Vec<ScoredDoc> = self
            .vectors
            .par_iter()
            .map(|(doc_id, d)| ScoredDoc { doc_id: doc_id.clone(), score: q.cosine(d) })
            .collect();
        scored.sort_unstable_by(rank_order);
        scored.truncate(top_k);
        tracing::debug!(query = text, query_terms = q.len(), returned = scored.len(), "ranked query");
        scored
    }
}

/// Score descending, then document ID ascending.
fn rank_order(a: &ScoredDoc, b: &ScoredDoc) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.doc_id.cmp(&b.doc_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(docs: &[(&str, &str)]) -> Corpus {
        docs.iter().map(|(id, text)| (id.to_string(), text.to_string())).collect()
    }

    fn engine(docs: &[(&str, &str)]) -> QueryEngine {
        QueryEngine::build(&corpus(docs), &EngineConfig::default())
    }

    #[test]
    fn cat_dog_scenario() {
        let e = engine(&[("d1", "the cat sat"), ("d2", "the dog sat"), ("d3", "cats and dogs")]);
        let ln15 = (3.0f64 / 2.0).ln();
        for term in ["cat", "sat", "dog"] {
            assert_eq!(e.index().doc_frequency(term), 2);
            assert!((e.idf().get(term) - ln15).abs() < 1e-12);
        }

        let hits = e.query("cat", 10);
        let ids: Vec<&str> = hits.iter().map(|h| h.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["d1", "d3", "d2"]);
        assert!(hits[0].score > 0.0);
        assert_eq!(hits[0].score, hits[1].score);
        assert_eq!(hits[2].score, 0.0);
    }

    #[test]
    fn top_k_truncates() {
        let e = engine(&[("a", "apple"), ("b", "banana"), ("c", "cherry")]);
        assert_eq!(e.query("apple", 2).len(), 2);
        assert!(e.query("apple", 0).is_empty());
        assert_eq!(e.query("apple", 1)[0].doc_id, "a");
    }

    #[test]
    fn empty_query_and_empty_corpus() {
        let e = engine(&[("a", "apple")]);
        assert!(e.query("", 5).is_empty());
        assert!(e.query("the and of", 5).is_empty());
        assert!(engine(&[]).query("apple", 5).is_empty());
    }

    #[test]
    fn term_in_every_document_scores_zero() {
        let e = engine(&[("a", "common"), ("b", "common common"), ("c", "common rare")]);
        assert_eq!(e.idf().get("common"), 0.0);
        let hits = e.query("common", 10);
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|h| h.score == 0.0));
        let ids: Vec<&str> = hits.iter().map(|h| h.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn unknown_query_terms_score_zero() {
        let e = engine(&[("a", "apple pie"), ("b", "banana bread")]);
        let hits = e.query("zucchini", 5);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.score == 0.0));
    }

    #[test]
    fn repeated_queries_are_identical() {
        let e = engine(&[("x", "red fish blue fish"), ("y", "one fish two fish"), ("z", "red blue green")]);
        assert_eq!(e.query("red fish", 3), e.query("red fish", 3));
    }

    #[test]
    fn query_does_not_change_idf() {
        let e = engine(&[("a", "apple"), ("b", "banana")]);
        let before = e.idf().clone();
        e.query("apple kiwi kiwi", 5);
        assert_eq!(&before, e.idf());
        assert!(!e.idf().contains("kiwi"));
    }
}
