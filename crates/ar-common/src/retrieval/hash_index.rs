use std::cmp::Ordering;
use std::env;
use std::hash::{Hash, Hasher};

use siphasher::sip::SipHasher13;
use tracing::debug;

use super::similarity::cosine_similarity;
use super::tokenizer::{self, WeightedToken};
use super::{RetrievalError, Retriever};
use crate::Candidate;
use crate::catalog::CatalogEntry;

/// Fixed keys keep vectors stable across processes and toolchains.
/// Changing them changes every embedding.
const HASH_SEED_K0: u64 = 0x0123_4567_89ab_cdef;
const HASH_SEED_K1: u64 = 0xfedc_ba98_7654_3210;

pub const DEFAULT_DIMENSION: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexConfig {
    pub dimension: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
        }
    }
}

impl IndexConfig {
    /// `AR_INDEX_DIMENSION`, falling back to 512 when unset or not a
    /// positive integer.
    pub fn from_env() -> Self {
        let dimension = env::var("AR_INDEX_DIMENSION")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_DIMENSION);
        Self { dimension }
    }
}

/// In-process feature-hashing index over the catalog.
///
/// Deterministic and training-free: every token is hashed with SipHash-1-3
/// into one of `dimension` buckets with a hashed sign, weighted by the field
/// it came from, and the document vector is L2-normalised.
pub struct HashEmbeddingIndex {
    dimension: usize,
    entries: Vec<CatalogEntry>,
    vectors: Vec<Vec<f32>>,
}

impl HashEmbeddingIndex {
    pub fn new(entries: Vec<CatalogEntry>, config: IndexConfig) -> Self {
        let dimension = config.dimension.max(1);
        let vectors = entries
            .iter()
            .map(|entry| embed(&tokenizer::tokenize_entry(entry), dimension))
            .collect();
        debug!(entries = entries.len(), dimension, "hash index built");
        Self {
            dimension,
            entries,
            vectors,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn embed_query(&self, query: &str) -> Vec<f32> {
        embed(&tokenizer::tokenize_query(query), self.dimension)
    }
}

fn hash_bucket(token: &str, dimension: usize) -> usize {
    let mut hasher = SipHasher13::new_with_keys(HASH_SEED_K0, HASH_SEED_K1);
    token.hash(&mut hasher);
    (hasher.finish() % dimension as u64) as usize
}

fn embed(tokens: &[WeightedToken], dimension: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dimension];

    for wt in tokens {
        let idx = hash_bucket(&wt.token, dimension);
        let sign = if hash_bucket(&format!("{}_sign", wt.token), 2) == 0 {
            1.0
        } else {
            -1.0
        };
        vector[idx] += sign * wt.weight;
    }

    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }

    vector
}

impl Retriever for HashEmbeddingIndex {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn search(&self, query: &str, pool_size: usize) -> Result<Vec<Candidate>, RetrievalError> {
        if pool_size == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.embed_query(query);
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| (position, cosine_similarity(&query_vector, vector)))
            .collect();

        // stable: equal similarity keeps catalog order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(pool_size);

        Ok(scored
            .into_iter()
            .map(|(position, similarity)| {
                self.entries[position].to_candidate(f64::from(similarity))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, skills: &[&str], tags: &[&str]) -> CatalogEntry {
        CatalogEntry {
            name: name.into(),
            url: format!("https://example.com/{}", name.to_lowercase().replace(' ', "-")),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            test_types: tags.iter().map(|s| s.to_string()).collect(),
            ..CatalogEntry::default()
        }
    }

    fn index() -> HashEmbeddingIndex {
        HashEmbeddingIndex::new(
            vec![
                entry("Core Java", &["Java", "Spring"], &["K"]),
                entry("Python Programming", &["Python"], &["K"]),
                entry("Teamwork Questionnaire", &["Teamwork", "Collaboration"], &["P"]),
            ],
            IndexConfig::default(),
        )
    }

    #[test]
    fn document_vectors_are_normalised() {
        let idx = index();
        for vector in &idx.vectors {
            let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5, "norm was {norm}");
        }
    }

    #[test]
    fn matching_document_ranks_first() {
        let pool = index().search("java developer with spring", 3).unwrap();
        assert_eq!(pool[0].name, "Core Java");
        assert!(pool.iter().all(|c| (0.0..=1.0).contains(&c.semantic_similarity)));

        let pool = index().search("teamwork and collaboration", 3).unwrap();
        assert_eq!(pool[0].name, "Teamwork Questionnaire");
    }

    #[test]
    fn pool_size_truncates() {
        assert_eq!(index().search("java", 2).unwrap().len(), 2);
        assert!(index().search("java", 0).unwrap().is_empty());
    }

    #[test]
    fn empty_index_yields_empty_pool() {
        let idx = HashEmbeddingIndex::new(Vec::new(), IndexConfig::default());
        assert!(idx.search("anything", 10).unwrap().is_empty());
    }

    #[test]
    fn query_without_tokens_keeps_catalog_order() {
        let pool = index().search("a the of", 3).unwrap();
        let names: Vec<_> = pool.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Core Java", "Python Programming", "Teamwork Questionnaire"]
        );
        assert!(pool.iter().all(|c| c.semantic_similarity == 0.0));
    }

    #[test]
    fn embeddings_are_deterministic() {
        let a = index().embed_query("sql server database");
        let b = index().embed_query("sql server database");
        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_DIMENSION);
    }

    #[test]
    fn zero_dimension_is_clamped() {
        let idx = HashEmbeddingIndex::new(vec![entry("X", &[], &[])], IndexConfig { dimension: 0 });
        assert_eq!(idx.dimension(), 1);
    }
}
