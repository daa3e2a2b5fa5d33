pub mod hash_index;
pub mod similarity;
pub mod tokenizer;

pub use hash_index::{HashEmbeddingIndex, IndexConfig};
pub use similarity::cosine_similarity;

use crate::Candidate;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RetrievalError {
    #[error("retrieval backend unavailable: {0}")]
    Unavailable(String),
    #[error("retrieval backend returned an invalid result: {0}")]
    InvalidResult(String),
}

/// Rejects a pool that breaks the [`Retriever`] contract: a blank
/// identifier, or a similarity that is NaN or outside [0, 1].
pub fn check_pool(pool: &[Candidate]) -> Result<(), RetrievalError> {
    for candidate in pool {
        if candidate.identifier.trim().is_empty() {
            return Err(RetrievalError::InvalidResult(format!(
                "candidate {:?} has no identifier",
                candidate.name
            )));
        }
        if !(0.0..=1.0).contains(&candidate.semantic_similarity) {
            return Err(RetrievalError::InvalidResult(format!(
                "similarity {} for {} is outside [0, 1]",
                candidate.semantic_similarity, candidate.identifier
            )));
        }
    }
    Ok(())
}

/// Semantic candidate source.
///
/// Returns at most `pool_size` candidates with `semantic_similarity` in
/// [0, 1]; callers must not rely on the returned order.
pub trait Retriever: Send + Sync {
    /// Implementation name, logged with every search.
    fn name(&self) -> &'static str;

    fn search(&self, query: &str, pool_size: usize) -> Result<Vec<Candidate>, RetrievalError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(identifier: &str, similarity: f64) -> Candidate {
        Candidate {
            identifier: identifier.into(),
            name: "Core Java".into(),
            semantic_similarity: similarity,
            ..Candidate::default()
        }
    }

    #[test]
    fn pools_within_contract_pass() {
        assert_eq!(check_pool(&[]), Ok(()));
        assert_eq!(
            check_pool(&[candidate("a", 0.0), candidate("b", 1.0), candidate("c", 0.5)]),
            Ok(())
        );
    }

    #[test]
    fn out_of_range_or_nan_similarity_is_invalid() {
        for similarity in [1.5, -0.1, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                check_pool(&[candidate("a", 0.5), candidate("b", similarity)]),
                Err(RetrievalError::InvalidResult(_))
            ));
        }
    }

    #[test]
    fn blank_identifier_is_invalid() {
        let err = check_pool(&[candidate("  ", 0.5)]).unwrap_err();
        assert!(matches!(err, RetrievalError::InvalidResult(ref msg) if msg.contains("Core Java")));
    }
}
