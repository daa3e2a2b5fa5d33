use tracing::debug;

use super::balance::balance;
use super::scoring::{ScoredCandidate, SignalScorer};
use super::weights::ScoringWeights;
use crate::{Candidate, QueryContext};

/// Balanced, ordered selection for one query. Borrows from the pool it was
/// ranked from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationResult<'a> {
    pub entries: Vec<ScoredCandidate<'a>>,
}

impl<'a> RecommendationResult<'a> {
    pub fn identifiers(&self) -> Vec<&'a str> {
        self.entries
            .iter()
            .map(|entry| entry.candidate.identifier.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredCandidate<'a>> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for RecommendationResult<'a> {
    type Item = ScoredCandidate<'a>;
    type IntoIter = std::vec::IntoIter<ScoredCandidate<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Stateless: score every pool candidate, then balance.
#[derive(Debug, Clone, Default)]
pub struct RankingEngine {
    scorer: SignalScorer,
}

impl RankingEngine {
    pub fn new(weights: ScoringWeights) -> Self {
        Self {
            scorer: SignalScorer::new(weights),
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        self.scorer.weights()
    }

    pub fn rank<'a>(
        &self,
        pool: &'a [Candidate],
        ctx: &QueryContext,
        n: usize,
    ) -> RecommendationResult<'a> {
        let scored: Vec<ScoredCandidate<'a>> = pool
            .iter()
            .map(|candidate| self.scorer.score(candidate, ctx))
            .collect();

        let entries = balance(scored, &ctx.required_categories, n);

        debug!(
            pool = pool.len(),
            requested = n,
            selected = entries.len(),
            required = ?ctx.required_categories,
            "ranked candidate pool"
        );

        RecommendationResult { entries }
    }
}

/// [`RankingEngine::rank`] with the default weights.
pub fn rank<'a>(pool: &'a [Candidate], ctx: &QueryContext, n: usize) -> RecommendationResult<'a> {
    RankingEngine::default().rank(pool, ctx, n)
}
