use std::env;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::query::{QueryAnalysis, QueryAnalyzer};
use crate::ranking::{RankingEngine, ScoreBreakdown};
use crate::retrieval::{RetrievalError, Retriever, check_pool};
use crate::{Candidate, QueryContext};

pub const DEFAULT_POOL_SIZE: usize = 100;
pub const DEFAULT_MAX_RESULTS: usize = 10;
pub const DEFAULT_MIN_QUERY_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommenderConfig {
    /// Candidates requested from the retriever per query.
    pub pool_size: usize,
    pub max_results: usize,
    pub min_query_chars: usize,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            max_results: DEFAULT_MAX_RESULTS,
            min_query_chars: DEFAULT_MIN_QUERY_CHARS,
        }
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl RecommenderConfig {
    pub fn from_env() -> Self {
        Self {
            pool_size: env_usize("AR_RETRIEVAL_POOL_SIZE", DEFAULT_POOL_SIZE),
            max_results: env_usize("AR_MAX_RESULTS", DEFAULT_MAX_RESULTS).max(1),
            min_query_chars: env_usize("AR_MIN_QUERY_CHARS", DEFAULT_MIN_QUERY_CHARS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecommendError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedAssessment {
    pub candidate: Candidate,
    pub scores: ScoreBreakdown,
}

/// Owned outcome of one recommendation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub query: String,
    /// `None` when the analyzer failed.
    pub analysis: Option<QueryAnalysis>,
    pub context: QueryContext,
    pub items: Vec<RecommendedAssessment>,
}

impl Recommendation {
    pub fn identifiers(&self) -> Vec<&str> {
        self.items
            .iter()
            .map(|item| item.candidate.identifier.as_str())
            .collect()
    }
}

/// Analyze, retrieve, rank. One instance serves both the HTTP API and
/// offline evaluation.
pub struct Recommender {
    retriever: Arc<dyn Retriever>,
    analyzer: Arc<dyn QueryAnalyzer>,
    engine: RankingEngine,
    config: RecommenderConfig,
}

impl Recommender {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        analyzer: Arc<dyn QueryAnalyzer>,
        engine: RankingEngine,
        config: RecommenderConfig,
    ) -> Self {
        Self {
            retriever,
            analyzer,
            engine,
            config,
        }
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    fn validate(&self, query: &str, n: usize) -> Result<(), RecommendError> {
        let chars = query.trim().chars().count();
        if chars < self.config.min_query_chars {
            return Err(RecommendError::InvalidRequest(format!(
                "query must be at least {} characters",
                self.config.min_query_chars
            )));
        }
        if n == 0 || n > self.config.max_results {
            return Err(RecommendError::InvalidRequest(format!(
                "n_results must be between 1 and {}",
                self.config.max_results
            )));
        }
        Ok(())
    }

    /// Raw analyzer output (if any) and the ranking context derived from
    /// it. A failing analyzer yields the neutral context.
    pub fn analyze(&self, query: &str) -> (Option<QueryAnalysis>, QueryContext) {
        let analysis = self.analyzer.analyze(query);
        if let Err(err) = &analysis {
            warn!(
                analyzer = self.analyzer.name(),
                error = %err,
                "query analysis failed; using neutral context"
            );
        }
        let raw = analysis.as_ref().ok().cloned();
        (raw, QueryContext::from_analysis(query, analysis))
    }

    pub fn recommend(&self, query: &str, n: usize) -> Result<Recommendation, RecommendError> {
        self.validate(query, n)?;
        let started = Instant::now();
        let query = query.trim();

        let (analysis, context) = self.analyze(query);
        debug!(
            search_text = %context.search_text,
            skills = context.expanded_skills.len(),
            duration_limit = ?context.duration_limit_minutes,
            "query analyzed"
        );

        let pool = self
            .retriever
            .search(&context.search_text, self.config.pool_size)?;
        check_pool(&pool)?;
        let ranked = self.engine.rank(&pool, &context, n);

        let items: Vec<RecommendedAssessment> = ranked
            .iter()
            .map(|entry| RecommendedAssessment {
                candidate: entry.candidate.clone(),
                scores: entry.scores,
            })
            .collect();

        info!(
            retriever = self.retriever.name(),
            analyzer = self.analyzer.name(),
            pool = pool.len(),
            returned = items.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "recommendation served"
        );

        Ok(Recommendation {
            query: query.to_string(),
            analysis,
            context,
            items,
        })
    }
}
