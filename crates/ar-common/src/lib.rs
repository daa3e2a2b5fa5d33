pub mod api;
pub mod catalog;
pub mod category;
pub mod duration;
pub mod evaluation;
pub mod logging;
pub mod query;
pub mod ranking;
pub mod recommend;
pub mod retrieval;
pub mod run_id;
pub mod skill_expander;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub use category::TestType;
pub use ranking::{RankingEngine, RecommendationResult, ScoreBreakdown, ScoredCandidate, rank};

/// One assessment product as returned by retrieval.
///
/// Retrieval-supplied fields are never modified by the ranking engine; scores
/// are attached through [`ScoredCandidate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Unique key within a pool (the product URL).
    pub identifier: String,
    pub name: String,
    pub description: String,
    pub skills: Vec<String>,
    pub test_types: BTreeSet<TestType>,
    pub job_level: String,
    /// Catalog grouping label, carried through to responses.
    #[serde(default)]
    pub category: String,
    pub duration: String,
    /// Normalised to [0, 1] by the retriever.
    pub semantic_similarity: f64,
}

impl Candidate {
    pub fn has_test_type(&self, tag: TestType) -> bool {
        self.test_types.contains(&tag)
    }
}

/// Structured interpretation of one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryContext {
    pub search_text: String,
    /// Ordered so that score summation order is fixed across calls.
    pub expanded_skills: BTreeSet<String>,
    pub role: Option<String>,
    pub job_level: Option<String>,
    /// Never empty; `{K, P}` when nothing could be derived.
    pub required_categories: BTreeSet<TestType>,
    pub duration_limit_minutes: Option<u32>,
}
