pub mod completion;
pub mod keyword_analyzer;

pub use completion::{
    CompletionAnalyzer, CompletionBackend, build_analysis_prompt, parse_analysis_response,
};
pub use keyword_analyzer::KeywordQueryAnalyzer;

use serde::{Deserialize, Serialize};

use crate::QueryContext;
use crate::category::{TestType, default_required_categories, parse_test_types};
use crate::duration::parse_query_duration;
use crate::skill_expander::expand_skills;

/// Classifier output for one query. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryAnalysis {
    pub job_level: Option<String>,
    pub required_skills: Vec<String>,
    pub required_test_types: Vec<String>,
    pub role: Option<String>,
    pub search_query: Option<String>,
    pub key_requirements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalyzerError {
    #[error("query analyzer unavailable: {0}")]
    Unavailable(String),
    #[error("query analyzer returned a malformed response: {0}")]
    MalformedResponse(String),
}

/// Turns free text into a structured [`QueryAnalysis`].
pub trait QueryAnalyzer: Send + Sync {
    fn name(&self) -> &'static str;

    fn analyze(&self, query: &str) -> Result<QueryAnalysis, AnalyzerError>;
}

fn non_blank_lowercase(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

impl QueryContext {
    /// Context used when no analysis is available: `{K, P}` required and
    /// nothing else but the duration limit found in the text.
    pub fn neutral(query: &str) -> Self {
        Self {
            search_text: query.to_string(),
            expanded_skills: Default::default(),
            role: None,
            job_level: None,
            required_categories: default_required_categories(),
            duration_limit_minutes: parse_query_duration(query),
        }
    }

    /// Builds the ranking context from an analyzer outcome. An analyzer
    /// error degrades to [`QueryContext::neutral`]; logging it is left to
    /// the caller.
    pub fn from_analysis(query: &str, analysis: Result<QueryAnalysis, AnalyzerError>) -> Self {
        let Ok(analysis) = analysis else {
            return Self::neutral(query);
        };

        let search_text = analysis
            .search_query
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(query)
            .to_string();

        let mut required_categories = parse_test_types(&analysis.required_test_types);
        if required_categories.is_empty() {
            required_categories = default_required_categories();
        }
        // technical roles still get a behavioural check
        if required_categories.contains(&TestType::Knowledge) {
            required_categories.insert(TestType::Personality);
        }

        Self {
            search_text,
            expanded_skills: expand_skills(&analysis.required_skills),
            role: non_blank_lowercase(analysis.role.as_deref()),
            job_level: non_blank_lowercase(analysis.job_level.as_deref()),
            required_categories,
            duration_limit_minutes: parse_query_duration(query),
        }
    }
}
