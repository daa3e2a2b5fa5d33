use serde::Serialize;

use crate::recommend::{Recommendation, RecommendedAssessment};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub job_level: Option<String>,
    /// Skills as returned by the analyzer, before expansion.
    pub required_skills: Vec<String>,
    pub expanded_skills: Vec<String>,
    pub required_test_types: Vec<String>,
    pub role: Option<String>,
    pub duration_constraint: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentResponse {
    pub name: String,
    pub url: String,
    pub description: String,
    pub test_types: Vec<String>,
    pub job_level: String,
    pub skills: Vec<String>,
    pub category: String,
    pub duration: String,
    pub similarity_score: f64,
    pub keyword_score: f64,
    pub metadata_score: f64,
    pub final_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendResponse {
    pub query: String,
    pub analysis: AnalysisSummary,
    pub recommendations: Vec<AssessmentResponse>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub assessments_loaded: usize,
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

impl From<&RecommendedAssessment> for AssessmentResponse {
    fn from(item: &RecommendedAssessment) -> Self {
        let c = &item.candidate;
        Self {
            name: c.name.clone(),
            url: c.identifier.clone(),
            description: c.description.clone(),
            test_types: c.test_types.iter().map(|t| t.label().to_string()).collect(),
            job_level: c.job_level.clone(),
            skills: c.skills.clone(),
            category: c.category.clone(),
            duration: c.duration.clone(),
            similarity_score: round4(item.scores.semantic_score),
            keyword_score: round4(item.scores.keyword_score),
            metadata_score: round4(item.scores.metadata_score),
            final_score: round4(item.scores.final_score),
        }
    }
}

impl From<&Recommendation> for RecommendResponse {
    fn from(rec: &Recommendation) -> Self {
        let ctx = &rec.context;
        let recommendations: Vec<AssessmentResponse> =
            rec.items.iter().map(AssessmentResponse::from).collect();

        Self {
            query: rec.query.clone(),
            analysis: AnalysisSummary {
                job_level: ctx.job_level.clone(),
                required_skills: rec
                    .analysis
                    .as_ref()
                    .map(|a| a.required_skills.clone())
                    .unwrap_or_default(),
                expanded_skills: ctx.expanded_skills.iter().cloned().collect(),
                required_test_types: ctx
                    .required_categories
                    .iter()
                    .map(|t| t.to_string())
                    .collect(),
                role: ctx.role.clone(),
                duration_constraint: ctx.duration_limit_minutes,
            },
            count: recommendations.len(),
            recommendations,
        }
    }
}
