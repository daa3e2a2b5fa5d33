pub mod recommend_request;
pub mod recommend_response;

pub use recommend_request::{DEFAULT_N_RESULTS, RecommendQuery, RecommendRequest};
pub use recommend_response::{
    AnalysisSummary, AssessmentResponse, HealthResponse, RecommendResponse,
};
