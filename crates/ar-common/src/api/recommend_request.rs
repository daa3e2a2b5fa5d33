use serde::Deserialize;

pub const DEFAULT_N_RESULTS: usize = 10;

fn default_n_results() -> usize {
    DEFAULT_N_RESULTS
}

/// `POST /recommend` body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecommendRequest {
    pub query: String,
    #[serde(default = "default_n_results")]
    pub n_results: usize,
}

/// `GET /recommend` query string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecommendQuery {
    pub query: String,
    #[serde(default = "default_n_results")]
    pub n_results: usize,
}

impl From<RecommendQuery> for RecommendRequest {
    fn from(value: RecommendQuery) -> Self {
        Self {
            query: value.query,
            n_results: value.n_results,
        }
    }
}
