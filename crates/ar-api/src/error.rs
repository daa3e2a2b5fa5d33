use std::future::Future;

use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use ar_common::catalog::CatalogError;
use ar_common::recommend::RecommendError;

tokio::task_local! {
    static REQUEST_ID: String;
}

/// Runs `fut` with `request_id` visible to [`current_request_id`].
pub async fn with_request_id<Fut, T>(request_id: Option<String>, fut: Fut) -> T
where
    Fut: Future<Output = T>,
{
    match request_id {
        Some(id) => REQUEST_ID.scope(id, fut).await,
        None => fut.await,
    }
}

pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(String::clone).ok()
}

const PUBLIC_MESSAGE_MAX_CHARS: usize = 240;

fn redact(token: &str) -> &str {
    if token.contains("://") {
        "[redacted-url]"
    } else if token.starts_with('/') || token.contains('\\') {
        "[redacted-path]"
    } else {
        token
    }
}

/// Client-facing form of a validation message: urls and filesystem paths
/// are masked, whitespace collapsed, length bounded.
fn sanitize_message(message: &str) -> String {
    let flattened: String = message
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let tokens: Vec<&str> = flattened.split_whitespace().map(redact).collect();
    let mut cleaned = tokens.join(" ");

    if let Some((cut, _)) = cleaned.char_indices().nth(PUBLIC_MESSAGE_MAX_CHARS) {
        cleaned.truncate(cut);
        cleaned.push('…');
    }

    if cleaned.is_empty() {
        "invalid request".to_string()
    } else {
        cleaned
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Client input rejected before ranking.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Readiness check failure; the reason is a fixed token.
    #[error("not ready: {0}")]
    NotReady(&'static str),
    /// An upstream dependency (retrieval) failed.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    request_id: Option<String>,
}

impl ApiError {
    /// HTTP status and stable machine-readable code.
    fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::NotReady(_) => (StatusCode::SERVICE_UNAVAILABLE, "not_ready"),
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    pub(crate) fn code(&self) -> &'static str {
        self.classify().1
    }

    /// Only validation messages and readiness reasons reach clients.
    fn public_message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => sanitize_message(msg),
            ApiError::NotReady(reason) => (*reason).to_string(),
            ApiError::ServiceUnavailable(_) => "service unavailable".to_string(),
            ApiError::Internal(_) => "internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();
        let request_id = current_request_id();
        let rid = request_id.as_deref().unwrap_or("");

        if status.is_server_error() && !matches!(self, ApiError::NotReady(_)) {
            error!(code, status = status.as_u16(), request_id = rid, error = %self, "request failed");
        } else {
            warn!(code, status = status.as_u16(), request_id = rid, error = %self, "request rejected");
        }

        let body = ErrorBody {
            code,
            message: self.public_message(),
            request_id,
        };
        (status, Json(body)).into_response()
    }
}

impl From<RecommendError> for ApiError {
    fn from(value: RecommendError) -> Self {
        match value {
            RecommendError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            RecommendError::Retrieval(err) => ApiError::ServiceUnavailable(err.to_string()),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(value: CatalogError) -> Self {
        ApiError::Internal(value.to_string())
    }
}
