use std::time::Instant;

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection, rejection::QueryRejection},
};

use ar_common::api::{RecommendQuery, RecommendRequest, RecommendResponse};

use crate::SharedState;
use crate::error::ApiError;

fn serve(
    state: &SharedState,
    method: &'static str,
    request: RecommendRequest,
) -> Result<Json<RecommendResponse>, ApiError> {
    let started = Instant::now();
    let outcome = state
        .recommender
        .recommend(&request.query, request.n_results)
        .map(|rec| Json(RecommendResponse::from(&rec)))
        .map_err(ApiError::from);

    ar_metrics::record_recommendation(
        method,
        started.elapsed(),
        outcome.as_ref().err().map(ApiError::code),
    );
    outcome
}

pub async fn recommend_get(
    State(state): State<SharedState>,
    query: Result<Query<RecommendQuery>, QueryRejection>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let Query(query) = query.map_err(|err| ApiError::BadRequest(err.body_text()))?;
    serve(&state, "GET", query.into())
}

pub async fn recommend_post(
    State(state): State<SharedState>,
    body: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let Json(request) = body.map_err(|err| ApiError::BadRequest(err.body_text()))?;
    serve(&state, "POST", request)
}
