use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use chrono::Local;
use serde::Deserialize;
use std::sync::Arc;

use crate::dashboard::{overview, Overview, ReviewFilter};
use crate::error::ApiError;
use crate::pipeline::{parse_rating, SubmissionOutcome};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SubmitRequest {
    rating: i64,
    #[serde(default)]
    review_text: String,
}

pub async fn submit_review(
    State(state): State<Arc<AppState>>,
    request: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Json<SubmissionOutcome>, ApiError> {
    let Json(request) = request.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
    let rating = parse_rating(request.rating)?;
    let outcome = state.pipeline.submit(rating, &request.review_text).await?;
    Ok(Json(outcome))
}

pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let records = state.dashboard.records()?;
    let filter = ReviewFilter::from_pairs(&pairs);
    let selected = filter.apply(&records, Local::now().naive_local());

    Ok(Json(serde_json::json!({
        "total": selected.len(),
        "reviews": selected,
    })))
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<Json<Overview>, ApiError> {
    let records = state.dashboard.records()?;
    Ok(Json(overview(&records, Local::now().naive_local())))
}
