mod api;
mod pages;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/review", get(pages::review_form).post(pages::submit_review))
        .route("/admin", get(pages::admin))
        .route("/admin/refresh", post(pages::refresh))
        .route("/admin/clear", get(pages::confirm_clear).post(pages::clear_all))
        .route("/admin/export.csv", get(pages::export_filtered))
        .route("/admin/export/critical.csv", get(pages::export_critical))
        .route("/api/reviews", get(api::list_reviews).post(api::submit_review))
        .route("/api/metrics", get(api::metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
