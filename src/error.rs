use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::pipeline::SubmitError;
use crate::storage::StoreError;

/// Error surface of the JSON API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Analysis(_) => StatusCode::BAD_GATEWAY,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the person who triggered the failure.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation(msg) => msg.clone(),
            ApiError::Analysis(_) => {
                "We could not generate a response right now. Please try again.".to_string()
            }
            ApiError::Store(_) => "The review data could not be read or saved.".to_string(),
        }
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Validation(msg) => ApiError::Validation(msg),
            SubmitError::Analysis(e) => ApiError::Analysis(e.to_string()),
            SubmitError::Store(e) => ApiError::Store(e.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Validation(_) => {}
            ApiError::Analysis(msg) => tracing::warn!("Analysis error: {}", msg),
            ApiError::Store(msg) => tracing::error!("Store error: {}", msg),
        }

        let body = serde_json::json!({
            "success": false,
            "error": self.user_message(),
        });
        (self.status(), Json(body)).into_response()
    }
}
