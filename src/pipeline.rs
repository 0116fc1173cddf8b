use chrono::{Local, Timelike};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::agents::{AnalysisError, Analyzer};
use crate::storage::{ReviewStore, StoreError, SubmissionRecord};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{0}")]
    Validation(String),

    #[error("analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub reply: String,
    pub rating: u8,
    /// Top ratings get the celebratory treatment on the results view.
    pub celebrate: bool,
}

/// Accepts a raw rating from any input surface if it is a whole number from 1 to 5.
pub fn parse_rating(raw: i64) -> Result<u8, SubmitError> {
    u8::try_from(raw)
        .ok()
        .filter(|rating| (1..=5).contains(rating))
        .ok_or_else(|| SubmitError::Validation(format!("Rating must be between 1 and 5, got {}", raw)))
}

/// Analyzer then store, once per submitted review. Nothing is stored unless
/// both model calls complete.
pub struct SubmissionPipeline {
    analyzer: Analyzer,
    store: Arc<ReviewStore>,
}

impl SubmissionPipeline {
    pub fn new(analyzer: Analyzer, store: Arc<ReviewStore>) -> Self {
        Self { analyzer, store }
    }

    pub async fn submit(&self, rating: u8, review_text: &str) -> Result<SubmissionOutcome, SubmitError> {
        let rating = parse_rating(rating.into())?;
        if review_text.trim().is_empty() {
            return Err(SubmitError::Validation(
                "Please write a review before submitting.".to_string(),
            ));
        }

        let (reply, analysis) = tokio::try_join!(
            self.analyzer.respond(rating, review_text),
            self.analyzer.analyze(rating, review_text),
        )
        .map_err(|e| {
            error!("Review analysis with {} failed: {}", self.analyzer.model_name(), e);
            SubmitError::from(e)
        })?;
        let (ai_summary, recommended_actions) = analysis.into_parts(rating);

        let timestamp = Local::now().naive_local();
        let record = SubmissionRecord {
            timestamp: timestamp.with_nanosecond(0).unwrap_or(timestamp),
            rating,
            review_text: review_text.to_string(),
            ai_response: reply.clone(),
            ai_summary,
            recommended_actions,
        };
        self.store.append(&record)?;
        info!(rating, "Stored new review");

        Ok(SubmissionOutcome {
            reply,
            rating,
            celebrate: rating == 5,
        })
    }
}
