use axum::{
    extract::{rejection::FormRejection, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tera::Context;

use crate::dashboard::{
    critical_only, overview, page_from_pairs, paginate, DailyPoint, DateRange, ReviewFilter,
    SortOrder, PAGE_SIZE,
};
use crate::error::ApiError;
use crate::pipeline::{parse_rating, SubmitError};
use crate::state::AppState;
use crate::storage::{to_csv, SubmissionRecord, TIMESTAMP_FORMAT};

const SUMMARY_PREVIEW_CHARS: usize = 50;
const DEFAULT_RATING: u8 = 3;

pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut ctx = Context::new();
    ctx.insert("refresh_secs", &state.config.cache_ttl.as_secs());
    render_template("index.html", &ctx)
}

/// Raw form fields; the rating stays text until it has been validated.
#[derive(Deserialize, Default)]
pub struct ReviewForm {
    rating: Option<String>,
    #[serde(default)]
    review: String,
}

impl ReviewForm {
    fn rating(&self) -> Result<u8, SubmitError> {
        let raw = self.rating.as_deref().map(str::trim).unwrap_or_default();
        match raw.parse::<i64>() {
            Ok(value) => parse_rating(value),
            Err(_) => Err(SubmitError::Validation(
                "Please choose a rating from 1 to 5 stars.".to_string(),
            )),
        }
    }
}

#[derive(Serialize)]
struct RatingOption {
    value: u8,
    stars: String,
    selected: bool,
}

pub async fn review_form(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let ctx = review_context(&state, DEFAULT_RATING, "");
    render_template("review.html", &ctx)
}

pub async fn submit_review(
    State(state): State<Arc<AppState>>,
    form: Result<Form<ReviewForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            let error = ApiError::Validation(rejection.body_text());
            return review_error(&state, DEFAULT_RATING, &ReviewForm::default(), error);
        }
    };

    let submitted = match form.rating() {
        Ok(rating) => state.pipeline.submit(rating, &form.review).await,
        Err(e) => Err(e),
    };
    match submitted {
        Ok(outcome) => {
            let mut ctx = review_context(&state, DEFAULT_RATING, "");
            ctx.insert("outcome", &outcome);
            render_template("review.html", &ctx).into_response()
        }
        Err(e) => {
            let rating = form.rating().unwrap_or(DEFAULT_RATING);
            review_error(&state, rating, &form, e.into())
        }
    }
}

fn review_error(state: &AppState, rating: u8, form: &ReviewForm, error: ApiError) -> Response {
    let mut ctx = review_context(state, rating, &form.review);
    ctx.insert("error", &error.user_message());
    (error.status(), render_template("review.html", &ctx)).into_response()
}

fn review_context(state: &AppState, rating: u8, review: &str) -> Context {
    let mut ctx = Context::new();
    let options: Vec<RatingOption> = (1..=5u8)
        .map(|value| RatingOption {
            value,
            stars: "⭐".repeat(value as usize),
            selected: value == rating,
        })
        .collect();
    ctx.insert("rating_options", &options);
    ctx.insert("review", review);

    // Sidebar stats are best-effort; a store problem only hides them.
    if let Ok(records) = state.store.load_all() {
        if !records.is_empty() {
            let total = records.len();
            let average = records.iter().map(|r| r.rating as f64).sum::<f64>() / total as f64;
            ctx.insert("stats_total", &total);
            ctx.insert("stats_average", &format!("{:.1}", average));
        }
    }
    ctx
}

/// One entry of the expandable review list.
#[derive(Serialize, Clone)]
struct RecordView {
    timestamp: String,
    short_time: String,
    rating: u8,
    stars: String,
    mood: &'static str,
    tone: &'static str,
    review_text: String,
    ai_response: String,
    ai_summary: String,
    summary_preview: String,
    recommended_actions: String,
}

impl From<&SubmissionRecord> for RecordView {
    fn from(record: &SubmissionRecord) -> Self {
        let tone = match record.rating {
            4..=5 => "green",
            3 => "orange",
            _ => "red",
        };
        let mut summary_preview: String = record.ai_summary.chars().take(SUMMARY_PREVIEW_CHARS).collect();
        if record.ai_summary.chars().count() > SUMMARY_PREVIEW_CHARS {
            summary_preview.push_str("...");
        }

        Self {
            timestamp: record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            short_time: record.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            rating: record.rating,
            stars: record.stars(),
            mood: record.mood(),
            tone,
            review_text: record.review_text.clone(),
            ai_response: record.ai_response.clone(),
            ai_summary: record.ai_summary.clone(),
            summary_preview,
            recommended_actions: record.recommended_actions.clone(),
        }
    }
}

#[derive(Serialize)]
struct TimelineBar {
    date: String,
    count: usize,
    average_rating: String,
    height_pct: f64,
}

fn timeline_bars(points: &[DailyPoint]) -> Vec<TimelineBar> {
    let max = points.iter().map(|p| p.count).max().unwrap_or(0).max(1);
    points
        .iter()
        .map(|p| TimelineBar {
            date: p.date.format("%Y-%m-%d").to_string(),
            count: p.count,
            average_rating: format!("{:.2}", p.average_rating),
            height_pct: p.count as f64 * 100.0 / max as f64,
        })
        .collect()
}

#[derive(Serialize)]
struct Choice {
    value: &'static str,
    label: &'static str,
    selected: bool,
}

pub async fn admin(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let records = match state.dashboard.records() {
        Ok(records) => records,
        Err(e) => return store_error_page(&state, e.into()),
    };

    let now = Local::now().naive_local();
    let filter = ReviewFilter::from_pairs(&pairs);
    let filtered: Vec<RecordView> = filter
        .apply(&records, now)
        .into_iter()
        .map(RecordView::from)
        .collect();
    let page = paginate(&filtered, page_from_pairs(&pairs), PAGE_SIZE);
    let summary = overview(&records, now);

    let mut ctx = Context::new();
    ctx.insert("refresh_secs", &state.config.cache_ttl.as_secs());
    ctx.insert(
        "cleared",
        &pairs.iter().any(|(key, value)| key == "cleared" && value == "1"),
    );
    ctx.insert("empty", &records.is_empty());
    ctx.insert("metrics", &summary.metrics);
    ctx.insert("distribution", &summary.distribution);
    ctx.insert("timeline", &timeline_bars(&summary.timeline));
    ctx.insert("critical_highlights", &summary.critical_highlights);
    ctx.insert("top_highlights", &summary.top_highlights);
    ctx.insert("page", &page);
    ctx.insert("filter_query", &filter.to_query());

    let rating_choices: Vec<RatingOption> = (1..=5u8)
        .map(|value| RatingOption {
            value,
            stars: format!("{} ⭐", value),
            selected: filter.includes_rating(value),
        })
        .collect();
    let date_choices: Vec<Choice> = DateRange::ALL
        .into_iter()
        .map(|range| Choice {
            value: range.as_str(),
            label: range.label(),
            selected: range == filter.date_range,
        })
        .collect();
    let sort_choices: Vec<Choice> = SortOrder::ALL
        .into_iter()
        .map(|order| Choice {
            value: order.as_str(),
            label: order.label(),
            selected: order == filter.sort,
        })
        .collect();
    ctx.insert("rating_choices", &rating_choices);
    ctx.insert("date_choices", &date_choices);
    ctx.insert("sort_choices", &sort_choices);

    render_template("admin.html", &ctx).into_response()
}

pub async fn export_filtered(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    export(&state, &pairs, false)
}

pub async fn export_critical(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    export(&state, &pairs, true)
}

fn export(state: &AppState, pairs: &[(String, String)], critical: bool) -> Response {
    let records = match state.dashboard.records() {
        Ok(records) => records,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let filtered = ReviewFilter::from_pairs(pairs).apply(&records, Local::now().naive_local());
    let selected = if critical {
        critical_only(&filtered)
    } else {
        filtered
    };

    let csv = match to_csv(selected.into_iter()) {
        Ok(csv) => csv,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let prefix = if critical { "critical_reviews" } else { "reviews" };
    let filename = format!("{}_{}.csv", prefix, Local::now().format("%Y%m%d_%H%M%S"));
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    )
        .into_response()
}

pub async fn refresh(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.dashboard.refresh();
    Redirect::to("/admin")
}

pub async fn confirm_clear(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut ctx = Context::new();
    let total = state.dashboard.records().map(|r| r.len()).unwrap_or(0);
    ctx.insert("total", &total);
    render_template("confirm_clear.html", &ctx)
}

#[derive(Deserialize)]
pub struct ClearForm {
    confirm: Option<String>,
}

pub async fn clear_all(State(state): State<Arc<AppState>>, Form(form): Form<ClearForm>) -> Response {
    if form.confirm.as_deref() != Some("yes") {
        return Redirect::to("/admin/clear").into_response();
    }

    match state.dashboard.clear_all() {
        Ok(()) => Redirect::to("/admin?cleared=1").into_response(),
        Err(e) => store_error_page(&state, e.into()),
    }
}

fn store_error_page(state: &AppState, error: ApiError) -> Response {
    tracing::error!("Dashboard failed: {}", error);
    let mut ctx = Context::new();
    ctx.insert("refresh_secs", &state.config.cache_ttl.as_secs());
    ctx.insert("error", &error.user_message());
    ctx.insert("empty", &true);
    (error.status(), render_template("admin.html", &ctx)).into_response()
}

fn render_template(name: &str, ctx: &Context) -> Html<String> {
    let tera = crate::templates::get_tera();
    let rendered = tera.render(name, ctx).unwrap_or_else(|e| {
        tracing::error!("Template {} failed to render: {}", name, e);
        format!("Template error: {}", name)
    });
    Html(rendered)
}
