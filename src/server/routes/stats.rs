//! Statistics endpoints.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::server::state::AppState;
use crate::store::{
    bucketize, monthly_totals, StatsOutcome, SubmissionCalendar, DEFAULT_WINDOW_DAYS,
};

/// Response header telling clients whether data came from cache.
pub const CACHE_STATUS_HEADER: &str = "x-stats-cache";

/// Largest heatmap window a client may ask for.
pub const MAX_WINDOW_DAYS: u32 = 730;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Deserialize)]
pub struct HeatmapQuery {
    pub days: Option<u32>,
}

/// GET /api/stats - Normalized LeetCode snapshot.
pub async fn get_stats(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let outcome = state.cache.get().await;
    match outcome.snapshot() {
        Some(snapshot) => json_response(&outcome, snapshot.as_ref(), &headers),
        None => error_response(&outcome),
    }
}

/// GET /api/stats/progress - Solved/total percentages per difficulty.
pub async fn get_progress(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let outcome = state.cache.get().await;
    match outcome.snapshot() {
        Some(snapshot) => json_response(&outcome, &snapshot.progress(), &headers),
        None => error_response(&outcome),
    }
}

/// Body of `POST /api/heatmap`: a calendar in either upstream form.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapRequest {
    pub submission_calendar: Option<serde_json::Value>,
    pub days: Option<u32>,
    /// Defaults to the current UTC date.
    pub today: Option<chrono::NaiveDate>,
}

fn window_days(days: Option<u32>) -> u32 {
    days.unwrap_or(DEFAULT_WINDOW_DAYS).clamp(1, MAX_WINDOW_DAYS)
}

/// GET /api/stats/heatmap?days=365 - Contribution grid for the trailing window.
pub async fn get_heatmap(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HeatmapQuery>,
    headers: HeaderMap,
) -> Response {
    let days = window_days(query.days);

    let outcome = state.cache.get().await;
    match outcome.snapshot() {
        Some(snapshot) => {
            let today = chrono::Utc::now().date_naive();
            let heatmap = bucketize(&snapshot.calendar.submission_calendar, today, days);
            json_response(&outcome, &heatmap, &headers)
        }
        None => error_response(&outcome),
    }
}

/// POST /api/heatmap - Buckets a caller-supplied calendar.
///
/// Malformed calendars render as an empty grid rather than an error.
pub async fn post_heatmap(Json(request): Json<HeatmapRequest>) -> Json<crate::store::Heatmap> {
    let calendar = SubmissionCalendar::from_value_lenient(request.submission_calendar.as_ref());
    let today = request
        .today
        .unwrap_or_else(|| chrono::Utc::now().date_naive());
    Json(bucketize(&calendar, today, window_days(request.days)))
}

/// GET /api/stats/monthly - Submissions per month for the trend chart.
pub async fn get_monthly(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let outcome = state.cache.get().await;
    match outcome.snapshot() {
        Some(snapshot) => json_response(
            &outcome,
            &monthly_totals(&snapshot.calendar.submission_calendar),
            &headers,
        ),
        None => error_response(&outcome),
    }
}

/// Serializes `body`, tags it with an ETag and the cache status, and
/// answers 304 when the client already holds the same bytes.
fn json_response<T: Serialize>(outcome: &StatsOutcome, body: &T, headers: &HeaderMap) -> Response {
    let bytes = match serde_json::to_vec(body) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(?e, "Failed to serialize stats response");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to encode response".to_string(),
                }),
            )
                .into_response();
        }
    };

    let etag = etag_for(&bytes);
    let cache_status = HeaderValue::from_static(outcome.label());

    if if_none_match(headers, &etag) {
        return (
            StatusCode::NOT_MODIFIED,
            [
                (header::ETAG, etag),
                (header::HeaderName::from_static(CACHE_STATUS_HEADER), cache_status),
            ],
        )
            .into_response();
    }

    (
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            ),
            (header::ETAG, etag),
            (header::HeaderName::from_static(CACHE_STATUS_HEADER), cache_status),
        ],
        bytes,
    )
        .into_response()
}

fn error_response(outcome: &StatsOutcome) -> Response {
    if let StatsOutcome::Failed(e) = outcome {
        tracing::error!(error = %e, "Serving stats error response");
    }
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Failed to fetch LeetCode data".to_string(),
        }),
    )
        .into_response()
}

/// Strong ETag: quoted hex SHA-256 of the body.
fn etag_for(bytes: &[u8]) -> HeaderValue {
    let digest = hex::encode(Sha256::digest(bytes));
    // Hex digits and quotes are always valid header bytes
    HeaderValue::from_str(&format!("\"{}\"", digest))
        .unwrap_or_else(|_| HeaderValue::from_static("\"\""))
}

fn if_none_match(headers: &HeaderMap, etag: &HeaderValue) -> bool {
    let Some(value) = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    let Ok(etag) = etag.to_str() else {
        return false;
    };
    value
        .split(',')
        .map(|tag| tag.trim().trim_start_matches("W/"))
        .any(|tag| tag == "*" || tag == etag)
}
