//! Catalog endpoints.

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use beanfeed_core::CanonicalBean;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ApiError, AppState, ErrorCode};
use crate::cache::{CatalogError, CatalogView};
use crate::middleware::RequestId;

/// Beans published within this many days count as new arrivals.
const NEW_ARRIVAL_WINDOW_DAYS: i64 = 7;

/// Shared caches may keep a response this long past its `s-maxage`.
const STALE_WHILE_REVALIDATE_SECS: u64 = 86_400;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CatalogResponse<'a> {
    data: &'a [CanonicalBean],
    cached: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stale: bool,
    last_update: DateTime<Utc>,
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RefreshResponse {
    success: bool,
    count: usize,
    /// Milliseconds the aggregation took.
    fetch_time: u64,
    last_update: DateTime<Utc>,
}

pub(super) async fn get_beans(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Response {
    match state.catalog.get_catalog().await {
        Ok(view) => catalog_response(&state, &view, &view.beans),
        Err(e) => refresh_error(req_id.0, &e),
    }
}

pub(super) async fn get_new_arrivals(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Response {
    match state.catalog.get_catalog().await {
        Ok(view) => {
            let now = Utc::now();
            let window = chrono::Duration::days(NEW_ARRIVAL_WINDOW_DAYS);
            let arrivals: Vec<CanonicalBean> = view
                .beans
                .iter()
                .filter(|bean| bean.is_new_arrival(now, window))
                .cloned()
                .collect();
            catalog_response(&state, &view, &arrivals)
        }
        Err(e) => refresh_error(req_id.0, &e),
    }
}

pub(super) async fn refresh_beans(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Response {
    match state.catalog.force_refresh().await {
        Ok(summary) => {
            tracing::info!(
                request_id = %req_id.0,
                count = summary.count,
                successful = summary.success_count,
                failed = summary.failure_count,
                "manual catalog refresh complete"
            );
            Json(RefreshResponse {
                success: true,
                count: summary.count,
                fetch_time: u64::try_from(summary.fetch_time.as_millis()).unwrap_or(u64::MAX),
                last_update: summary.last_update,
            })
            .into_response()
        }
        Err(e) => refresh_error(req_id.0, &e),
    }
}

fn catalog_response(state: &AppState, view: &CatalogView, beans: &[CanonicalBean]) -> Response {
    let body = CatalogResponse {
        data: beans,
        cached: view.cached,
        stale: view.stale,
        last_update: view.last_update,
        count: beans.len(),
        warning: view.warning.as_deref(),
    };

    let mut response = (StatusCode::OK, Json(body)).into_response();
    let cache_control = format!(
        "public, s-maxage={}, stale-while-revalidate={STALE_WHILE_REVALIDATE_SECS}",
        state.catalog.cache().freshness().as_secs()
    );
    if let Ok(value) = HeaderValue::from_str(&cache_control) {
        response.headers_mut().insert(header::CACHE_CONTROL, value);
    }
    response
}

fn refresh_error(request_id: String, error: &CatalogError) -> Response {
    tracing::error!(request_id = %request_id, error = %error, "catalog unavailable");
    ApiError::new(
        request_id,
        ErrorCode::RefreshFailed,
        format!("failed to fetch coffee catalog: {error}"),
    )
    .into_response()
}
