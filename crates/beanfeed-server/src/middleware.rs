//! Request-scoped middleware: request ids and a global rate limit.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::{ApiError, ErrorCode};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Caller-supplied ids longer than this are replaced with a generated one.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Id for the current request, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Fixed-window request counter shared by every route it is layered on.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    current: Arc<Mutex<(Instant, usize)>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            current: Arc::new(Mutex::new((Instant::now(), 0))),
        }
    }

    /// Counts one request against the current window.
    ///
    /// Returns the time left in the window when the budget is spent.
    pub async fn try_acquire(&self) -> Result<(), Duration> {
        let mut current = self.current.lock().await;
        let (started_at, count) = &mut *current;

        let elapsed = started_at.elapsed();
        if elapsed >= self.window {
            *started_at = Instant::now();
            *count = 0;
        }

        if *count >= self.max_requests {
            return Err(self.window.saturating_sub(started_at.elapsed()));
        }
        *count += 1;
        Ok(())
    }
}

fn incoming_request_id(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    (!raw.is_empty() && raw.len() <= MAX_REQUEST_ID_LEN).then(|| raw.to_owned())
}

/// Tags the request with an id and echoes it on the response.
///
/// A usable `x-request-id` header is reused; otherwise a v4 UUID is minted.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = incoming_request_id(req.headers()).unwrap_or_else(|| Uuid::new_v4().to_string());
    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

/// Rejects requests over the window budget with 429 and `Retry-After`.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let Err(retry_after) = rate_limit.try_acquire().await else {
        return next.run(req).await;
    };

    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    let retry_secs = retry_after.as_secs().max(1);
    tracing::warn!(request_id = %request_id, retry_secs, "rate limit exceeded");

    let mut res = ApiError::new(request_id, ErrorCode::RateLimited, "too many requests")
        .into_response();
    res.headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_secs));
    res
}
