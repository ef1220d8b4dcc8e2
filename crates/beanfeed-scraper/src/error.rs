use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid collection URL \"{shop_url}\": {reason}")]
    InvalidShopUrl { shop_url: String, reason: String },

    #[error("normalization error for product {source_product_id}: {reason}")]
    Normalization {
        source_product_id: String,
        reason: String,
    },
}

impl ScraperError {
    /// Returns `true` for transient conditions worth retrying after a backoff.
    ///
    /// **Retriable:** network failures, timeouts, HTTP 5xx.
    ///
    /// **Not retriable:** HTTP 4xx (including 404 and 429), malformed bodies,
    /// invalid URLs, and normalization failures. These are permanent problems
    /// on the source side and a retry would see the same result.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            ScraperError::Http(_) | ScraperError::Timeout { .. } => true,
            ScraperError::UnexpectedStatus { status, .. } => *status >= 500,
            ScraperError::NotFound { .. }
            | ScraperError::Deserialize { .. }
            | ScraperError::InvalidShopUrl { .. }
            | ScraperError::Normalization { .. } => false,
        }
    }
}

/// Failure of a whole aggregation run.
///
/// Per-source failures never surface here; they degrade to zero beans.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("aggregation cancelled after {completed_batches} of {total_batches} batches")]
    Cancelled {
        completed_batches: usize,
        total_batches: usize,
    },
}
