//! HTTP client for a collection's public `products.json` feed.

use std::time::Duration;

use beanfeed_core::AppConfig;
use reqwest::Client;

use crate::error::ScraperError;
use crate::retry::retry_with_backoff;
use crate::types::{ShopifyProduct, ShopifyProductsResponse};

/// Largest page size the upstream platform honours.
pub const MAX_PAGE_LIMIT: u32 = 250;

/// HTTP client for one collection feed per call.
///
/// Each attempt runs under its own deadline; an expired deadline drops the
/// in-flight request and surfaces as [`ScraperError::Timeout`]. Transient
/// failures (timeouts, network errors, 5xx) are retried with exponential
/// backoff up to `max_retries` additional attempts.
pub struct ShopifyClient {
    client: Client,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay in milliseconds: `backoff_base_ms * 2^attempt`.
    backoff_base_ms: u64,
    request_timeout: Duration,
    page_limit: u32,
}

impl ShopifyClient {
    /// Creates a client with the given per-attempt timeout, `User-Agent`, and
    /// retry policy. The page limit starts at [`MAX_PAGE_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        request_timeout: Duration,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_ms,
            request_timeout,
            page_limit: MAX_PAGE_LIMIT,
        })
    }

    /// Builds a client from the fetch settings in [`AppConfig`].
    ///
    /// # Errors
    ///
    /// See [`ShopifyClient::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Ok(Self::new(
            Duration::from_secs(config.fetch_timeout_secs),
            &config.user_agent,
            config.max_retries,
            config.retry_backoff_base_ms,
        )?
        .with_page_limit(config.page_limit))
    }

    /// Overrides the page size, clamped to `1..=MAX_PAGE_LIMIT`.
    #[must_use]
    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit.clamp(1, MAX_PAGE_LIMIT);
        self
    }

    /// Fetches the products listed in one collection feed.
    ///
    /// Products that fail to decode individually are skipped with a warning;
    /// a body whose `products` field is missing or not a list fails the whole
    /// call.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Timeout`]: every attempt exceeded the deadline.
    /// - [`ScraperError::NotFound`]: HTTP 404 (not retried).
    /// - [`ScraperError::UnexpectedStatus`]: any other non-2xx (5xx retried, 4xx not).
    /// - [`ScraperError::Http`]: network or TLS failure after all retries.
    /// - [`ScraperError::Deserialize`]: body is not a products feed (not retried).
    /// - [`ScraperError::InvalidShopUrl`]: the collection URL is not a valid base.
    pub async fn fetch_products(
        &self,
        collection_url: &str,
    ) -> Result<Vec<ShopifyProduct>, ScraperError> {
        let url = Self::products_url(collection_url, self.page_limit)?;

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let outcome = tokio::time::timeout(self.request_timeout, self.fetch_once(&url)).await;
                outcome.unwrap_or_else(|_| Err(self.timeout_error(url)))
            }
        })
        .await
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<ShopifyProduct>, ScraperError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| self.classify_transport(e, url))?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound {
                url: url.to_owned(),
            });
        }

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.classify_transport(e, url))?;
        parse_products_page(&body, url)
    }

    fn classify_transport(&self, err: reqwest::Error, url: &str) -> ScraperError {
        if err.is_timeout() {
            self.timeout_error(url.to_owned())
        } else {
            ScraperError::Http(err)
        }
    }

    fn timeout_error(&self, url: String) -> ScraperError {
        ScraperError::Timeout {
            url,
            timeout_ms: u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Builds the `products.json` URL for a collection base and page size.
    ///
    /// A base that already ends in `/` gets `products.json` appended directly.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidShopUrl`] if the result is not a valid URL.
    fn products_url(collection_url: &str, limit: u32) -> Result<String, ScraperError> {
        let base = collection_url.trim();
        let feed = if base.ends_with('/') {
            format!("{base}products.json")
        } else {
            format!("{base}/products.json")
        };
        let mut url = reqwest::Url::parse(&feed).map_err(|e| ScraperError::InvalidShopUrl {
            shop_url: collection_url.to_owned(),
            reason: format!("\"{feed}\" is not a valid URL: {e}"),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ScraperError::InvalidShopUrl {
                shop_url: collection_url.to_owned(),
                reason: format!("unsupported scheme \"{}\"", url.scheme()),
            });
        }

        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());

        Ok(url.to_string())
    }
}

/// Decodes a feed body into products, skipping products that do not decode.
///
/// # Errors
///
/// Returns [`ScraperError::Deserialize`] when the body is not JSON or its
/// `products` field is missing or not a list.
pub fn parse_products_page(body: &str, url: &str) -> Result<Vec<ShopifyProduct>, ScraperError> {
    let page = serde_json::from_str::<ShopifyProductsResponse>(body).map_err(|e| {
        ScraperError::Deserialize {
            context: format!("products feed from {url}"),
            source: e,
        }
    })?;

    let mut products = Vec::with_capacity(page.products.len());
    for (index, raw) in page.products.into_iter().enumerate() {
        match serde_json::from_value::<ShopifyProduct>(raw) {
            Ok(product) => products.push(product),
            Err(e) => {
                tracing::warn!(url, index, error = %e, "skipping malformed product record");
            }
        }
    }
    Ok(products)
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
