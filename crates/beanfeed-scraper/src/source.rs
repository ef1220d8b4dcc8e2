//! Per-source fetching: one collection feed in, canonical beans out.

use std::future::Future;

use beanfeed_core::CanonicalBean;

use crate::client::ShopifyClient;
use crate::error::ScraperError;
use crate::extract::Extractor;
use crate::normalize::normalize_product;

/// Something that can turn one merchant collection into beans.
///
/// The aggregator only sees this trait, so tests can substitute canned or
/// failing sources without a network.
pub trait BeanSource: Send + Sync {
    /// Fetches and normalizes every usable product in a collection.
    ///
    /// # Errors
    ///
    /// Implementations may fail; the batch scheduler turns a failure into an
    /// empty slot for that task.
    fn fetch_beans(
        &self,
        merchant: &str,
        collection_url: &str,
    ) -> impl Future<Output = Result<Vec<CanonicalBean>, ScraperError>> + Send;
}

/// [`BeanSource`] backed by the public `products.json` feed.
///
/// Never returns an error: every fetch failure is logged and degrades to an
/// empty list for that collection.
pub struct ShopifySource {
    client: ShopifyClient,
    extractor: Extractor,
}

impl ShopifySource {
    #[must_use]
    pub fn new(client: ShopifyClient, extractor: Extractor) -> Self {
        Self { client, extractor }
    }

    #[must_use]
    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }
}

impl BeanSource for ShopifySource {
    async fn fetch_beans(
        &self,
        merchant: &str,
        collection_url: &str,
    ) -> Result<Vec<CanonicalBean>, ScraperError> {
        let products = match self.client.fetch_products(collection_url).await {
            Ok(products) => products,
            Err(e) => {
                tracing::warn!(
                    merchant,
                    url = collection_url,
                    retriable = e.is_retriable(),
                    error = %e,
                    "source fetch failed; contributing zero beans"
                );
                return Ok(Vec::new());
            }
        };

        let mut beans = Vec::with_capacity(products.len());
        for product in &products {
            match normalize_product(product, merchant, collection_url, &self.extractor) {
                Ok(bean) => beans.push(bean),
                Err(e) => {
                    tracing::debug!(merchant, error = %e, "dropping unusable product");
                }
            }
        }

        tracing::debug!(
            merchant,
            url = collection_url,
            products = products.len(),
            beans = beans.len(),
            "collection fetched"
        );
        Ok(beans)
    }
}
