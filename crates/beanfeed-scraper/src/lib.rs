pub mod aggregate;
pub mod batch;
pub mod client;
pub mod error;
pub mod extract;
pub mod normalize;
mod retry;
pub mod source;
pub mod types;

pub use aggregate::{AggregateReport, Aggregator};
pub use batch::BatchScheduler;
pub use client::ShopifyClient;
pub use error::{AggregateError, ScraperError};
pub use extract::{ExtractedAttributes, Extractor, ProductText};
pub use normalize::normalize_product;
pub use source::{BeanSource, ShopifySource};
pub use types::{ShopifyProduct, ShopifyProductsResponse, ShopifyVariant};
