//! Mapping from raw feed products to [`beanfeed_core::CanonicalBean`].
//!
//! Free-text inference is delegated to [`crate::extract`]; this module
//! handles structural conversion and the fields read straight off the record.

use std::str::FromStr;

use beanfeed_core::CanonicalBean;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::ScraperError;
use crate::extract::{clean_title, parse_weight_grams, Extractor, ProductText};
use crate::types::ShopifyProduct;

/// Normalizes a raw [`ShopifyProduct`] into a [`CanonicalBean`].
///
/// Price, stock and weight come from the first variant. Weight falls back to
/// the product title when the variant title carries none.
///
/// # Errors
///
/// Returns [`ScraperError::Normalization`] if the product has no variants.
pub fn normalize_product(
    product: &ShopifyProduct,
    merchant: &str,
    collection_url: &str,
    extractor: &Extractor,
) -> Result<CanonicalBean, ScraperError> {
    let Some(variant) = product.variants.first() else {
        return Err(ScraperError::Normalization {
            source_product_id: product.id.clone(),
            reason: "product has no variants".into(),
        });
    };

    let attrs = extractor.extract(&ProductText {
        title: &product.title,
        tags: &product.tags,
        body_html: product.body_html.as_deref(),
    });

    let price = match Decimal::from_str(variant.price.trim()) {
        Ok(price) => Some(price),
        Err(e) => {
            tracing::debug!(
                merchant,
                product_id = %product.id,
                price = %variant.price,
                error = %e,
                "unparseable variant price; leaving price empty"
            );
            None
        }
    };

    let weight_grams =
        parse_weight_grams(&variant.title).or_else(|| parse_weight_grams(&product.title));

    let url = format!(
        "{}/products/{}",
        collection_url.trim_end_matches('/'),
        product.handle
    );

    let fetch_date = product
        .published_at
        .as_deref()
        .and_then(parse_timestamp)
        .or_else(|| product.created_at.as_deref().and_then(parse_timestamp));

    Ok(CanonicalBean {
        id: CanonicalBean::make_id(merchant, &product.id),
        name: clean_title(&product.title),
        merchant: merchant.to_owned(),
        price,
        weight_grams,
        roast_level: attrs.roast_level,
        origin: attrs.origin,
        process: attrs.process,
        tasting_notes: attrs.tasting_notes,
        image: product.images.first().map(|image| image.src.clone()),
        url,
        in_stock: variant.available,
        fetch_date,
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
