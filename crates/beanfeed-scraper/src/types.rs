//! Shopify response types for the public collection `products.json` feed.
//!
//! ## Observed shape from roaster storefronts
//!
//! ### `id`
//! Numeric on every stock storefront, but some proxies and headless themes
//! re-serialize it as a string. Both are accepted and stored as a string.
//! A `null` or blank product id fails the product: it would collapse every
//! such product onto one catalog id.
//!
//! ### Tags
//! The JSON feed returns an array of strings. Older themes and some apps
//! expose the Liquid form instead, a single comma-separated string. Both are
//! accepted; `null` becomes an empty list.
//!
//! ### `price` on variants
//! A decimal string (`"450.00"`). A bare number is accepted as well. The value
//! is kept as text here and parsed during normalization, where a bad value
//! leaves the bean without a price instead of failing the product.
//!
//! ### `available` on variants
//! Boolean; may be absent on older stores. Defaults to `true`.
//!
//! ### `published_at` / `created_at`
//! RFC 3339 strings with an offset. Used for the new-arrivals bucket.

use serde::{de, Deserialize, Deserializer};

/// Top-level response from `GET <collection>/products.json`.
///
/// Products are kept as raw JSON values so one malformed product does not
/// reject the whole page; see [`crate::client::parse_products_page`].
#[derive(Debug, Deserialize)]
pub struct ShopifyProductsResponse {
    pub products: Vec<serde_json::Value>,
}

/// A single product from a Shopify collection feed.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyProduct {
    #[serde(deserialize_with = "product_id")]
    pub id: String,

    pub title: String,

    /// URL slug for the product page (e.g., `"attikan-estate"`).
    #[serde(default)]
    pub handle: String,

    /// Raw HTML product description. May be `null` or absent.
    #[serde(default)]
    pub body_html: Option<String>,

    #[serde(default, deserialize_with = "tag_list")]
    pub tags: Vec<String>,

    #[serde(default)]
    pub images: Vec<ShopifyImage>,

    #[serde(default)]
    pub variants: Vec<ShopifyVariant>,

    #[serde(default)]
    pub published_at: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,
}

/// A single purchasable variant of a [`ShopifyProduct`].
#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyVariant {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,

    /// Size/grind label such as `"250g / Whole Bean"` or `"Default Title"`.
    #[serde(default)]
    pub title: String,

    #[serde(default, deserialize_with = "string_or_number")]
    pub price: String,

    #[serde(default = "default_available")]
    pub available: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyImage {
    pub src: String,
}

fn default_available() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Int(i64),
    Float(f64),
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<StringOrNumber>::deserialize(deserializer)? {
        Some(StringOrNumber::String(s)) => s,
        Some(StringOrNumber::Int(n)) => n.to_string(),
        Some(StringOrNumber::Float(f)) => f.to_string(),
        None => String::new(),
    })
}

fn product_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let id = string_or_number(deserializer)?;
    let id = id.trim();
    if id.is_empty() {
        return Err(de::Error::custom("product id is null or empty"));
    }
    Ok(id.to_owned())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TagsRepr {
    List(Vec<String>),
    Delimited(String),
}

fn tag_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let tags = match Option::<TagsRepr>::deserialize(deserializer)? {
        Some(TagsRepr::List(list)) => list,
        Some(TagsRepr::Delimited(s)) => s.split(',').map(str::to_owned).collect(),
        None => Vec::new(),
    };
    Ok(tags
        .into_iter()
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn product_accepts_numeric_and_string_ids() {
        let numeric: ShopifyProduct =
            serde_json::from_value(json!({"id": 6_789_012_345_678_i64, "title": "A"})).unwrap();
        assert_eq!(numeric.id, "6789012345678");

        let text: ShopifyProduct =
            serde_json::from_value(json!({"id": "abc-1", "title": "A"})).unwrap();
        assert_eq!(text.id, "abc-1");
    }

    #[test]
    fn product_rejects_null_or_blank_id() {
        for id in [json!(null), json!(""), json!("  ")] {
            let result = serde_json::from_value::<ShopifyProduct>(json!({"id": id, "title": "A"}));
            assert!(result.is_err(), "id {id} should be rejected");
        }
    }

    #[test]
    fn tags_accept_list_string_and_null() {
        let list: ShopifyProduct = serde_json::from_value(
            json!({"id": 1, "title": "A", "tags": ["light", " floral "]}),
        )
        .unwrap();
        assert_eq!(list.tags, vec!["light", "floral"]);

        let delimited: ShopifyProduct = serde_json::from_value(
            json!({"id": 1, "title": "A", "tags": "washed, chikmagalur,,"}),
        )
        .unwrap();
        assert_eq!(delimited.tags, vec!["washed", "chikmagalur"]);

        let null: ShopifyProduct =
            serde_json::from_value(json!({"id": 1, "title": "A", "tags": null})).unwrap();
        assert!(null.tags.is_empty());
    }

    #[test]
    fn variant_price_accepts_number() {
        let variant: ShopifyVariant =
            serde_json::from_value(json!({"id": 5, "title": "250g", "price": 450})).unwrap();
        assert_eq!(variant.price, "450");
        assert!(variant.available, "available defaults to true");
    }

    #[test]
    fn missing_optional_fields_default() {
        let product: ShopifyProduct =
            serde_json::from_value(json!({"id": 1, "title": "A"})).unwrap();
        assert!(product.handle.is_empty());
        assert!(product.body_html.is_none());
        assert!(product.images.is_empty());
        assert!(product.variants.is_empty());
        assert!(product.published_at.is_none());
    }
}
