use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Roast classification inferred from product copy.
///
/// Serialized as the human-readable label (`"Medium Light"`), which is also
/// what the browsing frontend filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoastLevel {
    #[serde(rename = "Light")]
    Light,
    #[serde(rename = "Medium Light")]
    MediumLight,
    #[serde(rename = "Medium")]
    Medium,
    #[serde(rename = "Medium Dark")]
    MediumDark,
    #[serde(rename = "Dark")]
    Dark,
    #[serde(rename = "Filter")]
    Filter,
    #[serde(rename = "Espresso")]
    Espresso,
    #[serde(rename = "Omni")]
    Omni,
}

impl RoastLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RoastLevel::Light => "Light",
            RoastLevel::MediumLight => "Medium Light",
            RoastLevel::Medium => "Medium",
            RoastLevel::MediumDark => "Medium Dark",
            RoastLevel::Dark => "Dark",
            RoastLevel::Filter => "Filter",
            RoastLevel::Espresso => "Espresso",
            RoastLevel::Omni => "Omni",
        }
    }
}

impl std::fmt::Display for RoastLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One coffee product from one merchant, normalized for the unified catalog.
///
/// Every field is derived from the upstream record plus the merchant and
/// collection it was fetched from; no field depends on any other bean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalBean {
    /// `<merchant>-<source product id>`, the catalog-wide dedup key.
    pub id: String,
    /// Display title with parenthetical asides and weight tokens removed.
    pub name: String,
    pub merchant: String,
    /// Price of the first variant. `None` when the upstream price string does
    /// not parse as a decimal.
    #[serde(with = "rust_decimal::serde::float_option", default)]
    pub price: Option<Decimal>,
    pub weight_grams: Option<u32>,
    pub roast_level: Option<RoastLevel>,
    pub origin: Option<String>,
    /// Comma-joined processing methods, e.g. `"Washed, Natural"`.
    pub process: Option<String>,
    pub tasting_notes: Vec<String>,
    pub image: Option<String>,
    /// `<collection url>/products/<handle>`.
    pub url: String,
    pub in_stock: bool,
    /// Upstream publish date (falls back to the creation date).
    pub fetch_date: Option<DateTime<Utc>>,
}

impl CanonicalBean {
    /// Builds the catalog id for a merchant's product.
    #[must_use]
    pub fn make_id(merchant: &str, source_id: &str) -> String {
        format!("{merchant}-{source_id}")
    }

    /// Returns `true` when the bean was published within `window` of `now`.
    ///
    /// Beans without a publish date are never new arrivals.
    #[must_use]
    pub fn is_new_arrival(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.fetch_date
            .is_some_and(|published| published <= now && now - published <= window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_bean(fetch_date: Option<DateTime<Utc>>) -> CanonicalBean {
        CanonicalBean {
            id: CanonicalBean::make_id("Blue Tokai", "42"),
            name: "Attikan Estate".to_string(),
            merchant: "Blue Tokai".to_string(),
            price: Some(Decimal::new(45_000, 2)),
            weight_grams: Some(250),
            roast_level: Some(RoastLevel::MediumDark),
            origin: Some("chikmagalur".to_string()),
            process: Some("Washed".to_string()),
            tasting_notes: vec!["chocolate".to_string()],
            image: None,
            url: "https://bluetokaicoffee.com/collections/coffee/products/attikan".to_string(),
            in_stock: true,
            fetch_date,
        }
    }

    #[test]
    fn make_id_joins_merchant_and_source_id() {
        assert_eq!(CanonicalBean::make_id("Subko", "987"), "Subko-987");
    }

    #[test]
    fn roast_level_serializes_as_label() {
        let json = serde_json::to_string(&RoastLevel::MediumLight).expect("serialize");
        assert_eq!(json, "\"Medium Light\"");
        assert_eq!(RoastLevel::MediumDark.to_string(), "Medium Dark");
    }

    #[test]
    fn bean_serializes_camel_case_with_numeric_price() {
        let bean = make_bean(None);
        let value = serde_json::to_value(&bean).expect("serialize");
        assert_eq!(value["weightGrams"], 250);
        assert_eq!(value["roastLevel"], "Medium Dark");
        assert_eq!(value["inStock"], true);
        assert!((value["price"].as_f64().unwrap() - 450.0).abs() < f64::EPSILON);
        assert!(value["fetchDate"].is_null());
    }

    #[test]
    fn bean_with_unparseable_price_serializes_null() {
        let mut bean = make_bean(None);
        bean.price = None;
        let value = serde_json::to_value(&bean).expect("serialize");
        assert!(value["price"].is_null());
    }

    #[test]
    fn is_new_arrival_within_window() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let bean = make_bean(Some(now - Duration::days(2)));
        assert!(bean.is_new_arrival(now, Duration::days(7)));
    }

    #[test]
    fn is_new_arrival_outside_window_or_undated() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        assert!(!make_bean(Some(now - Duration::days(9))).is_new_arrival(now, Duration::days(7)));
        assert!(!make_bean(None).is_new_arrival(now, Duration::days(7)));
    }
}
