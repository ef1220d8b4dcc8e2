//! Attribute extraction from free-text product copy.
//!
//! Everything here is pure: the same [`ProductText`] always yields the same
//! [`ExtractedAttributes`] for a given [`Vocabulary`].

mod roast;
pub mod text;

use beanfeed_core::{RoastLevel, Vocabulary};

pub use text::{clean_title, parse_weight_grams, strip_html};

/// Raw text fields of one upstream product.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductText<'a> {
    pub title: &'a str,
    pub tags: &'a [String],
    pub body_html: Option<&'a str>,
}

/// Structured fields inferred from a [`ProductText`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedAttributes {
    pub roast_level: Option<RoastLevel>,
    pub process: Option<String>,
    pub origin: Option<String>,
    pub tasting_notes: Vec<String>,
}

/// Heuristic classifier over a fixed [`Vocabulary`].
#[derive(Debug, Clone)]
pub struct Extractor {
    vocabulary: Vocabulary,
    /// Tasting notes plus sensory terms, longest first.
    ignored: Vec<String>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(Vocabulary::default())
    }
}

impl Extractor {
    #[must_use]
    pub fn new(vocabulary: Vocabulary) -> Self {
        let vocabulary = vocabulary.normalized();
        let ignored = ignored_terms(&vocabulary);
        Self {
            vocabulary,
            ignored,
        }
    }

    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    #[must_use]
    pub fn extract(&self, product: &ProductText<'_>) -> ExtractedAttributes {
        let body = product.body_html.map(strip_html).unwrap_or_default();
        let searchable = searchable_text(product.title, product.tags, &body);

        ExtractedAttributes {
            roast_level: roast::classify(&searchable, &body, &self.ignored),
            process: self.process(&searchable),
            origin: self.origin(&searchable),
            tasting_notes: self.tasting_notes(&searchable),
        }
    }

    /// Comma-joined processing methods, e.g. `"Washed, Natural"`.
    ///
    /// A keyword contained in another matched keyword is dropped, so
    /// `semi-washed` does not also report `washed`.
    #[must_use]
    pub fn process(&self, searchable: &str) -> Option<String> {
        let matched: Vec<&str> = self
            .vocabulary
            .process_keywords
            .iter()
            .map(String::as_str)
            .filter(|kw| searchable.contains(kw))
            .collect();

        let kept: Vec<String> = matched
            .iter()
            .filter(|kw| {
                !matched
                    .iter()
                    .any(|other| other != *kw && other.contains(**kw))
            })
            .map(|kw| capitalize(kw))
            .collect();

        (!kept.is_empty()).then(|| kept.join(", "))
    }

    /// First gazetteer entry found in the text, by gazetteer order.
    #[must_use]
    pub fn origin(&self, searchable: &str) -> Option<String> {
        self.vocabulary
            .origins
            .iter()
            .find(|origin| searchable.contains(origin.as_str()))
            .cloned()
    }

    /// Every vocabulary tasting note found in the text, in vocabulary order.
    #[must_use]
    pub fn tasting_notes(&self, searchable: &str) -> Vec<String> {
        self.vocabulary
            .tasting_notes
            .iter()
            .filter(|note| searchable.contains(note.as_str()))
            .cloned()
            .collect()
    }
}

/// Lowercased title, tags and stripped body joined by spaces.
fn searchable_text(title: &str, tags: &[String], body: &str) -> String {
    let mut text = String::with_capacity(title.len() + body.len() + 16 * tags.len());
    text.push_str(title);
    for tag in tags {
        text.push(' ');
        text.push_str(tag);
    }
    text.push(' ');
    text.push_str(body);
    text.to_lowercase()
}

/// Union of tasting notes and sensory terms, sorted longest first so
/// `dark chocolate` is tried before `chocolate`.
pub(crate) fn ignored_terms(vocabulary: &Vocabulary) -> Vec<String> {
    let mut terms: Vec<String> = vocabulary
        .tasting_notes
        .iter()
        .chain(&vocabulary.sensory_terms)
        .map(|t| t.to_lowercase())
        .collect();
    terms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    terms.dedup();
    terms
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn extracts_all_fields_from_product_copy() {
        let extractor = Extractor::default();
        let tags = tags(&["Washed", "Chikmagalur"]);
        let attrs = extractor.extract(&ProductText {
            title: "Attikan Estate",
            tags: &tags,
            body_html: Some("<p>Roast Level: Medium Dark</p><p>Notes of cocoa, fig &amp; jaggery.</p>"),
        });

        assert_eq!(attrs.roast_level, Some(RoastLevel::MediumDark));
        assert_eq!(attrs.process.as_deref(), Some("Washed"));
        assert_eq!(attrs.origin.as_deref(), Some("chikmagalur"));
        assert_eq!(attrs.tasting_notes, vec!["cocoa", "jaggery", "fig"]);
    }

    #[test]
    fn process_drops_contained_keywords() {
        let extractor = Extractor::default();
        assert_eq!(
            extractor.process("semi-washed and natural lots").as_deref(),
            Some("Natural, Semi-washed")
        );
        assert_eq!(extractor.process("no processing info"), None);
    }

    #[test]
    fn origin_is_first_by_gazetteer_order() {
        let extractor = Extractor::default();
        // "yirgacheffe" appears first in the text but "ethiopia" is earlier in
        // the gazetteer.
        assert_eq!(
            extractor.origin("yirgacheffe, ethiopia").as_deref(),
            Some("ethiopia")
        );
        assert_eq!(extractor.origin("house blend"), None);
    }

    #[test]
    fn tasting_notes_follow_vocabulary_order() {
        let extractor = Extractor::default();
        let notes = extractor.tasting_notes("orange, caramel and dark chocolate");
        assert_eq!(
            notes,
            vec!["chocolate", "dark chocolate", "caramel", "orange"]
        );
    }

    #[test]
    fn custom_vocabulary_drives_extraction() {
        let vocabulary = Vocabulary {
            origins: vec!["Kodagu".into()],
            tasting_notes: vec!["Guava".into()],
            ..Vocabulary::default()
        };
        let extractor = Extractor::new(vocabulary);
        let attrs = extractor.extract(&ProductText {
            title: "Kodagu Guava Light",
            ..ProductText::default()
        });
        assert_eq!(attrs.origin.as_deref(), Some("kodagu"));
        assert_eq!(attrs.tasting_notes, vec!["guava"]);
        assert_eq!(attrs.roast_level, Some(RoastLevel::Light));
    }

    #[test]
    fn ignored_terms_sorted_longest_first() {
        let terms = ignored_terms(&Vocabulary::default());
        let dark_choc = terms.iter().position(|t| t == "dark chocolate").unwrap();
        let choc = terms.iter().position(|t| t == "chocolate").unwrap();
        assert!(dark_choc < choc);
        assert!(terms.contains(&"body".to_string()));
    }

    #[test]
    fn capitalize_handles_hyphenated_keyword() {
        assert_eq!(capitalize("barrel aged"), "Barrel aged");
        assert_eq!(capitalize(""), "");
    }
}
