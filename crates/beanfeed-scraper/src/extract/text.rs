//! String helpers shared by the extractor and the record mapper.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid html tag regex"));

static BLOCK_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<\s*/?\s*(?:p|div|br|li|ul|ol|h[1-6]|tr|table|section|article|blockquote|hr)\b[^>]*>",
    )
    .expect("valid html block tag regex")
});

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

static KG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*kgs?\b").expect("valid kg regex"));

static GRAMS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:grams?|gms?|g)\b").expect("valid grams regex")
});

static PARENTHETICAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("valid parenthetical regex"));

static TITLE_WEIGHT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:\d{2,4}\s?g(?:rams?|ms?)?|\d+(?:\.\d+)?\s?kgs?)\b")
        .expect("valid title weight regex")
});

/// Strips HTML tags, decodes the handful of entities roaster copy actually
/// uses, and collapses whitespace. Case is preserved.
///
/// Block-level tags and `<br>` become line breaks, so text from adjacent
/// elements never runs together on one line; inline tags become spaces.
#[must_use]
pub fn strip_html(html: &str) -> String {
    let text = BLOCK_TAG_RE.replace_all(html, "\n");
    let text = TAG_RE.replace_all(&text, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&rsquo;", "'")
        .replace("&ndash;", "–")
        .replace("&lt;", "<")
        .replace("&gt;", ">");
    text.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses a pack weight in grams from free text.
///
/// Kilograms are tried first (`"1.5kg"` → 1500, rounded), then whole grams
/// with a `g`, `gm`, `gms` or `grams` suffix. Zero is treated as absent.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_weight_grams(text: &str) -> Option<u32> {
    if let Some(caps) = KG_RE.captures(text) {
        let kg: f64 = caps[1].parse().ok()?;
        let grams = (kg * 1000.0).round();
        return (grams >= 1.0 && grams <= f64::from(u32::MAX)).then_some(grams as u32);
    }

    let grams: u32 = GRAMS_RE.captures(text)?[1].parse().ok()?;
    (grams > 0).then_some(grams)
}

/// Removes parenthetical asides and pack-weight tokens from a product title.
///
/// Falls back to the trimmed original when cleaning would leave nothing.
#[must_use]
pub fn clean_title(title: &str) -> String {
    let without_parens = PARENTHETICAL_RE.replace_all(title, " ");
    let without_weight = TITLE_WEIGHT_RE.replace_all(&without_parens, " ");
    let cleaned = collapse_whitespace(&without_weight);
    let cleaned = cleaned
        .trim_end_matches(|c: char| matches!(c, '-' | '–' | '|' | ',' | '/') || c.is_whitespace())
        .to_owned();

    if cleaned.is_empty() {
        title.trim().to_owned()
    } else {
        cleaned
    }
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_kilograms_with_decimal() {
        assert_eq!(parse_weight_grams("1.5kg"), Some(1500));
        assert_eq!(parse_weight_grams("1 KG / Whole Bean"), Some(1000));
    }

    #[test]
    fn weight_kilograms_plural_suffix() {
        assert_eq!(parse_weight_grams("1.5 kgs"), Some(1500));
        assert_eq!(parse_weight_grams("1 Kgs / Whole Bean"), Some(1000));
        assert_eq!(clean_title("Monsoon Malabar 2 kgs"), "Monsoon Malabar");
    }

    #[test]
    fn weight_grams_suffixes() {
        assert_eq!(parse_weight_grams("250g"), Some(250));
        assert_eq!(parse_weight_grams("300gms"), Some(300));
        assert_eq!(parse_weight_grams("500gm / French Press"), Some(500));
        assert_eq!(parse_weight_grams("200 grams"), Some(200));
    }

    #[test]
    fn weight_absent_or_zero() {
        assert_eq!(parse_weight_grams("no weight info"), None);
        assert_eq!(parse_weight_grams("Default Title"), None);
        assert_eq!(parse_weight_grams("0g"), None);
        assert_eq!(parse_weight_grams(""), None);
    }

    #[test]
    fn weight_ignores_g_inside_words() {
        assert_eq!(parse_weight_grams("2 grinds"), None);
    }

    #[test]
    fn clean_title_strips_parenthetical_and_weight() {
        assert_eq!(
            clean_title("Ethiopia Yirgacheffe Medium Roast 250g (Whole Bean)"),
            "Ethiopia Yirgacheffe Medium Roast"
        );
        assert_eq!(clean_title("Attikan Estate - 500 gms"), "Attikan Estate");
        assert_eq!(clean_title("Baarbara Estate 1kg"), "Baarbara Estate");
    }

    #[test]
    fn clean_title_falls_back_to_original() {
        assert_eq!(clean_title(" (250g) "), "(250g)");
    }

    #[test]
    fn strip_html_removes_tags_and_entities() {
        let html = "<p>Roast Level:&nbsp;<strong>Dark</strong></p>\n<ul><li>Cocoa &amp; fig</li></ul>";
        assert_eq!(strip_html(html), "Roast Level: Dark\nCocoa & fig");
    }

    #[test]
    fn strip_html_breaks_lines_at_block_boundaries() {
        assert_eq!(
            strip_html("<p>Roast Level: Dark</p><p>Medium body</p>"),
            "Roast Level: Dark\nMedium body"
        );
        assert_eq!(
            strip_html("Roast Level: Light<br/>Medium body"),
            "Roast Level: Light\nMedium body"
        );
        assert_eq!(strip_html("<span>Dark</span><em>roast</em>"), "Dark roast");
    }
}
