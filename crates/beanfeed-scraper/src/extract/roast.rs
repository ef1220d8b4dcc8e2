//! Roast level classification.
//!
//! Stages run in priority order and the first one that decides wins:
//!
//! 1. An explicit `Roast Level: <value>` / `Roast Profile - <value>` label in
//!    the description. The value ends at the line break; a compound value
//!    whose second word is followed by a sensory term keeps only its first.
//! 2. Compound phrases (`medium-light`, `light to medium`, `medium dark`) and
//!    named dark roasts (`vienna roast`, `french roast`, ...).
//! 3. `<word> roast` phrasing, only when exactly one of light/medium/dark is
//!    named that way (`city roast` counts as medium).
//! 4. Bare `light` / `medium` / `dark` words, skipping any immediately
//!    followed by a tasting or sensory term (`dark chocolate`, `medium body`).
//!    Light with medium is Medium Light, medium with dark is Medium Dark, a
//!    single word wins, light with dark decides nothing.
//! 5. Whole-word `filter`, `espresso`, `omni`.

use std::sync::LazyLock;

use beanfeed_core::RoastLevel;
use regex::Regex;

/// Joins the two words of a labelled compound roast. Stays on one line so a
/// label value never picks up words from the next element.
const LABEL_JOINER: &str = r"(?:[ \t]*[-–][ \t]*|[ \t]+(?:to[ \t]+)?)";

static OVERRIDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    let j = LABEL_JOINER;
    Regex::new(&format!(
        r"(?i)\broast[ \t]*(?:level|profile)[ \t]*[:\-–—]*[ \t]*(medium{j}light|light{j}medium|medium{j}dark|dark{j}medium|light|medium|dark|filter|espresso|omni)\b"
    ))
    .expect("valid roast override regex")
});

static MEDIUM_LIGHT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:medium[\s\-–]*(?:to\s+)?light|light[\s\-–]*(?:to\s+)?medium)\b")
        .expect("valid medium-light regex")
});

static MEDIUM_DARK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:medium[\s\-–]*(?:to\s+)?dark|dark[\s\-–]*(?:to\s+)?medium)\b")
        .expect("valid medium-dark regex")
});

static NAMED_DARK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:vienna|viennese|french|italian)[\s\-]+roast").expect("valid named roast regex")
});

static ROAST_PHRASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(light|medium|dark|city)[\s\-]+roast(?:ed)?\b").expect("valid roast phrase regex")
});

static ROAST_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(light|medium|dark)\b").expect("valid roast word regex"));

static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(filter|espresso|omni)\b").expect("valid roast style regex"));

/// Classifies the roast level.
///
/// `searchable` is the lowercased title, tags and tag-stripped body;
/// `body` is the tag-stripped body with case preserved. `ignored` lists terms
/// that cancel a bare roast word when they follow it, longest first.
pub(crate) fn classify(searchable: &str, body: &str, ignored: &[String]) -> Option<RoastLevel> {
    explicit_override(body, ignored)
        .or_else(|| compound(searchable, ignored))
        .or_else(|| roast_phrase(searchable))
        .or_else(|| roast_words(searchable, ignored))
        .or_else(|| roast_style(searchable))
}

fn explicit_override(body: &str, ignored: &[String]) -> Option<RoastLevel> {
    let label = OVERRIDE_RE.captures(body)?.get(1)?;
    let level = parse_label(label.as_str())?;

    // "Roast Level: Dark Medium body": the second word belongs to the copy.
    let compound = matches!(level, RoastLevel::MediumLight | RoastLevel::MediumDark);
    let same_line = body[label.end()..].lines().next().unwrap_or_default();
    if compound && followed_by_ignored(&same_line.to_lowercase(), ignored) {
        let first = label
            .as_str()
            .split(|c: char| c.is_whitespace() || c == '-' || c == '–')
            .next()?;
        return parse_label(first);
    }
    Some(level)
}

/// Maps a roast label in any hyphen, space or case variant to a level.
fn parse_label(label: &str) -> Option<RoastLevel> {
    let label = label.to_lowercase();
    let light = label.contains("light");
    let medium = label.contains("medium");
    let dark = label.contains("dark");
    match (light, medium, dark) {
        (true, true, _) => Some(RoastLevel::MediumLight),
        (_, true, true) => Some(RoastLevel::MediumDark),
        (true, false, false) => Some(RoastLevel::Light),
        (false, true, false) => Some(RoastLevel::Medium),
        (false, false, true) => Some(RoastLevel::Dark),
        _ => match label.trim() {
            "filter" => Some(RoastLevel::Filter),
            "espresso" => Some(RoastLevel::Espresso),
            "omni" => Some(RoastLevel::Omni),
            _ => None,
        },
    }
}

fn compound(searchable: &str, ignored: &[String]) -> Option<RoastLevel> {
    if first_unsuppressed(&MEDIUM_LIGHT_RE, searchable, ignored) {
        return Some(RoastLevel::MediumLight);
    }
    if first_unsuppressed(&MEDIUM_DARK_RE, searchable, ignored) {
        return Some(RoastLevel::MediumDark);
    }
    NAMED_DARK_RE
        .is_match(searchable)
        .then_some(RoastLevel::Dark)
}

fn roast_phrase(searchable: &str) -> Option<RoastLevel> {
    let mut found: Option<RoastLevel> = None;
    for caps in ROAST_PHRASE_RE.captures_iter(searchable) {
        let level = match &caps[1] {
            "light" => RoastLevel::Light,
            "dark" => RoastLevel::Dark,
            _ => RoastLevel::Medium,
        };
        match found {
            None => found = Some(level),
            Some(prev) if prev == level => {}
            Some(_) => return None,
        }
    }
    found
}

fn roast_words(searchable: &str, ignored: &[String]) -> Option<RoastLevel> {
    let (mut light, mut medium, mut dark) = (false, false, false);
    for m in ROAST_WORD_RE.find_iter(searchable) {
        if followed_by_ignored(&searchable[m.end()..], ignored) {
            continue;
        }
        match m.as_str() {
            "light" => light = true,
            "medium" => medium = true,
            _ => dark = true,
        }
    }

    match (light, medium, dark) {
        (true, true, false) => Some(RoastLevel::MediumLight),
        (_, true, true) => Some(RoastLevel::MediumDark),
        (true, false, false) => Some(RoastLevel::Light),
        (false, true, false) => Some(RoastLevel::Medium),
        (false, false, true) => Some(RoastLevel::Dark),
        _ => None,
    }
}

fn roast_style(searchable: &str) -> Option<RoastLevel> {
    let caps = STYLE_RE.captures(searchable)?;
    match &caps[1] {
        "filter" => Some(RoastLevel::Filter),
        "espresso" => Some(RoastLevel::Espresso),
        _ => Some(RoastLevel::Omni),
    }
}

fn first_unsuppressed(re: &Regex, text: &str, ignored: &[String]) -> bool {
    re.find_iter(text)
        .any(|m| !followed_by_ignored(&text[m.end()..], ignored))
}

/// Returns `true` when `rest`, after separators, starts with a whole ignored
/// term. Stands in for a negative lookahead, which `regex` does not support.
fn followed_by_ignored(rest: &str, ignored: &[String]) -> bool {
    let rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '-' || c == '–');
    ignored.iter().any(|term| {
        rest.strip_prefix(term.as_str()).is_some_and(|after| {
            !after
                .chars()
                .next()
                .is_some_and(char::is_alphanumeric)
        })
    })
}

#[cfg(test)]
#[path = "roast_test.rs"]
mod tests;
