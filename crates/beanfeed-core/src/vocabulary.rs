//! Word lists that drive attribute extraction.
//!
//! The built-in lists cover Indian specialty roasters and the most common
//! international origins. A YAML file can override any subset of the lists;
//! omitted lists keep their built-in values.
//!
//! List order is significant:
//! - `tasting_notes` is the output order of matched notes.
//! - `origins` is first-match-wins.
//! - `process_keywords` is the output order of matched processes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const TASTING_NOTES: &[&str] = &[
    "chocolate",
    "dark chocolate",
    "milk chocolate",
    "cocoa",
    "caramel",
    "toffee",
    "jaggery",
    "brown sugar",
    "molasses",
    "vanilla",
    "nutty",
    "hazelnut",
    "almond",
    "walnut",
    "peanut",
    "citrus",
    "orange",
    "lemon",
    "grapefruit",
    "berry",
    "blueberry",
    "strawberry",
    "raspberry",
    "cherry",
    "green apple",
    "peach",
    "apricot",
    "plum",
    "mango",
    "pineapple",
    "tropical",
    "stone fruit",
    "fig",
    "raisin",
    "floral",
    "jasmine",
    "hibiscus",
    "bergamot",
    "black tea",
    "cinnamon",
    "cardamom",
    "clove",
    "spice",
    "wine",
    "tobacco",
    "earthy",
    "malt",
];

const PROCESS_KEYWORDS: &[&str] = &[
    "washed",
    "natural",
    "anaerobic",
    "carbonic",
    "honey",
    "dry",
    "semi-washed",
    "experimental",
    "barrel aged",
    "fermentation",
    "yeast",
    "koji",
];

const ORIGINS: &[&str] = &[
    "chikmagalur",
    "coorg",
    "araku",
    "baba budan",
    "bababudan",
    "wayanad",
    "nilgiris",
    "biligiri",
    "sakleshpur",
    "shevaroy",
    "yercaud",
    "ethiopia",
    "yirgacheffe",
    "kenya",
    "colombia",
    "brazil",
    "guatemala",
    "sumatra",
];

/// Sensory words that commonly follow "light", "medium" or "dark" without
/// describing the roast ("medium body", "light acidity").
const SENSORY_TERMS: &[&str] = &[
    "acidity",
    "acidic",
    "body",
    "bodied",
    "mouthfeel",
    "finish",
    "aftertaste",
    "aroma",
    "aromatic",
    "sweetness",
    "sweet",
    "bitterness",
    "notes",
    "note",
    "flavour",
    "flavours",
    "flavor",
    "flavors",
    "tones",
    "undertones",
    "fruit",
    "fruity",
    "cup",
    "clarity",
    "intensity",
    "crema",
    "texture",
    "crisp",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub tasting_notes: Vec<String>,
    pub process_keywords: Vec<String>,
    pub origins: Vec<String>,
    pub sensory_terms: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            tasting_notes: owned(TASTING_NOTES),
            process_keywords: owned(PROCESS_KEYWORDS),
            origins: owned(ORIGINS),
            sensory_terms: owned(SENSORY_TERMS),
        }
    }
}

impl Vocabulary {
    /// Lowercases and trims every entry and drops blanks, keeping order.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            tasting_notes: normalize_list(self.tasting_notes),
            process_keywords: normalize_list(self.process_keywords),
            origins: normalize_list(self.origins),
            sensory_terms: normalize_list(self.sensory_terms),
        }
    }

    /// Ensures no list is empty.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first empty list.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let lists = [
            ("tasting_notes", &self.tasting_notes),
            ("process_keywords", &self.process_keywords),
            ("origins", &self.origins),
            ("sensory_terms", &self.sensory_terms),
        ];
        for (name, list) in lists {
            if list.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "vocabulary list '{name}' must not be empty"
                )));
            }
        }
        Ok(())
    }
}

/// Load a vocabulary override file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or leaves a list
/// empty after normalization.
pub fn load_vocabulary(path: &Path) -> Result<Vocabulary, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let vocabulary: Vocabulary =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::FileParse {
            path: path.display().to_string(),
            source: e,
        })?;

    let vocabulary = vocabulary.normalized();
    vocabulary.validate()?;
    Ok(vocabulary)
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

fn normalize_list(list: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(list.len());
    for entry in list {
        let entry = entry.trim().to_lowercase();
        if !entry.is_empty() && !out.contains(&entry) {
            out.push(entry);
        }
    }
    out
}
