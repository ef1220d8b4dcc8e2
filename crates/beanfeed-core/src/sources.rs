use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One merchant storefront and the collection feeds scraped from it.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    /// Collection base URLs, e.g. `https://shop.example/collections/coffee`.
    pub collections: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl SourceConfig {
    /// Yields one `(merchant, collection url)` pair per configured collection.
    pub fn collection_pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.collections
            .iter()
            .map(move |url| (self.name.as_str(), url.as_str()))
    }
}

#[derive(Debug, Deserialize)]
pub struct SourcesFile {
    pub sources: Vec<SourceConfig>,
}

impl SourcesFile {
    /// Returns the source with the given name, compared case-insensitively.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&SourceConfig> {
        self.sources
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }
}

/// Load and validate the merchant sources from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sources(path: &Path) -> Result<SourcesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let sources_file: SourcesFile =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::FileParse {
            path: path.display().to_string(),
            source: e,
        })?;

    validate_sources(&sources_file)?;

    Ok(sources_file)
}

fn validate_sources(sources_file: &SourcesFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for source in &sources_file.sources {
        if source.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source name must be non-empty".to_string(),
            ));
        }

        if !seen_names.insert(source.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source name: '{}'",
                source.name
            )));
        }

        if source.collections.is_empty() {
            return Err(ConfigError::Validation(format!(
                "source '{}' must list at least one collection URL",
                source.name
            )));
        }

        let mut seen_urls = HashSet::new();
        for url in &source.collections {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ConfigError::Validation(format!(
                    "source '{}' has non-http collection URL '{url}'",
                    source.name
                )));
            }
            if !seen_urls.insert(url.trim_end_matches('/')) {
                return Err(ConfigError::Validation(format!(
                    "source '{}' lists collection URL '{url}' more than once",
                    source.name
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "sources_test.rs"]
mod tests;
