pub mod app_config;
pub mod beans;
pub mod config;
pub mod sources;
pub mod vocabulary;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use beans::{CanonicalBean, RoastLevel};
pub use config::{load_app_config, load_app_config_from_env};
pub use sources::{load_sources, SourceConfig, SourcesFile};
pub use vocabulary::{load_vocabulary, Vocabulary};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    FileParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("configuration validation failed: {0}")]
    Validation(String),
}
