use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub sources_path: PathBuf,
    /// Optional vocabulary override; `None` uses the built-in lists.
    pub vocabulary_path: Option<PathBuf>,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
    /// Additional attempts after the first failure for transient errors.
    pub max_retries: u32,
    /// Base delay for exponential backoff: `base * 2^attempt` milliseconds.
    pub retry_backoff_base_ms: u64,
    /// `limit` query parameter sent to `products.json` (1..=250).
    pub page_limit: u32,
    /// Number of collection fetches run concurrently per batch.
    pub batch_size: usize,
    pub inter_batch_delay_ms: u64,
    /// Freshness window of the in-memory catalog.
    pub cache_ttl_secs: u64,
    /// Upper bound on one full aggregation run triggered by a request.
    pub refresh_timeout_secs: u64,
    /// Six-field cron expression for the background refresh job.
    pub refresh_cron: String,
}
