use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Shopify caps `products.json` pages at 250 items.
const MAX_PAGE_LIMIT: u32 = 250;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let env = parse_environment(&or_default("BEANFEED_ENV", "development"))?;
    let bind_addr = parse_or(&lookup, "BEANFEED_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("BEANFEED_LOG_LEVEL", "info");
    let sources_path = PathBuf::from(or_default(
        "BEANFEED_SOURCES_PATH",
        "./config/sources.yaml",
    ));
    let vocabulary_path = lookup("BEANFEED_VOCABULARY_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let fetch_timeout_secs = parse_or(&lookup, "BEANFEED_FETCH_TIMEOUT_SECS", "15")?;
    let user_agent = or_default("BEANFEED_USER_AGENT", "beanfeed/0.1 (coffee-catalog)");
    let max_retries = parse_or(&lookup, "BEANFEED_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_or(&lookup, "BEANFEED_RETRY_BACKOFF_BASE_MS", "1000")?;
    let page_limit: u32 = parse_or(&lookup, "BEANFEED_PAGE_LIMIT", "250")?;
    let batch_size: usize = parse_or(&lookup, "BEANFEED_BATCH_SIZE", "6")?;
    let inter_batch_delay_ms = parse_or(&lookup, "BEANFEED_INTER_BATCH_DELAY_MS", "0")?;
    let cache_ttl_secs = parse_or(&lookup, "BEANFEED_CACHE_TTL_SECS", "3600")?;
    let refresh_timeout_secs = parse_or(&lookup, "BEANFEED_REFRESH_TIMEOUT_SECS", "120")?;
    let refresh_cron = or_default("BEANFEED_REFRESH_CRON", "0 0 * * * *");

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        sources_path,
        vocabulary_path,
        fetch_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        page_limit: page_limit.clamp(1, MAX_PAGE_LIMIT),
        batch_size: batch_size.max(1),
        inter_batch_delay_ms,
        cache_ttl_secs,
        refresh_timeout_secs,
        refresh_cron,
    })
}

/// Parses `var` from the lookup, falling back to `default` when unset.
fn parse_or<T, F>(lookup: &F, var: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let raw = lookup(var).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "BEANFEED_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
