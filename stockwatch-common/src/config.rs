//! Configuration management for Stockwatch.
//!
//! Configuration lives in a single JSON file at `~/.stockwatch/config.json`.
//! A missing file yields defaults; every section may be omitted.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (STOCKWATCH_* prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `STOCKWATCH_API_TOKEN` → api.token (fallback: `FINNHUB_API_KEY`)
//! - `STOCKWATCH_API_BASE_URL` → api.base_url
//! - `STOCKWATCH_LOG_LEVEL` → observability.log_level
//! - `STOCKWATCH_DB_PATH` → storage.db_path

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".stockwatch"),
        |dirs| dirs.home_dir().join(".stockwatch"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Sections
// ============================================================================

/// Financial-data API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL; endpoint paths are joined onto it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API token appended to every request as `token=<value>`.
    #[serde(default)]
    pub token: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Watchlist aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Trailing window of market data per symbol, in days.
    #[serde(default = "default_history_days")]
    pub history_days: u32,

    /// Upper bound on in-flight per-symbol fetches within one batch.
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// Optional series cache TTL. `None` keeps entries until the watchlist changes.
    #[serde(default)]
    pub cache_ttl_secs: Option<u64>,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            history_days: default_history_days(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            cache_ttl_secs: None,
        }
    }
}

/// News settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    /// Trailing window for company news, in days.
    #[serde(default = "default_company_window_days")]
    pub company_window_days: u32,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            company_window_days: default_company_window_days(),
        }
    }
}

/// Search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Quiet period before a query is sent, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Local persistence settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database path. Defaults to `~/.stockwatch/watchlist.db`.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the database path, applying the default location.
    pub fn resolved_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| config_dir().join("watchlist.db"))
    }
}

/// Watchlist seeding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistConfig {
    /// Symbol → display name map written on first-ever use.
    #[serde(default = "default_watchlist")]
    pub defaults: BTreeMap<String, String>,
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        Self {
            defaults: default_watchlist(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets to pin at `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

// ============================================================================
// Root
// ============================================================================

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub aggregation: AggregationConfig,

    #[serde(default)]
    pub news: NewsConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub watchlist: WatchlistConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path, falling back to defaults.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with environment variable overrides, then validate.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("STOCKWATCH_API_TOKEN").or_else(|| lookup("FINNHUB_API_KEY")) {
            self.api.token = Some(token);
        }
        if let Some(url) = lookup("STOCKWATCH_API_BASE_URL") {
            self.api.base_url = url;
        }
        if let Some(level) = lookup("STOCKWATCH_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(path) = lookup("STOCKWATCH_DB_PATH") {
            self.storage.db_path = Some(PathBuf::from(path));
        }
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> std::result::Result<(), Error> {
        if self.aggregation.history_days == 0 {
            return Err(Error::Config(
                "aggregation.history_days must be at least 1".into(),
            ));
        }
        if self.aggregation.max_concurrent_fetches == 0 {
            return Err(Error::Config(
                "aggregation.max_concurrent_fetches must be at least 1".into(),
            ));
        }
        url::Url::parse(&self.api.base_url).map_err(|e| {
            Error::Config(format!("api.base_url '{}' is invalid: {}", self.api.base_url, e))
        })?;
        Ok(())
    }
}

fn default_base_url() -> String {
    "https://finnhub.io/api/v1/".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_history_days() -> u32 {
    7
}
fn default_max_concurrent_fetches() -> usize {
    8
}
fn default_company_window_days() -> u32 {
    7
}
fn default_debounce_ms() -> u64 {
    300
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "pretty".into()
}
fn default_watchlist() -> BTreeMap<String, String> {
    [
        ("AAPL", "Apple Inc."),
        ("AMZN", "Amazon.com Inc."),
        ("FB", "Facebook Inc."),
        ("GOOG", "Alphabet"),
        ("MSFT", "Microsoft Corporation"),
        ("NKE", "Nike"),
        ("NVDA", "Nvidia Inc."),
        ("PINS", "Pinterest Inc."),
        ("SNAP", "Snap Inc."),
        ("WORK", "Slack Technologies"),
    ]
    .into_iter()
    .map(|(s, n)| (s.to_string(), n.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "https://finnhub.io/api/v1/");
        assert_eq!(config.aggregation.history_days, 7);
        assert_eq!(config.aggregation.max_concurrent_fetches, 8);
        assert!(config.aggregation.cache_ttl_secs.is_none());
        assert_eq!(config.search.debounce_ms, 300);
        assert_eq!(config.news.company_window_days, 7);
        assert_eq!(config.watchlist.defaults.len(), 10);
        assert_eq!(config.watchlist.defaults["AAPL"], "Apple Inc.");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "search": {{ "debounce_ms": 150 }}, "observability": {{ "level": "debug" }} }}"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.search.debounce_ms, 150);
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.aggregation.history_days, 7);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = Config::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FINNHUB_API_KEY", "fallback"),
            ("STOCKWATCH_LOG_LEVEL", "trace"),
            ("STOCKWATCH_DB_PATH", "/tmp/wl.db"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides_from(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.api.token.as_deref(), Some("fallback"));
        assert_eq!(config.observability.log_level, "trace");
        assert_eq!(
            config.storage.resolved_db_path(),
            PathBuf::from("/tmp/wl.db")
        );
    }

    #[test]
    fn test_primary_token_wins_over_fallback() {
        let mut config = Config::default();
        config.apply_overrides_from(|k| match k {
            "STOCKWATCH_API_TOKEN" => Some("primary".into()),
            "FINNHUB_API_KEY" => Some("fallback".into()),
            _ => None,
        });
        assert_eq!(config.api.token.as_deref(), Some("primary"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.aggregation.max_concurrent_fetches = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.aggregation.history_days = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.base_url = "not a url".into();
        assert!(config.validate().is_err());
    }
}
