//! Configuration loading.
//!
//! `cfeed` reads a single TOML file (`--config`, default
//! `./config/cfeed.toml`). Only `[db]` is required:
//!
//! ```toml
//! [db]
//! path = "./data/cfeed.sqlite"
//!
//! [server]
//! bind = "127.0.0.1:5000"
//!
//! [cache]
//! ttl_secs = 600
//!
//! [logging]
//! filter = "info"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Allowed CORS origin. `None` or `"*"` allows any origin.
    #[serde(default)]
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origin: None,
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

/// Feed response cache settings.
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_cache_enabled() -> bool {
    true
}
fn default_ttl_secs() -> u64 {
    600
}
fn default_max_entries() -> u64 {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive. `RUST_LOG` takes precedence.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

/// Read, parse, and validate a config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid TOML for
/// [`Config`], or fails [`validate`].
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Check values serde cannot: the bind address, cache bounds, and log filter.
///
/// # Errors
///
/// Returns the first invalid setting found.
pub fn validate(config: &Config) -> Result<()> {
    if config.db.path.as_os_str().is_empty() {
        anyhow::bail!("db.path must not be empty");
    }

    config
        .server
        .bind
        .parse::<SocketAddr>()
        .with_context(|| format!("server.bind is not a socket address: '{}'", config.server.bind))?;

    if config.cache.enabled {
        if config.cache.ttl_secs == 0 {
            anyhow::bail!("cache.ttl_secs must be > 0 when the cache is enabled");
        }
        if config.cache.max_entries == 0 {
            anyhow::bail!("cache.max_entries must be > 0 when the cache is enabled");
        }
    }

    if config.logging.filter.trim().is_empty() {
        anyhow::bail!("logging.filter must not be empty");
    }

    Ok(())
}
