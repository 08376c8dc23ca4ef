use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::trace;

/// Structured store configuration
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// No structured store
    None,

    /// In-memory ring buffer (no persistence)
    #[default]
    Memory,

    /// SQLite database
    Sqlite {
        /// Path to the SQLite database file
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,
    },
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./updates.db")
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ingress: IngressConfig,

    /// Remote endpoint receiving every summary (optional)
    pub forward: Option<ForwardConfig>,

    /// Structured store (defaults to in-memory)
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log store writing one document per summary (optional)
    pub log_store: Option<LogStoreConfig>,

    /// Upper bound on region workers; unbounded if absent
    pub max_regions: Option<usize>,

    /// Capacity of the summary broadcast channel
    #[serde(default = "default_summary_channel_capacity")]
    pub summary_channel_capacity: usize,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct IngressConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    #[serde(default = "default_cors")]
    pub cors: bool,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors: default_cors(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct ForwardConfig {
    pub url: String,
    #[serde(default = "default_forward_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct LogStoreConfig {
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_cors() -> bool {
    true
}

fn default_forward_timeout() -> u64 {
    5
}

fn default_log_directory() -> PathBuf {
    PathBuf::from("./crop-logs")
}

fn default_summary_channel_capacity() -> usize {
    256
}

/// Parse a configuration document; TOML if `is_toml`, JSON otherwise
pub fn parse_config(content: &str, is_toml: bool) -> anyhow::Result<Config> {
    let config: Config = if is_toml {
        toml::from_str(content).context("invalid TOML configuration")?
    } else {
        serde_json::from_str(content).context("invalid JSON configuration")?
    };

    if config.summary_channel_capacity == 0 {
        anyhow::bail!("summary_channel_capacity must be greater than zero");
    }

    if config.max_regions == Some(0) {
        anyhow::bail!("max_regions must be greater than zero when set");
    }

    Ok(config)
}

pub fn read_config_file(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let path = path.as_ref();
    let file_content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let is_toml = path.extension().is_some_and(|ext| ext == "toml");

    parse_config(&file_content, is_toml).inspect(|config| trace!("loaded config: {config:?}"))
}
