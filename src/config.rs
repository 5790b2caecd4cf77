//! Configuration module for dspace.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::transfer::{ChunkLimits, TransferSettings};
use crate::{DspaceError, Result};

/// Bytes per megabyte, as used by the size settings below.
const MB: u64 = 1024 * 1024;

/// Upper bound for every `*_mb` setting.
pub const MAX_SIZE_MB: u64 = 4096;

fn mb_to_bytes(mb: u64) -> usize {
    usize::try_from(mb.saturating_mul(MB)).unwrap_or(usize::MAX)
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins (empty = any origin).
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Largest accepted request body in megabytes.
    #[serde(default = "default_max_request_size")]
    pub max_request_size_mb: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_request_size() -> u64 {
    512
}

impl ServerConfig {
    /// Largest accepted request body in bytes.
    pub fn max_request_size(&self) -> usize {
        mb_to_bytes(self.max_request_size_mb)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
            max_request_size_mb: default_max_request_size(),
        }
    }
}

/// Discord backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    /// Bot token. Usually supplied through `DSPACE_TOKEN`.
    #[serde(default)]
    pub token: String,
    /// REST API base url, without version.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// REST API version.
    #[serde(default = "default_api_version")]
    pub api_version: u8,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    /// Channel ids chunks are rotated across.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Send attempts per chunk.
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    /// Delay between chunk send attempts, and initial login backoff, in milliseconds.
    #[serde(default = "default_backoff")]
    pub backoff_ms: u64,
    /// Factor applied to the login backoff after every failed login.
    #[serde(default = "default_backoff_coefficient")]
    pub exponential_backoff_coefficient: f64,
}

fn default_api_base() -> String {
    "https://discord.com/api".to_string()
}

fn default_api_version() -> u8 {
    10
}

fn default_timeout() -> u64 {
    30_000
}

fn default_attempts() -> u32 {
    3
}

fn default_backoff() -> u64 {
    500
}

fn default_backoff_coefficient() -> f64 {
    2.0
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base: default_api_base(),
            api_version: default_api_version(),
            timeout_ms: default_timeout(),
            channels: vec![],
            attempts: default_attempts(),
            backoff_ms: default_backoff(),
            exponential_backoff_coefficient: default_backoff_coefficient(),
        }
    }
}

/// Chunking configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferConfig {
    /// Files smaller than this many megabytes go up as a single chunk.
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size_mb: u64,
    /// Size of each chunk, in megabytes, when a file is split.
    #[serde(default = "default_chunk_size")]
    pub chunk_size_mb: u64,
}

fn default_max_chunk_size() -> u64 {
    20
}

fn default_chunk_size() -> u64 {
    10
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            max_chunk_size_mb: default_max_chunk_size(),
            chunk_size_mb: default_chunk_size(),
        }
    }
}

/// Virtual directory and download storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the virtual directory snapshot.
    #[serde(default = "default_virtual_directory_path")]
    pub virtual_directory_path: String,
    /// Directory retrieved artifacts are written to.
    #[serde(default = "default_downloads_dir")]
    pub downloads_dir: String,
    /// Whether retrieved artifacts are also written to `downloads_dir`.
    #[serde(default = "default_save_downloads")]
    pub save_downloads: bool,
}

fn default_virtual_directory_path() -> String {
    "virtualDirectory.json".to_string()
}

fn default_downloads_dir() -> String {
    "downloads".to_string()
}

fn default_save_downloads() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            virtual_directory_path: default_virtual_directory_path(),
            downloads_dir: default_downloads_dir(),
            save_downloads: default_save_downloads(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/dspace.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Discord backend configuration.
    #[serde(default)]
    pub discord: DiscordConfig,
    /// Chunking configuration.
    #[serde(default)]
    pub transfer: TransferConfig,
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(DspaceError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| DspaceError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `DSPACE_TOKEN`: Override the bot token
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("DSPACE_TOKEN") {
            if !token.is_empty() {
                self.discord.token = token;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Everything the transfer engine needs is checked here, so a bad value
    /// stops the process at startup instead of failing individual requests.
    pub fn validate(&self) -> Result<()> {
        if self.discord.token.is_empty() {
            return Err(DspaceError::Config(
                "discord token is not set. \
                 Set it in config.toml or via DSPACE_TOKEN environment variable."
                    .to_string(),
            ));
        }
        if self.discord.channels.is_empty() {
            return Err(DspaceError::Config(
                "at least one discord channel is required".to_string(),
            ));
        }
        if self.discord.channels.iter().any(|c| c.trim().is_empty()) {
            return Err(DspaceError::Config(
                "discord channel ids must not be empty".to_string(),
            ));
        }
        if self.discord.attempts == 0 {
            return Err(DspaceError::Config("attempts must be at least 1".to_string()));
        }
        let coefficient = self.discord.exponential_backoff_coefficient;
        if coefficient.is_nan() || coefficient < 1.0 {
            return Err(DspaceError::Config(
                "exponential_backoff_coefficient must be at least 1.0".to_string(),
            ));
        }
        if self.transfer.chunk_size_mb == 0 || self.transfer.max_chunk_size_mb == 0 {
            return Err(DspaceError::Config(
                "chunk sizes must be greater than zero".to_string(),
            ));
        }
        let sizes = [
            ("server.max_request_size_mb", self.server.max_request_size_mb),
            ("transfer.max_chunk_size_mb", self.transfer.max_chunk_size_mb),
            ("transfer.chunk_size_mb", self.transfer.chunk_size_mb),
        ];
        for (name, value) in sizes {
            if value > MAX_SIZE_MB {
                return Err(DspaceError::Config(format!(
                    "{name} ({value}) must not exceed {MAX_SIZE_MB}"
                )));
            }
        }
        if self.transfer.chunk_size_mb > self.transfer.max_chunk_size_mb {
            return Err(DspaceError::Config(format!(
                "chunk_size_mb ({}) must not exceed max_chunk_size_mb ({})",
                self.transfer.chunk_size_mb, self.transfer.max_chunk_size_mb
            )));
        }
        Ok(())
    }

    /// Settings handed to the transfer engine, with sizes in bytes.
    pub fn transfer_settings(&self) -> TransferSettings {
        TransferSettings {
            limits: ChunkLimits {
                ceiling: mb_to_bytes(self.transfer.max_chunk_size_mb),
                chunk_size: mb_to_bytes(self.transfer.chunk_size_mb),
            },
            attempts: self.discord.attempts,
            backoff: Duration::from_millis(self.discord.backoff_ms),
        }
    }

    /// Largest accepted request body in bytes.
    pub fn max_request_size(&self) -> usize {
        self.server.max_request_size()
    }
}
