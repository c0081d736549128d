//! Configuration file handling.
//!
//! This module handles loading `drive-report.toml`, applying environment
//! overrides and merging command-line arguments.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "drive-report.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Drive API settings.
    #[serde(default)]
    pub drive: DriveConfig,

    /// Classification pipeline settings.
    #[serde(default)]
    pub classification: ClassificationConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Drive API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    /// Path to the authorized-user token file.
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,

    /// Drive API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Upper bound on the page size of `/documents`.
    #[serde(default = "default_max_results_per_page")]
    pub max_results_per_page: u32,

    /// MIME types the classifier can handle. Empty means no restriction.
    #[serde(default)]
    pub supported_mime_types: Vec<String>,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            token_path: default_token_path(),
            api_base: default_api_base(),
            timeout_seconds: default_timeout(),
            max_results_per_page: default_max_results_per_page(),
            supported_mime_types: Vec::new(),
        }
    }
}

fn default_token_path() -> PathBuf {
    PathBuf::from("token.json")
}

fn default_api_base() -> String {
    "https://www.googleapis.com/drive/v3".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_results_per_page() -> u32 {
    100
}

/// Settings shared with the external classification process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationConfig {
    /// How long classification results are considered fresh.
    #[serde(default = "default_cache_duration_days")]
    pub cache_duration_days: u32,

    /// URL of the classification processor.
    #[serde(default)]
    pub processor_url: Option<String>,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            cache_duration_days: default_cache_duration_days(),
            processor_url: None,
        }
    }
}

fn default_cache_duration_days() -> u32 {
    7
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Numeric variables that fail to parse are ignored with a warning.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(days) = parse_env(&lookup, "CACHE_DURATION_DAYS") {
            self.classification.cache_duration_days = days;
        }
        if let Some(max) = parse_env(&lookup, "MAX_RESULTS_PER_PAGE") {
            self.drive.max_results_per_page = max;
        }
        if let Some(types) = lookup("SUPPORTED_MIME_TYPES") {
            self.drive.supported_mime_types = types
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(url) = lookup("PROCESSOR_URL") {
            self.classification.processor_url = Some(url);
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence; only explicitly provided values override.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref host) = args.host {
            self.server.host = host.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(ref token_path) = args.token_path {
            self.drive.token_path = token_path.clone();
        }
    }

    /// Check values that would make the service unusable.
    pub fn validate(&self) -> Result<()> {
        if self.drive.max_results_per_page == 0 {
            bail!("max_results_per_page must be at least 1");
        }
        if self.drive.timeout_seconds == 0 {
            bail!("timeout_seconds must be at least 1");
        }
        if !self.drive.api_base.starts_with("http://") && !self.drive.api_base.starts_with("https://")
        {
            bail!("Drive API base URL must start with 'http://' or 'https://'");
        }
        Ok(())
    }

    /// Address string for the HTTP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

fn parse_env<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}: '{}' is not a valid number", key, raw);
            None
        }
    }
}
