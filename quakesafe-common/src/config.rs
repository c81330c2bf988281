//! Configuration loading and resolution
//!
//! Bootstrap configuration comes from a single TOML file. Every key is
//! optional; compiled defaults fill the gaps.
//!
//! **Config file resolution priority:**
//! 1. Command-line argument (highest priority)
//! 2. `QUAKESAFE_CONFIG` environment variable
//! 3. `<config dir>/quakesafe/config.toml` (platform config dir)
//! 4. Compiled defaults (fallback)
//!
//! A missing file is not fatal: defaults are used and the returned
//! [`ConfigSource`] is logged as a warning. A file that exists but does not
//! parse is an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{Error, Result};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "QUAKESAFE_CONFIG";

/// Environment variable holding the hosted language-model API key
pub const API_KEY_ENV_VAR: &str = "GOOGLE_API_KEY";

const DEFAULT_MODEL_SERVER: &str = "http://127.0.0.1:8501/v1/models";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub models: ModelsConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    /// Default: 5000
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body (bytes)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Directory for per-request upload files
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Directory served under `/static` (optional)
    #[serde(default)]
    pub static_assets: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Hosted language-model settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeminiConfig {
    /// API key; `GOOGLE_API_KEY` takes precedence
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    #[serde(default = "default_gemini_timeout_secs")]
    pub timeout_secs: u64,
}

/// Model-server endpoints for the pre-trained classifiers
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelsConfig {
    /// Request timeout shared by all classifier calls
    #[serde(default = "default_models_timeout_secs")]
    pub timeout_secs: u64,

    /// Tabular collapse-risk classifier
    #[serde(default = "default_structural")]
    pub structural: EndpointConfig,

    /// Generic crack detector
    #[serde(default = "default_crack")]
    pub crack: DetectorConfig,

    /// X-shaped crack detector
    #[serde(default = "default_crack_x")]
    pub crack_x: DetectorConfig,

    /// Y-shaped crack detector
    #[serde(default = "default_crack_y")]
    pub crack_y: DetectorConfig,
}

/// A model-server predict endpoint
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EndpointConfig {
    pub endpoint: String,
}

/// A crack detector endpoint plus the input resolution it was trained on
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DetectorConfig {
    pub endpoint: String,
    /// `[height, width]` the server resizes the image to
    pub target_size: [u32; 2],
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_gemini_model() -> String {
    "gemini-pro".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_timeout_secs() -> u64 {
    60
}

fn default_models_timeout_secs() -> u64 {
    30
}

fn default_structural() -> EndpointConfig {
    EndpointConfig {
        endpoint: format!("{}/collision:predict", DEFAULT_MODEL_SERVER),
    }
}

fn default_crack() -> DetectorConfig {
    DetectorConfig {
        endpoint: format!("{}/crack_detection:predict", DEFAULT_MODEL_SERVER),
        target_size: [150, 150],
    }
}

fn default_crack_x() -> DetectorConfig {
    DetectorConfig {
        endpoint: format!("{}/x_crack_detection:predict", DEFAULT_MODEL_SERVER),
        target_size: [150, 150],
    }
}

fn default_crack_y() -> DetectorConfig {
    DetectorConfig {
        endpoint: format!("{}/y_crack_detection:predict", DEFAULT_MODEL_SERVER),
        target_size: [224, 224],
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
            upload_dir: default_upload_dir(),
            static_assets: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
            timeout_secs: default_gemini_timeout_secs(),
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_models_timeout_secs(),
            structural: default_structural(),
            crack: default_crack(),
            crack_x: default_crack_x(),
            crack_y: default_crack_y(),
        }
    }
}

/// Where the active configuration came from
///
/// `load` runs before logging is initialized, so the caller reports the
/// outcome with [`ConfigSource::report`] once a subscriber is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),
    /// This file was named but does not exist; compiled defaults in use
    Missing(PathBuf),
    /// No file named by any source; compiled defaults in use
    Defaults,
}

impl ConfigSource {
    /// True when compiled defaults are in use
    pub fn is_defaults(&self) -> bool {
        !matches!(self, ConfigSource::File(_))
    }

    /// Log the outcome (warning when defaults replace a named file)
    pub fn report(&self) {
        match self {
            ConfigSource::Missing(_) => warn!("{}", self),
            ConfigSource::File(_) | ConfigSource::Defaults => info!("{}", self),
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "Loaded config from {}", path.display()),
            ConfigSource::Missing(path) => write!(
                f,
                "Config file {} not found, using compiled defaults",
                path.display()
            ),
            ConfigSource::Defaults => write!(f, "No config file found, using compiled defaults"),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from `path`, falling back to defaults
    ///
    /// `None` or a missing file yields the compiled defaults; the returned
    /// [`ConfigSource`] says which case applied.
    pub fn load(path: Option<&Path>) -> Result<(Self, ConfigSource)> {
        let Some(path) = path else {
            return Ok((Self::default(), ConfigSource::Defaults));
        };

        if !path.exists() {
            return Ok((Self::default(), ConfigSource::Missing(path.to_path_buf())));
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        Ok((config, ConfigSource::File(path.to_path_buf())))
    }
}

/// Locates the config file following the resolution priority
#[derive(Debug, Clone, Default)]
pub struct ConfigFileResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigFileResolver {
    /// `cli_path` is the value of `--config`, if given
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Resolve the config file path, or `None` if no source names one
    pub fn resolve(&self) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: Platform config directory
        default_config_path().filter(|path| path.exists())
    }
}

/// `<config dir>/quakesafe/config.toml` for the current platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("quakesafe").join("config.toml"))
}

/// Resolve the language-model API key
///
/// **Priority:** ENV (`GOOGLE_API_KEY`) → TOML (`gemini.api_key`)
pub fn resolve_gemini_api_key(config: &TomlConfig) -> Result<String> {
    let env_key = std::env::var(API_KEY_ENV_VAR)
        .ok()
        .filter(|key| is_valid_key(key));
    let toml_key = config
        .gemini
        .api_key
        .as_ref()
        .filter(|key| is_valid_key(key));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "Gemini API key found in both {} and TOML config. Using environment (highest priority).",
            API_KEY_ENV_VAR
        );
    }

    if let Some(key) = env_key {
        info!("Gemini API key loaded from environment variable");
        return Ok(key);
    }

    if let Some(key) = toml_key {
        info!("Gemini API key loaded from TOML config");
        return Ok(key.clone());
    }

    Err(Error::Config(format!(
        "Gemini API key not configured. Please configure using one of:\n\
         1. Environment: {}=your-key-here\n\
         2. TOML config: [gemini] api_key = \"your-key\"",
        API_KEY_ENV_VAR
    )))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
