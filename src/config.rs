use std::net::SocketAddr;
use std::path::PathBuf;

use crate::pipeline::vitals::ExtractionMode;

/// Application-level constants
pub const APP_NAME: &str = "VitalChart";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Defaults for the hosted vision model.
pub const DEFAULT_VISION_URL: &str = "https://api.openai.com";
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_VISION_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";

/// Get the application data directory.
/// Falls back to the working directory when no home directory is known.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("VitalChart")
}

/// Default location of the charting database.
pub fn default_database_path() -> PathBuf {
    app_data_dir().join("vitalchart.db")
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "vitalchart_lib=info,tower_http=warn"
}

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// Runtime configuration, resolved once at startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub vision_url: String,
    pub vision_model: String,
    pub vision_timeout_secs: u64,
    pub vision_api_key: Option<String>,
    pub extraction_mode: ExtractionMode,
}

impl AppConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = non_empty("VITALCHART_BIND").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: "VITALCHART_BIND",
            value: bind_raw.clone(),
        })?;

        let vision_timeout_secs = match non_empty("VITALCHART_VISION_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "VITALCHART_VISION_TIMEOUT_SECS",
                value: raw,
            })?,
            None => DEFAULT_VISION_TIMEOUT_SECS,
        };

        let extraction_mode = match non_empty("VITALCHART_EXTRACTION_MODE") {
            Some(raw) => ExtractionMode::from_str(raw.trim()).ok_or(ConfigError::InvalidValue {
                key: "VITALCHART_EXTRACTION_MODE",
                value: raw,
            })?,
            None => ExtractionMode::Strict,
        };

        Ok(Self {
            bind_addr,
            database_path: non_empty("VITALCHART_DB")
                .map(PathBuf::from)
                .unwrap_or_else(default_database_path),
            vision_url: non_empty("VITALCHART_VISION_URL")
                .unwrap_or_else(|| DEFAULT_VISION_URL.into()),
            vision_model: non_empty("VITALCHART_VISION_MODEL")
                .unwrap_or_else(|| DEFAULT_VISION_MODEL.into()),
            vision_timeout_secs,
            vision_api_key: non_empty("OPENAI_API_KEY"),
            extraction_mode,
        })
    }
}
