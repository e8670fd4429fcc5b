//! `finwise.toml` settings.
//!
//! ```toml
//! [api]
//! base_url = "http://127.0.0.1:5000"
//! timeout_seconds = 30
//!
//! [ui]
//! debounce_ms = 250
//! currency = "USD"
//!
//! [log]
//! level = "info"
//! file = "finwise.log"
//! ```
//!
//! Every section and key is optional.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use finwise_http::ApiConfig;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "finwise.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Quiet period before a preview is recomputed.
    pub debounce_ms: u64,
    /// Display currency for calculators that do not pick their own.
    pub currency: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 250,
            currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub api: ApiConfig,
    pub ui: UiSettings,
    pub log: LogSettings,
}

impl UiConfig {
    /// Parses and validates TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path`. A missing file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Reads an explicitly named file, or [`DEFAULT_CONFIG_FILE`] when it
    /// exists, or falls back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    info!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Applies command-line overrides on top of the file settings.
    pub fn with_overrides(
        mut self,
        api_url: Option<String>,
        log_level: Option<String>,
        log_file: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        if let Some(url) = api_url {
            self.api.base_url = url;
        }
        if let Some(level) = log_level {
            self.log.level = level;
        }
        if log_file.is_some() {
            self.log.file = log_file;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.ui.debounce_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.api.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "api.base_url must be an http(s) URL, got '{base_url}'"
            )));
        }
        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "api.timeout_seconds must be at least 1".to_string(),
            ));
        }
        let currency = self.ui.currency.trim();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::Invalid(format!(
                "ui.currency must be a three-letter ISO code, got '{currency}'"
            )));
        }
        Ok(())
    }
}
