//! Client configuration
//!
//! Loaded from a JSON file; every field is optional.
//!
//! ```json
//! {
//!   "max_chunk_size": 65536,
//!   "verify_chunk_checksums": true,
//!   "log_level": "warn",
//!   "principal": "admin"
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chunk::MAX_FRAME_PAYLOAD;
use crate::observability::{log_event_with_fields, Event, Severity};

/// Default payload bytes per chunk
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 64 * 1024;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid JSON for this structure
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds an unusable value
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn default_max_chunk_size() -> usize {
    DEFAULT_MAX_CHUNK_SIZE
}

fn default_verify_chunk_checksums() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Remote access configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Payload bytes per chunk on the serving side (must be > 0)
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Whether received chunk frames are checksum-verified
    #[serde(default = "default_verify_chunk_checksums")]
    pub verify_chunk_checksums: bool,

    /// Minimum log severity: trace, info, warn, error, fatal
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Identity presented on privileged calls
    #[serde(default)]
    pub principal: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: default_max_chunk_size(),
            verify_chunk_checksums: default_verify_chunk_checksums(),
            log_level: default_log_level(),
            principal: None,
        }
    }
}

impl RemoteConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&contents)?;
        log_event_with_fields(
            Event::ConfigLoaded,
            &[("path", &path.display().to_string())],
        );
        Ok(config)
    }

    /// Parse and validate a configuration from JSON text.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: RemoteConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check field values.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_chunk_size == 0 {
            return Err(ConfigError::Invalid {
                field: "max_chunk_size",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.max_chunk_size > MAX_FRAME_PAYLOAD {
            return Err(ConfigError::Invalid {
                field: "max_chunk_size",
                reason: format!("must not exceed {}", MAX_FRAME_PAYLOAD),
            });
        }
        self.severity()?;
        Ok(())
    }

    /// Parsed log level.
    pub fn severity(&self) -> ConfigResult<Severity> {
        Severity::parse(&self.log_level).ok_or_else(|| ConfigError::Invalid {
            field: "log_level",
            reason: format!("unknown level '{}'", self.log_level),
        })
    }

    /// Builder-style chunk size override.
    pub fn with_max_chunk_size(mut self, max_chunk_size: usize) -> Self {
        self.max_chunk_size = max_chunk_size;
        self
    }

    /// Builder-style principal override.
    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }
}
