//! Demo server configuration file handling.
//!
//! The pipeline itself only consumes resolved values; reading them from
//! disk is this binary's job. The file is JSON with camelCase keys and
//! every field optional; a missing file means defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tickscope::PipelineConfig;

/// Errors from loading the demo configuration file.
#[derive(Error, Debug)]
pub enum ConfigFileError {
    /// The file exists but could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Io {
        /// The offending path.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON for this schema.
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        /// The offending path.
        path: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// On-disk demo configuration: the web port plus the pipeline surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DemoConfig {
    /// Port the HTTP query API binds to.
    pub web_server_port: u16,
    /// Pipeline settings, flattened into the same JSON object.
    #[serde(flatten)]
    pub pipeline: PipelineConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            web_server_port: 8080,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl DemoConfig {
    /// Loads the configuration from `path`. A missing file is not an
    /// error: defaults are returned and a note is logged.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigFileError`] when the file exists but cannot be read
    /// or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file found, using defaults");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = serde_json::from_str(&raw).map_err(|source| ConfigFileError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        tracing::info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}
