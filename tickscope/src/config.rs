//! Pipeline configuration surface.
//!
//! The core consumes these values but does not own them: loading,
//! persistence, and merging with CLI flags belong to the embedding
//! process (see the demo server's config loader). Field names serialize
//! in camelCase so a host's JSON config file maps onto this struct
//! directly.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Resolved configuration consumed by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// Milliseconds between collection cycles.
    pub collection_interval_ms: u64,
    /// Samples retained per series.
    pub history_size: usize,
    /// Upper bound on distinct series names.
    ///
    /// Hotspot detection mints metric names from live activity, so the key
    /// space grows with load; past this cap, writes to unseen names are
    /// dropped instead of evicting existing history.
    pub max_series: usize,
    /// Whether the entity collector runs.
    pub collect_entity_metrics: bool,
    /// Whether per-cell density (hotspot) series are recorded.
    pub collect_chunk_metrics: bool,
    /// Whether block-entity series are recorded.
    pub collect_block_entity_metrics: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            collection_interval_ms: 1000,
            history_size: 3600, // one hour at the default interval
            max_series: 2048,
            collect_entity_metrics: true,
            collect_chunk_metrics: true,
            collect_block_entity_metrics: true,
        }
    }
}

impl PipelineConfig {
    /// Checks the numeric fields for values the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collection_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.history_size == 0 {
            return Err(ConfigError::ZeroHistory);
        }
        if self.max_series == 0 {
            return Err(ConfigError::ZeroSeriesCap);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.collection_interval_ms, 1000);
        assert_eq!(config.history_size, 3600);
    }

    #[test]
    fn test_zero_fields_rejected() {
        let config = PipelineConfig {
            collection_interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroInterval)));

        let config = PipelineConfig {
            history_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroHistory)));

        let config = PipelineConfig {
            max_series: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroSeriesCap)));
    }

    #[test]
    fn test_camel_case_keys_with_defaults() {
        let config: PipelineConfig = serde_json::from_str(
            r#"{"collectionIntervalMs": 250, "collectChunkMetrics": false}"#,
        )
        .unwrap();

        assert_eq!(config.collection_interval_ms, 250);
        assert!(!config.collect_chunk_metrics);
        // Unspecified fields fall back to defaults.
        assert_eq!(config.history_size, 3600);
        assert!(config.collect_entity_metrics);
    }
}
