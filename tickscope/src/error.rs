//! Error types for the tickscope telemetry pipeline.

use thiserror::Error;

/// The main error type for all tickscope operations.
///
/// Collection and configuration are the only fallible paths; the store and
/// query APIs degrade to empty results instead of failing (see the crate
/// docs on failure policy).
#[derive(Error, Debug)]
pub enum TickscopeError {
    /// Error raised while a collector was sampling the host.
    #[error("collect error: {0}")]
    Collect(#[from] CollectError),

    /// Error raised by a host probe.
    #[error("probe error: {0}")]
    Probe(#[from] ProbeError),

    /// Error during configuration validation.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors that can occur during a collection cycle.
///
/// These are caught and logged by the scheduler; one failing collector
/// never affects the others or the next cycle.
#[derive(Error, Debug)]
pub enum CollectError {
    /// A host probe could not produce the snapshot this collector needs.
    #[error("probe failed in collector '{collector}': {source}")]
    Probe {
        /// The collector that was running.
        collector: &'static str,
        /// The underlying probe failure.
        #[source]
        source: ProbeError,
    },
}

/// Errors a host probe can raise when a snapshot cannot be produced.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The host state needed for this snapshot is not currently readable.
    #[error("host state unavailable: {reason}")]
    Unavailable {
        /// Why the snapshot could not be taken.
        reason: String,
    },

    /// The host is shutting down and will not serve further snapshots.
    #[error("host is shutting down")]
    HostStopping,
}

/// Errors from validating a [`PipelineConfig`](crate::config::PipelineConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The collection interval must be non-zero.
    #[error("collection interval must be non-zero")]
    ZeroInterval,

    /// Each series must retain at least one sample.
    #[error("history size must be non-zero")]
    ZeroHistory,

    /// The store must admit at least one series.
    #[error("series cap must be non-zero")]
    ZeroSeriesCap,
}

/// Type alias for `Result<T, TickscopeError>`.
pub type Result<T> = std::result::Result<T, TickscopeError>;
