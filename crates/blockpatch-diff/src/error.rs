//! Error types for the diff crate.
//!
//! Diffing itself never fails; these cover loading engine configuration.

use std::path::PathBuf;

/// Errors that can occur while configuring the diff engine.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// The configuration file could not be read.
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration could not be parsed or is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
