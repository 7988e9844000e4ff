//! Domain-specific error types for Stream-Features.
//!
//! Uses `thiserror` for ergonomic error definitions that integrate
//! with the broader `anyhow` error handling strategy.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while extracting a feature vector from one capture.
///
/// All three are fatal to the current invocation only; a batch driver is
/// expected to catch them per file and continue with the next capture.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error(
        "first_n_seconds ({first_n_seconds}) must be an integer multiple of window_size ({window_size})"
    )]
    InvalidWindowing {
        window_size: f64,
        first_n_seconds: f64,
    },

    #[error("no video flow found in dataset")]
    NoFlowFound,

    #[error("malformed flow: {0}")]
    MalformedFlow(String),
}

/// Errors that can occur while loading a packet dataset from disk.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("failed to read packet stats file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse packet stats file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no packet stats file at '{path}'")]
    StatsFileMissing { path: PathBuf },
}

/// Result type alias using anyhow for application-level error handling.
pub type Result<T> = anyhow::Result<T>;
