//! Logging setup errors.

use std::path::PathBuf;

use thiserror::Error;

/// Why logging could not be installed.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Unknown format name, or a level or directive `EnvFilter` rejects.
    #[error("invalid log setting: {0}")]
    InvalidSetting(String),

    /// Another global subscriber is already in place.
    #[error("could not install subscriber: {0}")]
    AlreadyInstalled(String),

    /// The directory for rolling log files could not be created.
    #[error("log directory {}: {source}", path.display())]
    LogDirectory {
        /// Directory requested.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for this crate.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
