//! Configuration errors.

use std::io;

/// Why a configuration could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A config file exists but could not be read, or an explicit file is
    /// missing.
    #[error("cannot read {path}: {source}")]
    ReadError {
        /// The file.
        path: String,
        /// The I/O failure.
        #[source]
        source: io::Error,
    },

    /// A config file is not valid TOML or does not match the schema.
    #[error("cannot parse {path}: {source}")]
    ParseError {
        /// The file, or `<embedded defaults>`.
        path: String,
        /// The TOML failure.
        #[source]
        source: toml::de::Error,
    },

    /// A config file exceeds the size cap.
    #[error("{path} is {size} bytes; config files are capped at {limit} bytes")]
    FileTooLarge {
        /// The file.
        path: String,
        /// Its size.
        size: u64,
        /// The cap.
        limit: u64,
    },

    /// The merged configuration holds an unusable value.
    #[error("invalid {field}: {message}")]
    ValidationError {
        /// Dotted field path, e.g. `tokens.ttl_secs`.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// `config show` was asked for a section the schema does not have.
    #[error("no [{0}] section")]
    UnknownSection(String),

    /// Serializing the resolved configuration failed.
    #[error("cannot render configuration: {0}")]
    Render(String),

    /// `~/.shlink` cannot be located.
    #[error("no home directory to look for ~/.shlink in")]
    NoHomeDir,
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
