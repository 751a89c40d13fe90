//! Configuration errors

use std::path::PathBuf;

/// Errors raised while reading settings or server config files
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
