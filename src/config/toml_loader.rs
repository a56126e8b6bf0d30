//! TOML configuration file parsing.
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::error::ConfigError;

/// Read and deserialize a TOML document.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read and
/// [`ConfigError::InvalidSyntax`] if it is not valid for `T`.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_document(&content, path)
}

/// Deserialize a TOML document already held in memory.
///
/// `origin` is only used for error messages.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidSyntax`] if `content` is not valid for `T`.
pub fn parse_document<T: DeserializeOwned>(content: &str, origin: &Path) -> Result<T, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::InvalidSyntax {
        file: origin.display().to_string(),
        message: e.message().to_string(),
    })
}
