//! Domain-specific error types.
//!
//! Internal modules return these typed errors; command handlers at the CLI
//! boundary convert them to [`anyhow::Error`] via `?` and add context.
//!
//! ```text
//! ValidationError  fragment declarations (render time)
//! ConfigError      limits.toml loading and fragment selection
//! TaskError        task graph issues
//! ResourceError    files, ownership, package commands
//! PlatformError    OS detection and identifiers
//! ```

use thiserror::Error;

pub use crate::fragment::ValidationError;
pub use crate::resources::error::ResourceError;

/// Errors that arise from configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The TOML file contains a syntax or schema error.
    #[error("Invalid TOML in {file}: {message}")]
    InvalidSyntax {
        /// Path of the offending file.
        file: String,
        /// Parser message.
        message: String,
    },

    /// An I/O error occurred while reading a config file.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A fragment named on the command line is not declared.
    #[error("Fragment '{0}' is not declared")]
    UnknownFragment(String),
}

/// Errors that arise during task execution.
#[derive(Error, Debug)]
pub enum TaskError {
    /// The task dependency graph contains a cycle.
    #[error("Task dependency cycle detected: {0}")]
    DependencyCycle(String),
}

/// Errors that arise from platform detection.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Platform detection failed.
    #[error("Platform detection failed: {0}")]
    DetectionFailed(String),

    /// A `--platform` identifier could not be parsed.
    #[error("Unknown platform identifier '{0}'")]
    UnknownIdentifier(String),
}
