//! Typed errors raised by resources and the process executor.

use thiserror::Error;

/// Errors that arise from resource checks and apply operations.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// A package manager command exited non-zero.
    #[error("command '{program}' failed (exit {exit_code}): {stderr}")]
    ExecutionFailed {
        /// Name of the program that was invoked.
        program: String,
        /// Exit code returned by the process.
        exit_code: i32,
        /// Captured standard error output.
        stderr: String,
    },

    /// A user or group named by a fragment does not exist.
    #[error("resource not found: {resource}")]
    NotFound {
        /// Description of the missing resource.
        resource: String,
    },

    /// A fragment `source` uses a scheme that cannot be fetched locally.
    #[error("unsupported source '{source_ref}': scheme '{scheme}' is not supported")]
    UnsupportedSource {
        /// The source reference as declared.
        source_ref: String,
        /// The URL scheme that was rejected.
        scheme: String,
    },
}
