//! Process execution behind a mockable seam.
use anyhow::{Context, Result};
use std::process::{Command, Output};

use crate::resources::error::ResourceError;

/// Result of a command execution.
#[derive(Debug)]
pub struct ExecResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the process exited zero.
    pub success: bool,
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Seam over process execution so resources can be tested without a host.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run a command, failing on non-zero exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned or exits non-zero.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command, returning the result even on non-zero exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned.
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Whether `program` is available on `PATH`.
    fn which(&self, program: &str) -> bool;
}

/// [`Executor`] backed by real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        run(program, args)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        run_unchecked(program, args)
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Execute a command and return the result, failing on non-zero exit.
fn execute_checked(mut cmd: Command, label: &str) -> Result<ExecResult> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to execute: {label}"))?;
    let result = ExecResult::from(output);
    if !result.success {
        return Err(ResourceError::ExecutionFailed {
            program: label.to_string(),
            exit_code: result.code.unwrap_or(-1),
            stderr: result.stderr.trim().to_string(),
        }
        .into());
    }
    Ok(result)
}

/// Run a command and return its output. Fails if the command exits non-zero.
///
/// # Errors
///
/// Returns an error if the command cannot be spawned or exits non-zero.
pub fn run(program: &str, args: &[&str]) -> Result<ExecResult> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    execute_checked(cmd, program)
}

/// Run a command, allowing failure (returns result without bailing).
///
/// # Errors
///
/// Returns an error if the command cannot be spawned.
pub fn run_unchecked(program: &str, args: &[&str]) -> Result<ExecResult> {
    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("failed to execute: {program}"))?;

    Ok(ExecResult::from(output))
}
