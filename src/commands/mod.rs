//! Subcommand implementations and their shared setup.
pub mod apply;
pub mod render;
pub mod validate;
pub mod version;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::{Config, DEFAULT_CONFIG_FILE};
use crate::logging::Logger;
use crate::platform::Platform;
use crate::tasks::{self, Context, Task};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "PAM_LIMITS_CONFIG";

/// Shared state produced by the common command setup sequence.
#[derive(Debug)]
pub struct CommandSetup {
    /// Detected or overridden target platform.
    pub platform: Platform,
    /// Loaded `limits.toml`.
    pub config: Config,
}

impl CommandSetup {
    /// Resolve the platform, load the configuration and report warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform cannot be determined or the
    /// configuration file cannot be read or parsed.
    pub fn init(global: &GlobalOpts, log: &Logger) -> Result<Self> {
        let platform = resolve_platform(global)?;
        log.debug(&format!("platform: {}", platform.identifier()));

        let path = resolve_config_path(global, std::env::var_os(CONFIG_ENV));
        log.stage("Loading configuration");
        let config = Config::load(&path)
            .with_context(|| format!("loading configuration from {}", path.display()))?;
        log.info(&format!(
            "loaded {} fragment(s) from {}",
            config.fragments.len(),
            path.display()
        ));

        let warnings = config.validate();
        if !warnings.is_empty() {
            log.warn(&format!(
                "found {} configuration warning(s):",
                warnings.len()
            ));
            for warning in &warnings {
                log.warn(&format!(
                    "  {} [{}]: {}",
                    warning.source, warning.item, warning.message
                ));
            }
        }

        Ok(Self { platform, config })
    }
}

/// Configuration path: `--config`, then `$PAM_LIMITS_CONFIG`, then `./limits.toml`.
#[must_use]
pub fn resolve_config_path(global: &GlobalOpts, env: Option<std::ffi::OsString>) -> PathBuf {
    global
        .config
        .clone()
        .or_else(|| env.filter(|v| !v.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Target platform: the `--platform` override, or the detected host.
///
/// # Errors
///
/// Returns an error if the override is not a known identifier or detection fails.
pub fn resolve_platform(global: &GlobalOpts) -> Result<Platform> {
    match global.platform.as_deref() {
        Some(id) => id
            .parse()
            .with_context(|| format!("invalid --platform '{id}'")),
        None => Platform::detect().context("detecting platform (use --platform to override)"),
    }
}

/// Root that target paths are placed under (`--root`, default `/`).
#[must_use]
pub fn resolve_root(global: &GlobalOpts) -> &Path {
    global.root.as_deref().unwrap_or_else(|| Path::new("/"))
}

/// Execute every task in dependency order, print the summary, and bail if
/// any task failed.
///
/// # Errors
///
/// Returns an error if the task graph has a cycle or one or more tasks
/// recorded a failure.
pub fn run_tasks_to_completion(tasks: &[&dyn Task], ctx: &Context<'_>, log: &Logger) -> Result<()> {
    tasks::run_all(tasks, ctx)?;

    log.print_summary();

    let count = log.failure_count();
    if count > 0 {
        anyhow::bail!("{count} task(s) failed");
    }
    Ok(())
}
