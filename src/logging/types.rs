//! Task outcomes and the [`Log`] seam tasks report through.

/// Tracing target of stage headers.
pub(super) const STAGE_TARGET: &str = "pam_limits::stage";
/// Tracing target of dry-run actions.
pub(super) const DRY_RUN_TARGET: &str = "pam_limits::dry_run";

/// Outcome of one task, kept for the end-of-run summary.
#[derive(Debug, Clone)]
pub struct TaskEntry {
    /// Task name as shown to the user (e.g. `Apply fragments`).
    pub name: String,
    /// How the task ended.
    pub status: TaskStatus,
    /// Skip reason or error text.
    pub message: Option<String>,
}

impl TaskEntry {
    /// One coloured summary line: symbol, name and optional reason.
    #[must_use]
    pub fn summary_line(&self) -> String {
        let reason = self
            .message
            .as_ref()
            .map_or_else(String::new, |msg| format!(" ({msg})"));
        format!(
            "{}{} {}{reason}\x1b[0m",
            self.status.colour(),
            self.status.symbol(),
            self.name
        )
    }
}

/// How a task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Changes applied, or nothing to change.
    Ok,
    /// Nothing to do on this host (no packages, no fragments).
    NotApplicable,
    /// Not run, usually because a dependency failed.
    Skipped,
    /// Pending changes were only logged.
    DryRun,
    /// The task returned an error.
    Failed,
}

impl TaskStatus {
    /// Every status, in summary order.
    pub const ALL: [Self; 5] = [
        Self::Ok,
        Self::NotApplicable,
        Self::Skipped,
        Self::DryRun,
        Self::Failed,
    ];

    /// Symbol printed in front of the task name.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Ok => "✓",
            Self::NotApplicable => "·",
            Self::Skipped => "○",
            Self::DryRun => "~",
            Self::Failed => "✗",
        }
    }

    /// ANSI colour of the summary line.
    #[must_use]
    pub const fn colour(self) -> &'static str {
        match self {
            Self::Ok => "\x1b[32m",
            Self::NotApplicable => "\x1b[2m",
            Self::Skipped => "\x1b[33m",
            Self::DryRun => "\x1b[37m",
            Self::Failed => "\x1b[31m",
        }
    }

    /// Label used in the totals line.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NotApplicable => "n/a",
            Self::Skipped => "skipped",
            Self::DryRun => "dry-run",
            Self::Failed => "failed",
        }
    }
}

/// Logging seam for tasks and commands.
///
/// [`Logger`](super::Logger) is the only production implementation; it
/// routes everything through `tracing`.
pub trait Log: Send + Sync {
    /// Section header (`==> ...`).
    fn stage(&self, msg: &str);
    /// Progress line.
    fn info(&self, msg: &str);
    /// Detail shown with `--verbose` and always written to the log file.
    fn debug(&self, msg: &str);
    /// Non-fatal problem.
    fn warn(&self, msg: &str);
    /// Fatal problem of one task.
    fn error(&self, msg: &str);
    /// A change `--dry-run` held back.
    fn dry_run(&self, msg: &str);
    /// Remember how a task ended.
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>);
}
