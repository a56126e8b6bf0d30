//! Check-then-apply loop over resources, with per-task statistics.
use anyhow::Result;

use super::context::Context;
use crate::resources::{Resource, ResourceChange, ResourceState};

/// Result of a single task execution.
///
/// # Examples
///
/// ```
/// use pam_limits::tasks::TaskResult;
///
/// let skipped = TaskResult::Skipped("no packages on solaris".into());
/// assert!(matches!(skipped, TaskResult::Skipped(_)));
/// ```
#[derive(Debug, Clone)]
pub enum TaskResult {
    /// Task completed successfully.
    Ok,
    /// Task was skipped.
    Skipped(String),
    /// Task ran in dry-run mode.
    DryRun,
}

/// Counters for batch tasks that process many items.
///
/// # Examples
///
/// ```
/// use pam_limits::tasks::TaskStats;
///
/// let stats = TaskStats { changed: 1, already_ok: 2, skipped: 3 };
/// assert_eq!(stats.summary(false), "1 changed, 2 already ok, 3 skipped");
/// assert_eq!(stats.summary(true), "1 would change, 2 already ok, 3 skipped");
/// ```
#[derive(Debug, Default)]
pub struct TaskStats {
    /// Number of items changed or applied.
    pub changed: u32,
    /// Number of items already in the correct state.
    pub already_ok: u32,
    /// Number of items skipped due to errors or inapplicability.
    pub skipped: u32,
}

impl TaskStats {
    /// Create a new empty stats counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Format the summary string (e.g. "3 changed, 10 already ok, 1 skipped").
    #[must_use]
    pub fn summary(&self, dry_run: bool) -> String {
        let verb = if dry_run { "would change" } else { "changed" };
        if self.skipped > 0 {
            format!(
                "{} {verb}, {} already ok, {} skipped",
                self.changed, self.already_ok, self.skipped
            )
        } else {
            format!("{} {verb}, {} already ok", self.changed, self.already_ok)
        }
    }

    /// Log the summary and return the appropriate `TaskResult`.
    #[must_use]
    pub fn finish(self, ctx: &Context<'_>) -> TaskResult {
        ctx.log.info(&self.summary(ctx.dry_run));
        if ctx.dry_run {
            TaskResult::DryRun
        } else {
            TaskResult::Ok
        }
    }
}

impl std::ops::AddAssign for TaskStats {
    fn add_assign(&mut self, other: Self) {
        self.changed += other.changed;
        self.already_ok += other.already_ok;
        self.skipped += other.skipped;
    }
}

/// How the processing loop reports each resource.
#[derive(Debug)]
pub struct ProcessOpts<'a> {
    /// Verb for log messages (e.g. "apply", "manage").
    pub verb: &'a str,
}

impl<'a> ProcessOpts<'a> {
    /// Fix both missing and incorrect resources.
    #[must_use]
    pub const fn apply_all(verb: &'a str) -> Self {
        Self { verb }
    }
}

/// Process resources by checking each one's current state and applying as needed.
///
/// # Errors
///
/// Returns an error if a state check or an apply fails, or if a resource
/// reports it was skipped during apply.
pub fn process_resources<R: Resource>(
    ctx: &Context<'_>,
    resources: impl IntoIterator<Item = R>,
    opts: &ProcessOpts<'_>,
) -> Result<TaskResult> {
    let mut stats = TaskStats::new();
    for resource in resources {
        let current = resource.current_state()?;
        stats += process_single(ctx, &resource, current, opts)?;
    }
    Ok(stats.finish(ctx))
}

/// Process a single resource given its current state, returning a stats delta.
fn process_single<R: Resource>(
    ctx: &Context<'_>,
    resource: &R,
    resource_state: ResourceState,
    opts: &ProcessOpts<'_>,
) -> Result<TaskStats> {
    let desc = resource.description();
    let mut delta = TaskStats::new();
    match resource_state {
        ResourceState::Correct => {
            ctx.log.debug(&format!("ok: {desc}"));
            delta.already_ok += 1;
        }
        ResourceState::Invalid { reason } => {
            ctx.log.warn(&format!("skipping {desc}: {reason}"));
            delta.skipped += 1;
        }
        resource_state @ (ResourceState::Missing | ResourceState::Incorrect { .. }) => {
            if ctx.dry_run {
                let msg = if let ResourceState::Incorrect { ref current } = resource_state {
                    format!("would {} {desc} (currently {current})", opts.verb)
                } else {
                    format!("would {}: {desc}", opts.verb)
                };
                ctx.log.dry_run(&msg);
                delta.changed += 1;
                return Ok(delta);
            }
            delta += apply_resource(ctx, resource, opts)?;
        }
    }
    Ok(delta)
}

/// Apply a single resource change, returning a stats delta.
fn apply_resource<R: Resource>(
    ctx: &Context<'_>,
    resource: &R,
    opts: &ProcessOpts<'_>,
) -> Result<TaskStats> {
    let desc = resource.description();
    let mut delta = TaskStats::new();
    match resource.apply()? {
        ResourceChange::Applied => {
            ctx.log.info(&format!("{}: {desc}", opts.verb));
            delta.changed += 1;
        }
        ResourceChange::AlreadyCorrect => {
            delta.already_ok += 1;
        }
        ResourceChange::Skipped { reason } => {
            anyhow::bail!("failed to {} {desc}: {reason}", opts.verb);
        }
    }
    Ok(delta)
}
