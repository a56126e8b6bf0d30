//! Named, dependency-ordered tasks that orchestrate resource changes.
mod context;
pub mod directory;
pub mod fragments;
pub mod graph;
pub mod packages;
mod processing;

/// Implement [`Task::dependencies`] by expanding to the required
/// `fn dependencies(&self) -> &[TypeId]` method body.
///
/// The `const DEPS` intermediate gives the slice the `'static` lifetime the
/// return type needs.
///
/// # Examples
///
/// ```ignore
/// task_deps![super::packages::InstallPackages, super::directory::ManageLimitsDirectory]
/// ```
macro_rules! task_deps {
    [$($dep:ty),+ $(,)?] => {
        fn dependencies(&self) -> &[std::any::TypeId] {
            const DEPS: &[std::any::TypeId] = &[$(std::any::TypeId::of::<$dep>()),+];
            DEPS
        }
    };
}

pub(crate) use task_deps;

pub use context::Context;
pub use processing::{ProcessOpts, TaskResult, TaskStats, process_resources};

use std::any::TypeId;

use anyhow::Result;

use crate::logging::TaskStatus;

/// A named, executable task.
///
/// The `'static` bound gives each task struct a stable [`TypeId`], which is
/// how dependencies are declared (see [`Task::dependencies`]).
pub trait Task: Send + Sync + 'static {
    /// Human-readable task name.
    fn name(&self) -> &str;

    /// The concrete `TypeId` of this task, used as a dependency identifier.
    fn task_id(&self) -> TypeId {
        TypeId::of::<Self>()
    }

    /// Tasks that must complete before this task starts.
    ///
    /// If any of them fails, this task is recorded as skipped without running.
    fn dependencies(&self) -> &[TypeId] {
        &[]
    }

    /// Whether this task applies to the current platform and settings.
    fn should_run(&self, ctx: &Context<'_>) -> bool;

    /// Execute the task.
    ///
    /// # Errors
    ///
    /// Returns an error if a package command fails, a file cannot be written,
    /// or a state check cannot be completed.
    fn run(&self, ctx: &Context<'_>) -> Result<TaskResult>;
}

/// The complete set of tasks run by the `apply` command.
///
/// Order within the list is arbitrary; [`graph::execution_order`] derives
/// the order from each task's [`Task::dependencies`].
#[must_use]
pub fn all_apply_tasks() -> Vec<Box<dyn Task>> {
    vec![
        Box::new(fragments::ApplyFragments),
        Box::new(directory::ManageLimitsDirectory),
        Box::new(packages::InstallPackages),
    ]
}

/// Execute a task, recording the result in the logger.
pub fn execute(task: &dyn Task, ctx: &Context<'_>) -> TaskStatus {
    if !task.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping task: {} (not applicable)", task.name()));
        ctx.log
            .record_task(task.name(), TaskStatus::NotApplicable, None);
        return TaskStatus::NotApplicable;
    }

    ctx.log.stage(task.name());

    let (status, message) = match task.run(ctx) {
        Ok(TaskResult::Ok) => (TaskStatus::Ok, None),
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log.info(&format!("skipped: {reason}"));
            (TaskStatus::Skipped, Some(reason))
        }
        Ok(TaskResult::DryRun) => (TaskStatus::DryRun, None),
        Err(e) => {
            ctx.log.error(&format!("{}: {e:#}", task.name()));
            (TaskStatus::Failed, Some(format!("{e:#}")))
        }
    };
    ctx.log.record_task(task.name(), status, message.as_deref());
    status
}

/// Run `tasks` in dependency order.
///
/// A task whose dependency failed (or was itself skipped for that reason) is
/// recorded as [`TaskStatus::Skipped`] with the reason
/// `dependency '<name>' failed` and is not run.
///
/// # Errors
///
/// Returns an error if the dependency graph contains a cycle.
pub fn run_all(tasks: &[&dyn Task], ctx: &Context<'_>) -> Result<()> {
    let ordered = graph::execution_order(tasks)?;
    let mut blocked: Vec<(TypeId, String)> = Vec::new();

    for task in ordered {
        let failed_dep = task
            .dependencies()
            .iter()
            .find_map(|dep| blocked.iter().find(|(id, _)| id == dep));
        if let Some((_, dep_name)) = failed_dep {
            let reason = format!("dependency '{dep_name}' failed");
            ctx.log.warn(&format!("{}: {reason}", task.name()));
            ctx.log
                .record_task(task.name(), TaskStatus::Skipped, Some(&reason));
            blocked.push((task.task_id(), task.name().to_string()));
            continue;
        }

        if execute(task, ctx) == TaskStatus::Failed {
            blocked.push((task.task_id(), task.name().to_string()));
        }
    }
    Ok(())
}

/// Shared helpers for task unit tests.
#[cfg(test)]
#[allow(clippy::expect_used)]
pub mod test_helpers {
    use std::path::{Path, PathBuf};

    use super::Context;
    use crate::config::Config;
    use crate::logging::Logger;
    use crate::platform::{OsFamily, Platform};
    use crate::resources::test_helpers::MockExecutor;

    /// Everything a [`Context`] borrows, rooted in a fresh temp dir.
    ///
    /// Ownership management is switched off so tests pass without root.
    #[derive(Debug)]
    pub struct TestEnv {
        /// Target root for materialized files.
        pub dir: tempfile::TempDir,
        /// Parsed configuration.
        pub config: Config,
        /// Target platform (Debian 12 unless overridden).
        pub platform: Platform,
        /// Logger recording task results.
        pub log: Logger,
        /// Executor answering package queries.
        pub executor: MockExecutor,
    }

    impl TestEnv {
        /// Parse `toml` as `limits.toml` inside a fresh temp dir.
        #[must_use]
        pub fn new(toml: &str) -> Self {
            let dir = tempfile::tempdir().expect("create temp dir");
            let mut config = Config::from_toml_str(toml, &dir.path().join("limits.toml"))
                .expect("parse test config");
            config.settings.manage_ownership = false;
            Self {
                dir,
                config,
                platform: Platform::new(OsFamily::Debian, "12"),
                log: Logger::with_log_file(None),
                executor: MockExecutor::with_responses(vec![]),
            }
        }

        /// Replace the target platform.
        #[must_use]
        pub fn with_platform(mut self, platform: Platform) -> Self {
            self.platform = platform;
            self
        }

        /// Replace the executor.
        #[must_use]
        pub fn with_executor(mut self, executor: MockExecutor) -> Self {
            self.executor = executor;
            self
        }

        /// Root directory that target paths are placed under.
        #[must_use]
        pub fn root(&self) -> &Path {
            self.dir.path()
        }

        /// Path of a fragment file under the test root.
        #[must_use]
        pub fn fragment_file(&self, name: &str) -> PathBuf {
            self.root()
                .join("etc/security/limits.d")
                .join(format!("{name}.conf"))
        }

        /// Build a context borrowing this environment.
        #[must_use]
        pub fn context(&self, dry_run: bool) -> Context<'_> {
            Context::new(
                &self.config,
                &self.platform,
                &self.log,
                &self.executor,
                self.root(),
                dry_run,
            )
            .expect("build test context")
        }
    }
}
