//! `apply`: bring the host in line with the declared fragments.
use anyhow::Result;

use super::{CommandSetup, resolve_root, run_tasks_to_completion};
use crate::cli::GlobalOpts;
use crate::exec::SystemExecutor;
use crate::logging::Logger;
use crate::tasks::{self, Context, Task};

/// Run the apply command.
///
/// # Errors
///
/// Returns an error if configuration loading or rendering fails, or if any
/// task fails.
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    log.info(&format!("pam-limits {}", super::version::version()));

    let setup = CommandSetup::init(global, log)?;
    let executor = SystemExecutor;
    let ctx = Context::new(
        &setup.config,
        &setup.platform,
        log,
        &executor,
        resolve_root(global),
        global.dry_run,
    )?;
    if ctx.dry_run {
        log.info("dry run: no changes will be made");
    }

    let all_tasks = tasks::all_apply_tasks();
    let task_refs: Vec<&dyn Task> = all_tasks.iter().map(Box::as_ref).collect();
    run_tasks_to_completion(&task_refs, &ctx, log)
}
