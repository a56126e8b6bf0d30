//! Task writing and removing fragment files under `limits.d`.
use anyhow::Result;

use super::{Context, ProcessOpts, Task, TaskResult, process_resources, task_deps};
use crate::resources::file::ManagedFile;

/// Write (or remove) every declared fragment file.
#[derive(Debug)]
pub struct ApplyFragments;

impl Task for ApplyFragments {
    fn name(&self) -> &'static str {
        "Apply fragments"
    }

    task_deps![
        super::packages::InstallPackages,
        super::directory::ManageLimitsDirectory,
    ];

    fn should_run(&self, ctx: &Context<'_>) -> bool {
        !ctx.files.is_empty()
    }

    fn run(&self, ctx: &Context<'_>) -> Result<TaskResult> {
        let manage_ownership = ctx.config.settings.manage_ownership;
        let resources = ctx
            .files
            .iter()
            .map(|file| {
                ManagedFile::from_resource(file, &ctx.root, &ctx.config.base_dir, manage_ownership)
            })
            .collect::<Result<Vec<_>>>()?;

        ctx.log
            .debug(&format!("{} fragment(s) to check", resources.len()));
        process_resources(ctx, resources, &ProcessOpts::apply_all("apply"))
    }
}
