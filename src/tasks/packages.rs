//! Task installing the PAM packages the platform requires.
use anyhow::Result;

use super::{Context, Task, TaskResult, TaskStats};
use crate::packages::{limits_packages, package_manager};
use crate::resources::{Applicable as _, ResourceState};
use crate::resources::package::{PackageResource, batch_install_packages, get_installed_packages};

/// Install the packages that provide the `limits.d` convention.
#[derive(Debug)]
pub struct InstallPackages;

impl Task for InstallPackages {
    fn name(&self) -> &'static str {
        "Install packages"
    }

    fn should_run(&self, ctx: &Context<'_>) -> bool {
        ctx.config.settings.manage_packages
            && package_manager(ctx.platform).is_some()
            && !limits_packages(ctx.platform).is_empty()
    }

    fn run(&self, ctx: &Context<'_>) -> Result<TaskResult> {
        let Some(manager) = package_manager(ctx.platform) else {
            return Ok(TaskResult::Skipped(format!(
                "no package manager on {}",
                ctx.platform.identifier()
            )));
        };
        let names = limits_packages(ctx.platform);

        if !ctx.executor.which(manager.query_program()) {
            return Ok(TaskResult::Skipped(format!(
                "{} not found",
                manager.query_program()
            )));
        }

        ctx.log.debug(&format!(
            "batch-checking {} packages with a single query",
            names.len()
        ));
        let installed = get_installed_packages(manager, names, ctx.executor)?;

        let mut stats = TaskStats::new();
        let mut missing = Vec::new();
        for name in names {
            let resource = PackageResource::new((*name).to_string(), manager, ctx.executor);
            match resource.state_from_installed(&installed) {
                ResourceState::Correct => {
                    ctx.log.debug(&format!("ok: {}", resource.description()));
                    stats.already_ok += 1;
                }
                _ => missing.push(resource),
            }
        }

        if !missing.is_empty() {
            if ctx.dry_run {
                for resource in &missing {
                    ctx.log
                        .dry_run(&format!("would install: {}", resource.description()));
                }
            } else {
                let refs: Vec<&PackageResource<'_>> = missing.iter().collect();
                batch_install_packages(&refs)?;
                for resource in &missing {
                    ctx.log.info(&format!("installed: {}", resource.description()));
                }
            }
            stats.changed += u32::try_from(missing.len()).unwrap_or(u32::MAX);
        }

        Ok(stats.finish(ctx))
    }
}
