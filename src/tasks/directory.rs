//! Task keeping `/etc/security/limits.d` in shape.
use std::collections::BTreeSet;

use anyhow::Result;

use super::{Context, ProcessOpts, Task, TaskResult, process_resources, task_deps};
use crate::resources::directory::LimitsDirectory;

/// Ensure `limits.d` exists with the right mode, purging unmanaged fragments
/// when `settings.purge` is set.
#[derive(Debug)]
pub struct ManageLimitsDirectory;

impl ManageLimitsDirectory {
    fn resource(ctx: &Context<'_>) -> LimitsDirectory {
        let managed: BTreeSet<String> = ctx
            .files
            .iter()
            .filter(|f| f.ensure.creates_file())
            .filter_map(|f| f.path.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .collect();
        LimitsDirectory::new(ctx.limits_dir(), managed, ctx.config.settings.purge)
    }
}

impl Task for ManageLimitsDirectory {
    fn name(&self) -> &'static str {
        "Manage limits directory"
    }

    task_deps![super::packages::InstallPackages];

    fn should_run(&self, _ctx: &Context<'_>) -> bool {
        true
    }

    fn run(&self, ctx: &Context<'_>) -> Result<TaskResult> {
        let resource = Self::resource(ctx);
        ctx.log.debug(&format!(
            "{} managed fragment(s), purge {}",
            resource.managed.len(),
            if resource.purge { "on" } else { "off" }
        ));
        process_resources(ctx, [resource], &ProcessOpts::apply_all("manage"))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tasks::test_helpers::TestEnv;

    const CONFIG: &str = r#"
[settings]
purge = true

[fragment.80-nproc]
list = ["*  soft  nproc  4096"]

[fragment.10-old]
ensure = "absent"
list = []
"#;

    #[test]
    fn managed_set_excludes_absent_fragments() {
        let env = TestEnv::new(CONFIG);
        let ctx = env.context(false);
        let resource = ManageLimitsDirectory::resource(&ctx);
        assert_eq!(
            resource.managed.into_iter().collect::<Vec<_>>(),
            vec!["80-nproc.conf".to_string()]
        );
        assert!(resource.purge);
    }

    #[test]
    fn creates_directory_and_purges() {
        let env = TestEnv::new(CONFIG);
        let dir = env.root().join("etc/security/limits.d");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("99-stray.conf"), "").unwrap();

        let ctx = env.context(false);
        assert!(matches!(ManageLimitsDirectory.run(&ctx).unwrap(), TaskResult::Ok));
        assert!(dir.is_dir());
        assert!(!dir.join("99-stray.conf").exists());
    }

    #[test]
    fn dry_run_leaves_directory_alone() {
        let env = TestEnv::new(CONFIG);
        let ctx = env.context(true);
        assert!(matches!(ManageLimitsDirectory.run(&ctx).unwrap(), TaskResult::DryRun));
        assert!(!env.root().join("etc/security/limits.d").exists());
    }
}
