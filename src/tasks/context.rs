//! Shared state handed to every task.
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::config::Config;
use crate::exec::Executor;
use crate::fragment::{self, FileResource};
use crate::logging::Log;
use crate::platform::Platform;

/// Shared context for task execution.
pub struct Context<'a> {
    /// Loaded `limits.toml`.
    pub config: &'a Config,
    /// Target platform (detected or overridden with `--platform`).
    pub platform: &'a Platform,
    /// Every declared fragment, rendered for `platform`, in name order.
    pub files: Vec<FileResource>,
    /// Prefix under which absolute target paths are materialized.
    pub root: PathBuf,
    /// Logger for output and task recording.
    pub log: &'a dyn Log,
    /// Whether to perform a dry run (preview changes without applying).
    pub dry_run: bool,
    /// Command executor (for testing or real system calls).
    pub executor: &'a dyn Executor,
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config.path)
            .field("platform", &self.platform)
            .field("files", &self.files.len())
            .field("root", &self.root)
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("executor", &self.executor)
            .finish()
    }
}

impl<'a> Context<'a> {
    /// Render every fragment and build a context for task execution.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first fragment that fails to render.
    pub fn new(
        config: &'a Config,
        platform: &'a Platform,
        log: &'a dyn Log,
        executor: &'a dyn Executor,
        root: &Path,
        dry_run: bool,
    ) -> Result<Self> {
        let files = config
            .render_all(platform)
            .into_iter()
            .map(|(decl, result)| {
                result.with_context(|| format!("rendering fragment '{}'", decl.name))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            config,
            platform,
            files,
            root: root.to_path_buf(),
            log,
            dry_run,
            executor,
        })
    }

    /// The `limits.d` directory under [`root`](Self::root).
    #[must_use]
    pub fn limits_dir(&self) -> PathBuf {
        crate::resources::file::under_root(&self.root, Path::new(fragment::LIMITS_D_DIR))
    }
}
