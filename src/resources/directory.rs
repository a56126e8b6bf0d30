//! The `limits.d` directory itself, optionally purged of unmanaged fragments.
use anyhow::{Context as _, Result};
use std::collections::BTreeSet;
use std::path::PathBuf;

use super::{Applicable, Resource, ResourceChange, ResourceState};

/// Permission mode of the `limits.d` directory.
pub const LIMITS_D_MODE: u32 = 0o755;

/// Extension of files PAM reads from `limits.d`.
const FRAGMENT_EXTENSION: &str = "conf";

/// The directory holding limits fragments.
#[derive(Debug, Clone)]
pub struct LimitsDirectory {
    /// Directory path, with any root prefix applied.
    pub path: PathBuf,
    /// File names (e.g. `80-nproc.conf`) declared by fragments.
    pub managed: BTreeSet<String>,
    /// Whether unmanaged `*.conf` files are removed.
    pub purge: bool,
}

impl LimitsDirectory {
    /// Create a directory resource.
    #[must_use]
    pub const fn new(path: PathBuf, managed: BTreeSet<String>, purge: bool) -> Self {
        Self {
            path,
            managed,
            purge,
        }
    }

    /// `*.conf` files present in the directory that no fragment declares.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn unmanaged_files(&self) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        for entry in std::fs::read_dir(&self.path)
            .with_context(|| format!("reading directory {}", self.path.display()))?
        {
            let entry = entry?;
            let path = entry.path();
            let is_fragment = path
                .extension()
                .is_some_and(|ext| ext == FRAGMENT_EXTENSION);
            let name = entry.file_name().to_string_lossy().to_string();
            if is_fragment && path.is_file() && !self.managed.contains(&name) {
                found.push(path);
            }
        }
        found.sort();
        Ok(found)
    }

    #[cfg(unix)]
    fn current_mode(&self) -> Result<u32> {
        use std::os::unix::fs::PermissionsExt as _;
        Ok(std::fs::metadata(&self.path)?.permissions().mode() & 0o7777)
    }

    #[cfg(not(unix))]
    fn current_mode(&self) -> Result<u32> {
        Ok(LIMITS_D_MODE)
    }

    #[cfg(unix)]
    fn set_mode(&self) -> Result<()> {
        use std::os::unix::fs::PermissionsExt as _;
        std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(LIMITS_D_MODE))
            .with_context(|| format!("set permissions: {}", self.path.display()))
    }

    #[cfg(not(unix))]
    fn set_mode(&self) -> Result<()> {
        Ok(())
    }
}

impl Applicable for LimitsDirectory {
    fn description(&self) -> String {
        if self.purge {
            format!("{} (purge)", self.path.display())
        } else {
            self.path.display().to_string()
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        std::fs::create_dir_all(&self.path)
            .with_context(|| format!("creating directory {}", self.path.display()))?;
        self.set_mode()?;
        if self.purge {
            for file in self.unmanaged_files()? {
                std::fs::remove_file(&file)
                    .with_context(|| format!("purging {}", file.display()))?;
            }
        }
        Ok(ResourceChange::Applied)
    }
}

impl Resource for LimitsDirectory {
    fn current_state(&self) -> Result<ResourceState> {
        if !self.path.exists() {
            return Ok(ResourceState::Missing);
        }
        if !self.path.is_dir() {
            return Ok(ResourceState::Invalid {
                reason: format!("{} is not a directory", self.path.display()),
            });
        }

        let mode = self.current_mode()?;
        if mode != LIMITS_D_MODE {
            return Ok(ResourceState::Incorrect {
                current: format!("mode {mode:04o}"),
            });
        }

        if self.purge {
            let unmanaged = self.unmanaged_files()?;
            if !unmanaged.is_empty() {
                let names: Vec<String> = unmanaged
                    .iter()
                    .filter_map(|p| p.file_name())
                    .map(|n| n.to_string_lossy().to_string())
                    .collect();
                return Ok(ResourceState::Incorrect {
                    current: format!("unmanaged: {}", names.join(", ")),
                });
            }
        }

        Ok(ResourceState::Correct)
    }
}
