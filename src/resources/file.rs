//! Managed fragment file: writes a rendered [`FileResource`] to disk.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

#[cfg(unix)]
use super::ownership::Ownership;
use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::config::source::resolve_source;
use crate::fragment::{Ensure, FileResource};

/// Where the bytes of a managed file come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileBody {
    /// Rendered content.
    Content(String),
    /// Local file copied verbatim.
    Source(PathBuf),
    /// Nothing to write; the file is removed.
    Absent,
}

/// A file on disk that should match a [`FileResource`] description.
#[derive(Debug, Clone)]
pub struct ManagedFile {
    /// Target path, with any root prefix applied.
    pub target: PathBuf,
    /// Desired state.
    pub ensure: Ensure,
    /// Desired bytes.
    pub body: FileBody,
    /// Permission bits.
    pub mode: u32,
    /// Owning user name.
    pub owner: String,
    /// Owning group name.
    pub group: String,
    /// Whether ownership is checked and changed.
    pub manage_ownership: bool,
}

/// Re-anchor an absolute path under `root` (`/` leaves it unchanged).
#[must_use]
pub fn under_root(root: &Path, path: &Path) -> PathBuf {
    root.join(path.strip_prefix("/").unwrap_or(path))
}

/// Parse an octal mode string such as `"0644"`.
///
/// # Errors
///
/// Returns an error if `mode` is not a valid octal number.
pub fn parse_mode(mode: &str) -> Result<u32> {
    u32::from_str_radix(mode, 8).with_context(|| format!("invalid octal mode: {mode}"))
}

impl ManagedFile {
    /// Build from a rendered description.
    ///
    /// `root` relocates the target path; `base_dir` anchors relative sources.
    ///
    /// # Errors
    ///
    /// Returns an error if the mode is invalid, the source scheme is not
    /// supported, or a file to be written carries neither content nor source.
    /// Sources of `absent` files are never resolved.
    pub fn from_resource(
        file: &FileResource,
        root: &Path,
        base_dir: &Path,
        manage_ownership: bool,
    ) -> Result<Self> {
        let body = match (&file.content, &file.source) {
            _ if !file.ensure.creates_file() => FileBody::Absent,
            (Some(content), _) => FileBody::Content(content.clone()),
            (None, Some(source)) => FileBody::Source(resolve_source(source, base_dir)?),
            (None, None) => {
                anyhow::bail!("{} has neither content nor source", file.path.display())
            }
        };
        Ok(Self {
            target: under_root(root, &file.path),
            ensure: file.ensure,
            body,
            mode: parse_mode(&file.mode)?,
            owner: file.owner.clone(),
            group: file.group.clone(),
            manage_ownership,
        })
    }

    fn desired_bytes(&self) -> Result<Vec<u8>> {
        match &self.body {
            FileBody::Content(content) => Ok(content.clone().into_bytes()),
            FileBody::Source(path) => std::fs::read(path)
                .with_context(|| format!("reading source {}", path.display())),
            FileBody::Absent => anyhow::bail!("{} is not written", self.target.display()),
        }
    }

    fn exists(&self) -> bool {
        self.target.symlink_metadata().is_ok()
    }

    fn write(&self) -> Result<()> {
        let bytes = self.desired_bytes()?;
        if let Some(parent) = self.target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }

        let staging = self.target.with_extension("conf.pam-limits-tmp");
        let staged = std::fs::write(&staging, &bytes)
            .with_context(|| format!("writing {}", staging.display()))
            .and_then(|()| self.install_staged(&staging));
        if staged.is_err() {
            // a failed write must not leave a stray file in limits.d
            let _ = std::fs::remove_file(&staging);
        }
        staged
    }

    fn install_staged(&self, staging: &Path) -> Result<()> {
        set_mode(staging, self.mode)?;
        if self.manage_ownership {
            self.chown(staging)?;
        }
        std::fs::rename(staging, &self.target).with_context(|| {
            format!("renaming {} to {}", staging.display(), self.target.display())
        })
    }

    #[cfg(unix)]
    fn chown(&self, path: &Path) -> Result<()> {
        let desired = Ownership::resolve(&self.owner, &self.group)?;
        desired
            .apply_to(path)
            .with_context(|| format!("chown {}:{} {}", self.owner, self.group, path.display()))
    }

    #[cfg(not(unix))]
    fn chown(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    /// Compare metadata of an existing target; `None` means it matches.
    #[cfg(unix)]
    fn metadata_drift(&self) -> Result<Option<String>> {
        use std::os::unix::fs::PermissionsExt as _;

        let current_mode = std::fs::metadata(&self.target)?.permissions().mode() & 0o7777;
        if current_mode != self.mode {
            return Ok(Some(format!("mode {current_mode:04o}")));
        }
        if self.manage_ownership {
            let desired = Ownership::resolve(&self.owner, &self.group)?;
            let current = Ownership::of(&self.target)?;
            if current != desired {
                return Ok(Some(format!("owner {}:{}", current.uid, current.gid)));
            }
        }
        Ok(None)
    }

    #[cfg(not(unix))]
    fn metadata_drift(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

impl Applicable for ManagedFile {
    fn description(&self) -> String {
        format!("{} ({})", self.target.display(), self.ensure)
    }

    fn apply(&self) -> Result<ResourceChange> {
        if self.ensure.creates_file() {
            self.write()?;
            Ok(ResourceChange::Applied)
        } else {
            self.remove()
        }
    }

    fn remove(&self) -> Result<ResourceChange> {
        if !self.exists() {
            return Ok(ResourceChange::AlreadyCorrect);
        }
        std::fs::remove_file(&self.target)
            .with_context(|| format!("removing {}", self.target.display()))?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for ManagedFile {
    fn current_state(&self) -> Result<ResourceState> {
        if self.target.is_dir() {
            return Ok(ResourceState::Invalid {
                reason: format!("{} is a directory", self.target.display()),
            });
        }

        if !self.ensure.creates_file() {
            return Ok(if self.exists() {
                ResourceState::Incorrect {
                    current: "present".to_string(),
                }
            } else {
                ResourceState::Correct
            });
        }

        if !self.exists() {
            return Ok(ResourceState::Missing);
        }

        let current = std::fs::read(&self.target)
            .with_context(|| format!("reading {}", self.target.display()))?;
        if current != self.desired_bytes()? {
            return Ok(ResourceState::Incorrect {
                current: "content differs".to_string(),
            });
        }

        Ok(self
            .metadata_drift()?
            .map_or(ResourceState::Correct, |current| ResourceState::Incorrect { current }))
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt as _;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .with_context(|| format!("set permissions: {}", path.display()))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
