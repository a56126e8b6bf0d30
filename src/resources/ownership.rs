//! User and group resolution for managed files (Unix only).
use anyhow::{Context as _, Result};
use nix::unistd::{Gid, Group, Uid, User};
use std::path::Path;

use super::error::ResourceError;

/// Numeric owner of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ownership {
    /// User id.
    pub uid: u32,
    /// Group id.
    pub gid: u32,
}

impl Ownership {
    /// Resolve `owner` and `group` through the system account databases (NSS).
    ///
    /// Numeric names are taken as ids without a lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] if either name is unknown, or an
    /// error if the lookup itself fails.
    pub fn resolve(owner: &str, group: &str) -> Result<Self> {
        Ok(Self {
            uid: resolve_uid(owner)?,
            gid: resolve_gid(group)?,
        })
    }

    /// Ownership of an existing path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path's metadata cannot be read.
    pub fn of(path: &Path) -> std::io::Result<Self> {
        use std::os::unix::fs::MetadataExt as _;
        let meta = std::fs::metadata(path)?;
        Ok(Self {
            uid: meta.uid(),
            gid: meta.gid(),
        })
    }

    /// Change ownership of `path` to `self`.
    ///
    /// # Errors
    ///
    /// Returns an error if `chown` fails (typically when not running as root).
    pub fn apply_to(self, path: &Path) -> nix::Result<()> {
        nix::unistd::chown(
            path,
            Some(Uid::from_raw(self.uid)),
            Some(Gid::from_raw(self.gid)),
        )
    }
}

fn resolve_uid(name: &str) -> Result<u32> {
    if let Ok(id) = name.parse::<u32>() {
        return Ok(id);
    }
    let user = User::from_name(name).with_context(|| format!("looking up user '{name}'"))?;
    user.map(|u| u.uid.as_raw()).ok_or_else(|| {
        ResourceError::NotFound {
            resource: format!("user '{name}'"),
        }
        .into()
    })
}

fn resolve_gid(name: &str) -> Result<u32> {
    if let Ok(id) = name.parse::<u32>() {
        return Ok(id);
    }
    let group = Group::from_name(name).with_context(|| format!("looking up group '{name}'"))?;
    group.map(|g| g.gid.as_raw()).ok_or_else(|| {
        ResourceError::NotFound {
            resource: format!("group '{name}'"),
        }
        .into()
    })
}
