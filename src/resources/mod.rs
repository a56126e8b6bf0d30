//! Idempotent resource primitives (check + apply pattern).
pub mod directory;
pub mod error;
pub mod file;
#[cfg(unix)]
pub mod ownership;
pub mod package;

use anyhow::Result;

/// Something `apply` can put in place.
///
/// Packages only implement this: their state comes from one batched query
/// per task. Files and the `limits.d` directory also implement [`Resource`].
pub trait Applicable {
    /// Label used in log lines, e.g. `/etc/security/limits.d/80-nproc.conf (present)`.
    fn description(&self) -> String;

    /// Bring the resource to its declared state.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be changed (I/O, permissions,
    /// a failing package manager).
    fn apply(&self) -> Result<ResourceChange>;

    /// Take the resource away again.
    ///
    /// # Errors
    ///
    /// Fails unless the resource overrides it.
    fn remove(&self) -> Result<ResourceChange> {
        anyhow::bail!("{} cannot be removed", self.description())
    }
}

/// What a check found on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Not there at all.
    Missing,
    /// Matches the declaration.
    Correct,
    /// There, but different (content, mode, owner or stray files).
    Incorrect {
        /// What differs, e.g. `mode 0600`.
        current: String,
    },
    /// Cannot be fixed automatically, e.g. a directory where a fragment
    /// file should be.
    Invalid {
        /// Why it is left alone.
        reason: String,
    },
}

/// What `apply` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// The host was changed.
    Applied,
    /// Nothing had to change.
    AlreadyCorrect,
    /// The change was not made.
    Skipped {
        /// Why not.
        reason: String,
    },
}

/// An [`Applicable`] that can inspect its own state.
pub trait Resource: Applicable {
    /// Inspect the host.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be read.
    fn current_state(&self) -> Result<ResourceState>;

    /// `true` for [`ResourceState::Missing`] and [`ResourceState::Incorrect`].
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Resource::current_state`].
    fn needs_change(&self) -> Result<bool> {
        Ok(matches!(
            self.current_state()?,
            ResourceState::Missing | ResourceState::Incorrect { .. }
        ))
    }
}
