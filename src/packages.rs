//! Platform-keyed table of the packages that own the `limits.d` convention.
use std::fmt;

use crate::platform::{OsFamily, Platform};

const DEBIAN_PACKAGES: &[&str] = &["libpam0g", "libpam-modules", "libpam-runtime"];
const REDHAT_PACKAGES: &[&str] = &["pam"];
const SUSE_PACKAGES: &[&str] = &["pam"];
// PAM ships with the base OS on Solaris.
const SOLARIS_PACKAGES: &[&str] = &[];

/// Package manager used to query and install limits packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    /// `dpkg-query` / `apt-get`.
    Apt,
    /// `rpm` / `yum`.
    Yum,
    /// `rpm` / `zypper`.
    Zypper,
}

impl PackageManager {
    /// Program used to query installed packages.
    #[must_use]
    pub const fn query_program(self) -> &'static str {
        match self {
            Self::Apt => "dpkg-query",
            Self::Yum | Self::Zypper => "rpm",
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apt => write!(f, "apt"),
            Self::Yum => write!(f, "yum"),
            Self::Zypper => write!(f, "zypper"),
        }
    }
}

/// Packages providing `/etc/security/limits.d` on `platform`.
#[must_use]
pub const fn limits_packages(platform: &Platform) -> &'static [&'static str] {
    match platform.family {
        OsFamily::Debian | OsFamily::Ubuntu => DEBIAN_PACKAGES,
        OsFamily::RedHat => REDHAT_PACKAGES,
        OsFamily::Suse => SUSE_PACKAGES,
        OsFamily::Solaris => SOLARIS_PACKAGES,
    }
}

/// Package manager for `platform`, if limits packages are managed there.
#[must_use]
pub const fn package_manager(platform: &Platform) -> Option<PackageManager> {
    match platform.family {
        OsFamily::Debian | OsFamily::Ubuntu => Some(PackageManager::Apt),
        OsFamily::RedHat => Some(PackageManager::Yum),
        OsFamily::Suse => Some(PackageManager::Zypper),
        OsFamily::Solaris => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debian_and_redhat_sets_differ() {
        let debian = limits_packages(&Platform::new(OsFamily::Debian, "12"));
        let el = limits_packages(&Platform::new(OsFamily::RedHat, "8"));
        assert_ne!(debian, el);
        assert_eq!(el, &["pam"]);
    }

    #[test]
    fn ubuntu_shares_the_debian_set() {
        assert_eq!(
            limits_packages(&Platform::new(OsFamily::Ubuntu, "22.04")),
            limits_packages(&Platform::new(OsFamily::Debian, "11"))
        );
    }

    #[test]
    fn solaris_has_no_managed_packages() {
        let solaris = Platform::new(OsFamily::Solaris, "11");
        assert!(limits_packages(&solaris).is_empty());
        assert_eq!(package_manager(&solaris), None);
    }

    #[test]
    fn managers_per_family() {
        assert_eq!(
            package_manager(&Platform::new(OsFamily::Suse, "15")),
            Some(PackageManager::Zypper)
        );
        assert_eq!(PackageManager::Apt.to_string(), "apt");
        assert_eq!(PackageManager::Zypper.query_program(), "rpm");
    }
}
