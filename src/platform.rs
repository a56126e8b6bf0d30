//! Platform facts: OS family, release and the short identifier used on the command line.
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::PlatformError;

/// Operating system family, as far as the limits.d package layout is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    /// Debian.
    Debian,
    /// Ubuntu.
    Ubuntu,
    /// RHEL and rebuilds (CentOS, Oracle Linux, Scientific, Rocky, Alma).
    RedHat,
    /// SUSE Linux Enterprise Server/Desktop and openSUSE.
    Suse,
    /// Solaris and illumos.
    Solaris,
}

impl OsFamily {
    /// Identifier prefix used in platform identifiers (`el` for `el8`).
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Debian => "debian",
            Self::Ubuntu => "ubuntu",
            Self::RedHat => "el",
            Self::Suse => "suse",
            Self::Solaris => "solaris",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debian => write!(f, "Debian"),
            Self::Ubuntu => write!(f, "Ubuntu"),
            Self::RedHat => write!(f, "RedHat"),
            Self::Suse => write!(f, "Suse"),
            Self::Solaris => write!(f, "Solaris"),
        }
    }
}

/// Platform facts for the target host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    /// OS family.
    pub family: OsFamily,
    /// Major release (`12`, `8`, `15`, `11`); Ubuntu keeps `major.minor`.
    pub release_major: String,
}

impl Platform {
    /// Create a platform with explicit values.
    #[must_use]
    pub fn new(family: OsFamily, release_major: impl Into<String>) -> Self {
        Self {
            family,
            release_major: release_major.into(),
        }
    }

    /// Detect the platform of the running host.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::DetectionFailed`] if the OS cannot be identified.
    pub fn detect() -> Result<Self, PlatformError> {
        if cfg!(any(target_os = "solaris", target_os = "illumos")) {
            let release = crate::exec::run("uname", &["-r"])
                .map_err(|e| PlatformError::DetectionFailed(format!("uname -r: {e:#}")))?;
            return Self::from_solaris_release(release.stdout.trim());
        }
        Self::from_os_release_file(Path::new("/etc/os-release"))
    }

    /// Read platform facts from an `os-release` file.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::DetectionFailed`] if the file cannot be read
    /// or does not describe a supported OS.
    pub fn from_os_release_file(path: &Path) -> Result<Self, PlatformError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PlatformError::DetectionFailed(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_os_release(&content)
    }

    /// Parse the contents of an `os-release` file.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::DetectionFailed`] if `ID`/`VERSION_ID` are
    /// missing or the distribution is not supported.
    pub fn from_os_release(content: &str) -> Result<Self, PlatformError> {
        let mut id = None;
        let mut id_like = String::new();
        let mut version_id = None;
        for line in content.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"').trim_matches('\'');
            match key.trim() {
                "ID" => id = Some(value.to_lowercase()),
                "ID_LIKE" => id_like = value.to_lowercase(),
                "VERSION_ID" => version_id = Some(value.to_string()),
                _ => {}
            }
        }

        let id = id.ok_or_else(|| PlatformError::DetectionFailed("os-release has no ID".into()))?;
        let version = version_id.ok_or_else(|| {
            PlatformError::DetectionFailed(format!("os-release for '{id}' has no VERSION_ID"))
        })?;
        let family = family_from_id(&id, &id_like).ok_or_else(|| {
            PlatformError::DetectionFailed(format!("unsupported distribution '{id}'"))
        })?;

        let release_major = if family == OsFamily::Ubuntu {
            version
        } else {
            major_of(&version).to_string()
        };
        Ok(Self::new(family, release_major))
    }

    /// Build platform facts from a Solaris kernel release (`5.11`).
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::DetectionFailed`] if the release is not of the
    /// `5.N` form.
    pub fn from_solaris_release(release: &str) -> Result<Self, PlatformError> {
        match release.split_once('.') {
            Some(("5", minor))
                if !minor.is_empty() && minor.chars().all(|c| c.is_ascii_digit()) =>
            {
                Ok(Self::new(OsFamily::Solaris, minor))
            }
            _ => Err(PlatformError::DetectionFailed(format!(
                "unrecognised Solaris release '{release}'"
            ))),
        }
    }

    /// Short identifier such as `debian12`, `el8` or `ubuntu2204`.
    #[must_use]
    pub fn identifier(&self) -> String {
        format!(
            "{}{}",
            self.family.prefix(),
            self.release_major.replace('.', "")
        )
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.family, self.release_major)
    }
}

impl FromStr for Platform {
    type Err = PlatformError;

    /// Parse an identifier produced by [`Platform::identifier`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let split = s.find(|c: char| c.is_ascii_digit()).unwrap_or(s.len());
        let (prefix, digits) = s.split_at(split);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(PlatformError::UnknownIdentifier(s.clone()));
        }
        let family = match prefix {
            "debian" => OsFamily::Debian,
            "ubuntu" => OsFamily::Ubuntu,
            "el" | "rhel" => OsFamily::RedHat,
            "suse" | "sles" => OsFamily::Suse,
            "solaris" => OsFamily::Solaris,
            _ => return Err(PlatformError::UnknownIdentifier(s.clone())),
        };
        let release_major = if family == OsFamily::Ubuntu {
            // ubuntu2204 -> 22.04
            if digits.len() != 4 {
                return Err(PlatformError::UnknownIdentifier(s.clone()));
            }
            let (major, minor) = digits.split_at(2);
            format!("{major}.{minor}")
        } else {
            digits.to_string()
        };
        Ok(Self::new(family, release_major))
    }
}

fn family_from_id(id: &str, id_like: &str) -> Option<OsFamily> {
    let by_id = match id {
        "debian" => Some(OsFamily::Debian),
        "ubuntu" => Some(OsFamily::Ubuntu),
        "rhel" | "centos" | "ol" | "scientific" | "rocky" | "almalinux" => {
            Some(OsFamily::RedHat)
        }
        "sles" | "sled" => Some(OsFamily::Suse),
        _ if id.starts_with("opensuse") => Some(OsFamily::Suse),
        _ => None,
    };
    by_id.or_else(|| {
        id_like.split_whitespace().find_map(|like| match like {
            "debian" => Some(OsFamily::Debian),
            "ubuntu" => Some(OsFamily::Ubuntu),
            "rhel" | "centos" => Some(OsFamily::RedHat),
            "suse" | "sles" => Some(OsFamily::Suse),
            _ => None,
        })
    })
}

fn major_of(version: &str) -> &str {
    version.split('.').next().unwrap_or(version)
}
