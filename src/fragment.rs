//! Fragment declarations and the pure render step.
//!
//! A fragment is one file under `/etc/security/limits.d/`. Its body comes
//! either from a list of literal limit lines or from an external source
//! reference; [`render`] validates the declaration and produces the
//! [`FileResource`] description that the apply engine later materialises.
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Directory holding PAM limits fragments.
pub const LIMITS_D_DIR: &str = "/etc/security/limits.d";

/// Owner of every rendered fragment.
pub const FRAGMENT_OWNER: &str = "root";

/// Group of every rendered fragment.
pub const FRAGMENT_GROUP: &str = "root";

/// Permission mode of every rendered fragment.
pub const FRAGMENT_MODE: &str = "0644";

/// Tool name used in the rendered header when none is configured.
pub const DEFAULT_HEADER_TOOL: &str = "pam-limits";

/// Errors raised while validating a fragment declaration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Neither `source` nor `list` was supplied.
    #[error("fragment '{name}' must specify source or list")]
    MissingContent {
        /// Name of the offending fragment.
        name: String,
    },

    /// The name cannot be used as a file stem.
    #[error("invalid fragment name '{name}': {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

/// Desired state of a fragment file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    /// The file exists with the rendered content.
    #[default]
    Present,
    /// The file does not exist.
    Absent,
    /// The file exists and is a regular file.
    File,
}

impl Ensure {
    /// Whether this state results in a file on disk.
    #[must_use]
    pub const fn creates_file(self) -> bool {
        matches!(self, Self::Present | Self::File)
    }
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => write!(f, "present"),
            Self::Absent => write!(f, "absent"),
            Self::File => write!(f, "file"),
        }
    }
}

impl std::str::FromStr for Ensure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            "file" => Ok(Self::File),
            other => Err(format!(
                "invalid ensure '{other}': must be one of present, absent, file"
            )),
        }
    }
}

/// Where a fragment's bytes come from.
///
/// # Examples
///
/// ```
/// use pam_limits::fragment::FragmentContent;
///
/// let content = FragmentContent::from_parts(
///     Some("files/nproc.conf".to_string()),
///     Some(vec!["* soft nproc 4096".to_string()]),
/// );
/// assert!(matches!(content, Some(FragmentContent::List(_))));
/// assert_eq!(FragmentContent::from_parts(None, None), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentContent {
    /// External reference whose bytes are copied verbatim.
    Source(String),
    /// Literal limit lines rendered below the managed-file header.
    List(Vec<String>),
}

impl FragmentContent {
    /// Combine the two optional declaration fields; `list` wins when both are set.
    #[must_use]
    pub fn from_parts(source: Option<String>, list: Option<Vec<String>>) -> Option<Self> {
        match (source, list) {
            (_, Some(list)) => Some(Self::List(list)),
            (Some(source), None) => Some(Self::Source(source)),
            (None, None) => None,
        }
    }
}

/// A fragment declaration as written in the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FragmentDecl {
    /// File stem under `limits.d` (filled from the table key).
    #[serde(skip)]
    pub name: String,
    /// Desired state; defaults to `present`.
    #[serde(default)]
    pub ensure: Ensure,
    /// External reference to copy the file from.
    pub source: Option<String>,
    /// Literal limit lines.
    pub list: Option<Vec<String>>,
}

impl FragmentDecl {
    /// Create a declaration with only a name set.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the desired state.
    #[must_use]
    pub const fn with_ensure(mut self, ensure: Ensure) -> Self {
        self.ensure = ensure;
        self
    }

    /// Set the source reference.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the list of limit lines.
    #[must_use]
    pub fn with_list<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.list = Some(lines.into_iter().map(Into::into).collect());
        self
    }
}

/// A validated fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// File stem under `limits.d`.
    pub name: String,
    /// Desired state.
    pub ensure: Ensure,
    /// Where the bytes come from.
    pub content: FragmentContent,
}

impl TryFrom<FragmentDecl> for Fragment {
    type Error = ValidationError;

    fn try_from(decl: FragmentDecl) -> Result<Self, Self::Error> {
        validate_name(&decl.name)?;
        let content = FragmentContent::from_parts(decl.source, decl.list).ok_or_else(|| {
            ValidationError::MissingContent {
                name: decl.name.clone(),
            }
        })?;
        Ok(Self {
            name: decl.name,
            ensure: decl.ensure,
            content,
        })
    }
}

impl Fragment {
    /// Absolute path of the managed file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        fragment_path(&self.name)
    }
}

/// A resource the managed file must be ordered after.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "type", content = "name", rename_all = "lowercase")]
pub enum Dependency {
    /// An OS package that must be installed first.
    Package(String),
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Package(name) => write!(f, "Package[{name}]"),
        }
    }
}

/// Description of a managed file, handed to the file-management layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileResource {
    /// Absolute target path.
    pub path: PathBuf,
    /// Desired state, as declared.
    pub ensure: Ensure,
    /// Rendered body, when the fragment was declared with a list.
    pub content: Option<String>,
    /// Source reference, when the fragment was declared with a source only.
    pub source: Option<String>,
    /// Owning user.
    pub owner: String,
    /// Owning group.
    pub group: String,
    /// Octal permission mode.
    pub mode: String,
    /// Resources that must be in place before this file.
    pub requires: Vec<Dependency>,
}

impl FileResource {
    /// Whether this file must be ordered after `package`.
    #[must_use]
    pub fn requires_package(&self, package: &str) -> bool {
        self.requires
            .iter()
            .any(|d| matches!(d, Dependency::Package(p) if p == package))
    }
}

/// Path of the fragment file for `name`.
#[must_use]
pub fn fragment_path(name: &str) -> PathBuf {
    PathBuf::from(LIMITS_D_DIR).join(format!("{name}.conf"))
}

/// The two-line header written above list content.
#[must_use]
pub fn header(tool: &str) -> String {
    format!("# This file is being maintained by {tool}.\n# DO NOT EDIT\n")
}

/// Render list content: the header followed by one line per element.
///
/// # Examples
///
/// ```
/// use pam_limits::fragment::render_list;
///
/// let body = render_list("pam-limits", &["a".to_string(), "b".to_string()]);
/// assert!(body.ends_with("# DO NOT EDIT\na\nb\n"));
/// ```
#[must_use]
pub fn render_list(tool: &str, lines: &[String]) -> String {
    let mut out = header(tool);
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    let reason = if name.is_empty() {
        Some("name must not be empty")
    } else if name == "." || name == ".." {
        Some("name must not be a relative directory reference")
    } else if name.contains('/') {
        Some("name must not contain '/'")
    } else if name.contains('\0') {
        Some("name must not contain a NUL byte")
    } else {
        None
    };
    reason.map_or(Ok(()), |reason| {
        Err(ValidationError::InvalidName {
            name: name.to_string(),
            reason,
        })
    })
}

/// Validate a declaration and describe the file it manages.
///
/// `packages` is the platform's package set providing the `limits.d`
/// convention; one `Package` dependency is emitted per entry, in order.
///
/// # Errors
///
/// Returns [`ValidationError::MissingContent`] when neither `source` nor
/// `list` is set, and [`ValidationError::InvalidName`] when the name cannot
/// be used as a file stem.
pub fn render(
    decl: &FragmentDecl,
    header_tool: &str,
    packages: &[&str],
) -> Result<FileResource, ValidationError> {
    let fragment = Fragment::try_from(decl.clone())?;
    let (content, source) = match fragment.content {
        FragmentContent::List(ref lines) => (Some(render_list(header_tool, lines)), None),
        FragmentContent::Source(ref source) => (None, Some(source.clone())),
    };
    Ok(FileResource {
        path: fragment.path(),
        ensure: fragment.ensure,
        content,
        source,
        owner: FRAGMENT_OWNER.to_string(),
        group: FRAGMENT_GROUP.to_string(),
        mode: FRAGMENT_MODE.to_string(),
        requires: packages
            .iter()
            .map(|p| Dependency::Package((*p).to_string()))
            .collect(),
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const HEADER: &str = "# This file is being maintained by pam-limits.\n# DO NOT EDIT\n";
    const EXAMPLE_SOURCE: &str = "file:///srv/limits/example.conf";

    fn mandatory() -> FragmentDecl {
        FragmentDecl::named("80-nproc").with_list(["test1", "test2"])
    }

    #[test]
    fn defaults_for_all_parameters_fail() {
        let err = render(&FragmentDecl::named("80-nproc"), "pam-limits", &["pam"]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingContent {
                name: "80-nproc".to_string()
            }
        );
        assert!(err.to_string().contains("must specify source or list"));
    }

    #[test]
    fn missing_content_fails_for_every_ensure() {
        for ensure in [Ensure::Present, Ensure::Absent, Ensure::File] {
            let decl = FragmentDecl::named("80-nproc").with_ensure(ensure);
            assert!(
                render(&decl, "pam-limits", &[]).is_err(),
                "ensure={ensure} without content should fail"
            );
        }
    }

    #[test]
    fn mandatory_parameters_render_managed_file() {
        let file = render(&mandatory(), "pam-limits", &["pam"]).unwrap();
        assert_eq!(file.path, PathBuf::from("/etc/security/limits.d/80-nproc.conf"));
        assert_eq!(file.ensure, Ensure::Present);
        assert_eq!(file.source, None);
        assert_eq!(file.content.as_deref(), Some(format!("{HEADER}test1\ntest2\n").as_str()));
        assert_eq!(file.owner, "root");
        assert_eq!(file.group, "root");
        assert_eq!(file.mode, "0644");
    }

    #[test]
    fn source_only_leaves_content_unset() {
        let decl = FragmentDecl::named("80-nproc").with_source(EXAMPLE_SOURCE);
        let file = render(&decl, "pam-limits", &[]).unwrap();
        assert_eq!(file.source.as_deref(), Some(EXAMPLE_SOURCE));
        assert_eq!(file.content, None);
    }

    #[test]
    fn list_takes_precedence_over_source() {
        let decl = mandatory().with_source(EXAMPLE_SOURCE);
        let file = render(&decl, "pam-limits", &[]).unwrap();
        assert_eq!(file.content.unwrap(), format!("{HEADER}test1\ntest2\n"));
        assert_eq!(file.source, None);
    }

    #[test]
    fn ensure_is_echoed_verbatim() {
        for ensure in [Ensure::Absent, Ensure::Present, Ensure::File] {
            let file = render(&mandatory().with_ensure(ensure), "pam-limits", &[]).unwrap();
            assert_eq!(file.ensure, ensure);
        }
    }

    #[test]
    fn path_is_derived_from_name() {
        for name in ["80-nproc", "90-nofile", "custom.d"] {
            let decl = FragmentDecl::named(name).with_list(["x"]);
            let file = render(&decl, "pam-limits", &[]).unwrap();
            assert_eq!(
                file.path,
                PathBuf::from(format!("/etc/security/limits.d/{name}.conf"))
            );
        }
    }

    #[test]
    fn requires_every_package_in_order() {
        let packages = ["libpam0g", "libpam-modules", "libpam-runtime"];
        let file = render(&mandatory(), "pam-limits", &packages).unwrap();
        let names: Vec<String> = file.requires.iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            vec![
                "Package[libpam0g]",
                "Package[libpam-modules]",
                "Package[libpam-runtime]"
            ]
        );
        assert!(file.requires_package("libpam-modules"));
        assert!(!file.requires_package("pam"));
    }

    #[test]
    fn empty_list_renders_header_only() {
        let decl = FragmentDecl::named("80-nproc").with_list(Vec::<String>::new());
        let file = render(&decl, "pam-limits", &[]).unwrap();
        assert_eq!(file.content.unwrap(), HEADER);
    }

    #[test]
    fn header_names_the_configured_tool() {
        assert_eq!(
            header("Puppet"),
            "# This file is being maintained by Puppet.\n# DO NOT EDIT\n"
        );
    }

    #[test]
    fn invalid_names_are_rejected() {
        for name in ["", ".", "..", "a/b", "nul\0byte"] {
            let decl = FragmentDecl::named(name).with_list(["x"]);
            let err = render(&decl, "pam-limits", &[]).unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidName { .. }),
                "expected InvalidName for {name:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn ensure_parses_and_displays() {
        for s in ["present", "absent", "file"] {
            let ensure: Ensure = s.parse().unwrap();
            assert_eq!(ensure.to_string(), s);
        }
        assert!("directory".parse::<Ensure>().is_err());
        assert!(Ensure::File.creates_file());
        assert!(!Ensure::Absent.creates_file());
    }

    #[test]
    fn file_resource_serializes_to_json() {
        let file = render(&mandatory(), "pam-limits", &["pam"]).unwrap();
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["path"], "/etc/security/limits.d/80-nproc.conf");
        assert_eq!(json["ensure"], "present");
        assert_eq!(json["mode"], "0644");
        assert!(json["source"].is_null());
        assert_eq!(json["requires"][0]["type"], "package");
        assert_eq!(json["requires"][0]["name"], "pam");
    }
}
