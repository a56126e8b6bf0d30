//! Non-fatal checks over fragment declarations.
use std::path::Path;

use super::source::resolve_source;
use crate::fragment::FragmentDecl;

/// Limit types accepted in the second column of a limits line.
const LIMIT_TYPES: &[&str] = &["soft", "hard", "-"];

/// Items accepted in the third column of a limits line (see `limits.conf(5)`).
const LIMIT_ITEMS: &[&str] = &[
    "core",
    "data",
    "fsize",
    "memlock",
    "nofile",
    "rss",
    "stack",
    "cpu",
    "nproc",
    "as",
    "maxlogins",
    "maxsyslogins",
    "nonewprivs",
    "priority",
    "locks",
    "sigpending",
    "msgqueue",
    "nice",
    "rtprio",
    "chroot",
];

/// Source label attached to every warning from this module.
const CONFIG_SOURCE: &str = "limits.toml";

/// A validation warning detected during configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The configuration source (e.g. `"limits.toml"`).
    pub source: String,
    /// The specific item that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    /// Create a warning about `item` from `source`.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        item: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            item: item.into(),
            message: message.into(),
        }
    }
}

/// Trait for configuration validators.
pub trait ConfigValidator {
    /// Validate the configuration and return any warnings found.
    ///
    /// Relative sources resolve against `base_dir`.
    fn validate(&self, base_dir: &Path) -> Vec<ValidationWarning>;
}

/// Checks declaration-level issues: ambiguous content and missing sources.
#[derive(Debug)]
pub struct FragmentValidator<'a> {
    fragments: &'a [FragmentDecl],
}

impl<'a> FragmentValidator<'a> {
    /// Validate `fragments`.
    #[must_use]
    pub const fn new(fragments: &'a [FragmentDecl]) -> Self {
        Self { fragments }
    }
}

impl ConfigValidator for FragmentValidator<'_> {
    fn validate(&self, base_dir: &Path) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        for decl in self.fragments {
            if decl.source.is_some() && decl.list.is_some() {
                warnings.push(ValidationWarning::new(
                    CONFIG_SOURCE,
                    &decl.name,
                    "both source and list are set; source is ignored",
                ));
            }

            if decl.list.is_none()
                && let Some(source) = &decl.source
            {
                match resolve_source(source, base_dir) {
                    Ok(path) if !path.exists() => warnings.push(ValidationWarning::new(
                        CONFIG_SOURCE,
                        &decl.name,
                        format!("source file does not exist: {}", path.display()),
                    )),
                    Ok(_) => {}
                    Err(e) => warnings.push(ValidationWarning::new(
                        CONFIG_SOURCE,
                        &decl.name,
                        e.to_string(),
                    )),
                }
            }
        }

        warnings
    }
}

/// Checks that list lines follow `<domain> <type> <item> <value>`.
#[derive(Debug)]
pub struct LimitLineValidator<'a> {
    fragments: &'a [FragmentDecl],
}

impl<'a> LimitLineValidator<'a> {
    /// Validate the list lines of `fragments`.
    #[must_use]
    pub const fn new(fragments: &'a [FragmentDecl]) -> Self {
        Self { fragments }
    }
}

impl ConfigValidator for LimitLineValidator<'_> {
    fn validate(&self, _base_dir: &Path) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        for decl in self.fragments {
            for line in decl.list.iter().flatten() {
                if let Some(message) = check_limit_line(line) {
                    warnings.push(ValidationWarning::new(
                        CONFIG_SOURCE,
                        format!("{}: {line}", decl.name),
                        message,
                    ));
                }
            }
        }

        warnings
    }
}

/// Check a single limits line.
///
/// Returns `Some(error_message)` if the line is malformed, or `None` if it is
/// valid, blank, or a comment.
fn check_limit_line(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    let [_domain, kind, item, value] = fields.as_slice() else {
        return Some(format!(
            "expected 4 fields (<domain> <type> <item> <value>), found {}",
            fields.len()
        ));
    };

    if !LIMIT_TYPES.contains(kind) {
        return Some(format!("unknown limit type '{kind}': must be soft, hard or -"));
    }
    if !LIMIT_ITEMS.contains(item) {
        return Some(format!("unknown limit item '{item}'"));
    }
    let numeric = value.parse::<i64>().is_ok();
    let unbounded = matches!(*value, "unlimited" | "infinity");
    // chroot takes a directory rather than a number
    if !numeric && !unbounded && *item != "chroot" {
        return Some(format!("invalid value '{value}' for {item}"));
    }

    None
}
