//! Resolution of fragment `source` references to local paths.
use std::path::{Path, PathBuf};

use crate::resources::error::ResourceError;

/// Resolve a `source` reference against the configuration directory.
///
/// Accepts absolute paths, paths relative to `base_dir`, and `file://` URLs.
/// Any other URL scheme is rejected.
///
/// # Errors
///
/// Returns [`ResourceError::UnsupportedSource`] for non-`file` URL schemes.
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
/// use pam_limits::config::source::resolve_source;
///
/// let base = Path::new("/etc/pam-limits");
/// assert_eq!(
///     resolve_source("files/nproc.conf", base).unwrap(),
///     PathBuf::from("/etc/pam-limits/files/nproc.conf")
/// );
/// assert!(resolve_source("puppet:///modules/pam/example.conf", base).is_err());
/// ```
pub fn resolve_source(source: &str, base_dir: &Path) -> Result<PathBuf, ResourceError> {
    if let Some(rest) = source.strip_prefix("file://") {
        return Ok(PathBuf::from(rest));
    }
    if let Some((scheme, _)) = source.split_once("://") {
        return Err(ResourceError::UnsupportedSource {
            source_ref: source.to_string(),
            scheme: scheme.to_string(),
        });
    }
    let path = Path::new(source);
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(base_dir.join(path))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn file_url_is_stripped() {
        let p = resolve_source("file:///srv/limits/a.conf", Path::new("/base")).unwrap();
        assert_eq!(p, PathBuf::from("/srv/limits/a.conf"));
    }

    #[test]
    fn absolute_path_is_kept() {
        let p = resolve_source("/srv/limits/a.conf", Path::new("/base")).unwrap();
        assert_eq!(p, PathBuf::from("/srv/limits/a.conf"));
    }

    #[test]
    fn relative_path_joins_base() {
        let p = resolve_source("files/a.conf", Path::new("/base")).unwrap();
        assert_eq!(p, PathBuf::from("/base/files/a.conf"));
    }

    #[test]
    fn other_schemes_are_unsupported() {
        let err = resolve_source("https://example.com/a.conf", Path::new("/base")).unwrap_err();
        assert!(err.to_string().contains("https"));
    }
}
