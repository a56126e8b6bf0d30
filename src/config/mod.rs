//! Loading of `limits.toml`: engine settings and fragment declarations.
pub mod source;
pub mod toml_loader;
pub mod validation;

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ValidationError};
use crate::fragment::{self, DEFAULT_HEADER_TOOL, FileResource, FragmentDecl};
use crate::packages;
use crate::platform::Platform;
use validation::{ConfigValidator, FragmentValidator, LimitLineValidator, ValidationWarning};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "limits.toml";

/// Engine settings from the `[settings]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Settings {
    /// Tool name written into the rendered header.
    pub header_tool: String,
    /// Remove `*.conf` files in `limits.d` that no fragment declares.
    pub purge: bool,
    /// Install missing limits packages before writing fragments.
    pub manage_packages: bool,
    /// Change ownership of managed files to their declared owner/group.
    pub manage_ownership: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            header_tool: DEFAULT_HEADER_TOOL.to_string(),
            purge: false,
            manage_packages: true,
            manage_ownership: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    settings: Settings,
    #[serde(default)]
    fragment: BTreeMap<String, FragmentDecl>,
}

/// All loaded configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path the configuration was read from.
    pub path: PathBuf,
    /// Directory relative `source` references resolve against.
    pub base_dir: PathBuf,
    /// Engine settings.
    pub settings: Settings,
    /// Fragment declarations, in name order.
    pub fragments: Vec<FragmentDecl>,
}

/// A declaration paired with its render outcome.
pub type Rendered<'a> = (&'a FragmentDecl, Result<FileResource, ValidationError>);

impl Config {
    /// Load configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml_loader::load_document(path)?;
        Ok(Self::from_file(file, path))
    }

    /// Parse configuration held in memory; `path` anchors relative sources.
    ///
    /// # Errors
    ///
    /// Returns an error if `content` is not a valid configuration.
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml_loader::parse_document(content, path)?;
        Ok(Self::from_file(file, path))
    }

    fn from_file(file: ConfigFile, path: &Path) -> Self {
        let fragments = file
            .fragment
            .into_iter()
            .map(|(name, mut decl)| {
                decl.name = name;
                decl
            })
            .collect();
        Self {
            path: path.to_path_buf(),
            base_dir: path
                .parent()
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
            settings: file.settings,
            fragments,
        }
    }

    /// Look up a declaration by name.
    #[must_use]
    pub fn fragment(&self, name: &str) -> Option<&FragmentDecl> {
        self.fragments.iter().find(|f| f.name == name)
    }

    /// Restrict to the named fragments; an empty selection keeps all of them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownFragment`] for a name that is not declared.
    pub fn select(&self, names: &[String]) -> Result<Vec<&FragmentDecl>, ConfigError> {
        if names.is_empty() {
            return Ok(self.fragments.iter().collect());
        }
        names
            .iter()
            .map(|n| {
                self.fragment(n)
                    .ok_or_else(|| ConfigError::UnknownFragment(n.clone()))
            })
            .collect()
    }

    /// Render `decls` for `platform`.
    #[must_use]
    pub fn render<'a>(
        &self,
        decls: impl IntoIterator<Item = &'a FragmentDecl>,
        platform: &Platform,
    ) -> Vec<Rendered<'a>> {
        let packages = packages::limits_packages(platform);
        decls
            .into_iter()
            .map(|decl| {
                (
                    decl,
                    fragment::render(decl, &self.settings.header_tool, packages),
                )
            })
            .collect()
    }

    /// Render every declared fragment for `platform`.
    #[must_use]
    pub fn render_all(&self, platform: &Platform) -> Vec<Rendered<'_>> {
        self.render(&self.fragments, platform)
    }

    /// Run every validator and collect warnings.
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationWarning> {
        let validators: [&dyn ConfigValidator; 2] = [
            &FragmentValidator::new(&self.fragments),
            &LimitLineValidator::new(&self.fragments),
        ];
        validators
            .iter()
            .flat_map(|v| v.validate(&self.base_dir))
            .collect()
    }
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::fragment::Ensure;
    use crate::platform::OsFamily;
    use test_helpers::write_temp_toml;

    const SAMPLE: &str = r#"
[settings]
header_tool = "Puppet"
purge = true

[fragment.90-nofile]
ensure = "file"
list = ["*  soft  nofile  4096", "*  hard  nofile  8192"]

[fragment.80-nproc]
source = "files/nproc.conf"
"#;

    #[test]
    fn loads_settings_and_fragments_in_name_order() {
        let (_dir, path) = write_temp_toml(SAMPLE);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.settings.header_tool, "Puppet");
        assert!(config.settings.purge);
        assert!(config.settings.manage_packages);
        let names: Vec<&str> = config.fragments.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["80-nproc", "90-nofile"]);
        assert_eq!(config.fragments[1].ensure, Ensure::File);
        assert_eq!(config.base_dir, path.parent().unwrap());
    }

    #[test]
    fn defaults_apply_to_empty_document() {
        let config = Config::from_toml_str("", Path::new("/etc/pam-limits/limits.toml")).unwrap();
        assert_eq!(config.settings, Settings::default());
        assert!(config.fragments.is_empty());
        assert_eq!(config.base_dir, PathBuf::from("/etc/pam-limits"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml_str(
            "[fragment.a]\nlist = []\ncontent = \"x\"\n",
            Path::new("limits.toml"),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSyntax { .. }));
    }

    #[test]
    fn invalid_ensure_is_rejected() {
        let err = Config::from_toml_str(
            "[fragment.a]\nensure = \"directory\"\nlist = []\n",
            Path::new("limits.toml"),
        );
        assert!(err.is_err());
    }

    #[test]
    fn render_all_uses_platform_packages() {
        let config = Config::from_toml_str(SAMPLE, Path::new("limits.toml")).unwrap();
        let platform = Platform::new(OsFamily::RedHat, "8");
        let rendered = config.render_all(&platform);
        assert_eq!(rendered.len(), 2);
        for (_, result) in &rendered {
            let file = result.as_ref().unwrap();
            assert!(file.requires_package("pam"));
        }
        let nofile = rendered[1].1.as_ref().unwrap();
        assert!(
            nofile
                .content
                .as_ref()
                .unwrap()
                .starts_with("# This file is being maintained by Puppet.\n")
        );
    }

    #[test]
    fn render_reports_missing_content() {
        let config =
            Config::from_toml_str("[fragment.empty]\n", Path::new("limits.toml")).unwrap();
        let rendered = config.render_all(&Platform::new(OsFamily::Debian, "12"));
        assert!(rendered[0].1.is_err());
    }

    #[test]
    fn select_by_name() {
        let config = Config::from_toml_str(SAMPLE, Path::new("limits.toml")).unwrap();
        assert_eq!(config.select(&[]).unwrap().len(), 2);
        let picked = config.select(&["90-nofile".to_string()]).unwrap();
        assert_eq!(picked[0].name, "90-nofile");
        assert!(matches!(
            config.select(&["nope".to_string()]),
            Err(ConfigError::UnknownFragment(_))
        ));
    }
}
