// Shared helpers for integration tests.
//
// Provides a temporary directory holding a `limits.toml` (plus any source
// files it references) and a separate target root, so each integration test
// can run commands against an isolated environment.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use pam_limits::cli::GlobalOpts;
use pam_limits::config::Config;

/// Settings that let `apply` run unprivileged on any host.
pub const UNPRIVILEGED_SETTINGS: &str =
    "[settings]\nmanage_packages = false\nmanage_ownership = false\n";

/// Platform identifiers covering every supported family and release.
pub const PLATFORMS: &[&str] = &[
    "debian10",
    "debian11",
    "debian12",
    "ubuntu2004",
    "ubuntu2204",
    "el7",
    "el8",
    "el9",
    "suse12",
    "suse15",
    "solaris10",
    "solaris11",
];

/// An isolated configuration directory and target root.
pub struct IntegrationTestContext {
    /// Directory containing `limits.toml` and source files.
    pub conf: tempfile::TempDir,
    /// Directory standing in for `/` when applying.
    pub target: tempfile::TempDir,
}

impl IntegrationTestContext {
    /// Path of the configuration file.
    pub fn config_path(&self) -> PathBuf {
        self.conf.path().join("limits.toml")
    }

    /// Target root directory.
    pub fn root(&self) -> &Path {
        self.target.path()
    }

    /// Path of a fragment file under the target root.
    pub fn fragment_file(&self, name: &str) -> PathBuf {
        self.root()
            .join("etc/security/limits.d")
            .join(format!("{name}.conf"))
    }

    /// Load the configuration file.
    pub fn load_config(&self) -> Config {
        Config::load(&self.config_path()).expect("load config")
    }

    /// Global options pointing at this context for `platform`.
    pub fn global(&self, platform: &str) -> GlobalOpts {
        GlobalOpts {
            config: Some(self.config_path()),
            root: Some(self.root().to_path_buf()),
            platform: Some(platform.to_string()),
            dry_run: false,
        }
    }

    /// Global options for a dry run.
    pub fn dry_run(&self, platform: &str) -> GlobalOpts {
        GlobalOpts {
            dry_run: true,
            ..self.global(platform)
        }
    }
}

/// Fluent builder for [`IntegrationTestContext`].
pub struct TestContextBuilder {
    toml: String,
    files: Vec<(String, String)>,
}

impl TestContextBuilder {
    /// Begin with an empty configuration.
    pub fn new() -> Self {
        Self {
            toml: String::new(),
            files: Vec::new(),
        }
    }

    /// Begin with settings that need neither root nor a package manager.
    pub fn unprivileged() -> Self {
        Self::new().raw(UNPRIVILEGED_SETTINGS)
    }

    /// Append raw TOML.
    pub fn raw(mut self, toml: &str) -> Self {
        self.toml.push_str(toml);
        self.toml.push('\n');
        self
    }

    /// Declare a fragment with a literal list.
    pub fn list_fragment(self, name: &str, lines: &[&str]) -> Self {
        let quoted: Vec<String> = lines.iter().map(|l| format!("{l:?}")).collect();
        self.raw(&format!(
            "[fragment.{name}]\nlist = [{}]\n",
            quoted.join(", ")
        ))
    }

    /// Declare a fragment with a source reference.
    pub fn source_fragment(self, name: &str, source: &str) -> Self {
        self.raw(&format!("[fragment.{name}]\nsource = {source:?}\n"))
    }

    /// Write a file relative to the configuration directory.
    pub fn file(mut self, relative: &str, content: &str) -> Self {
        self.files.push((relative.to_string(), content.to_string()));
        self
    }

    /// Write everything to disk.
    pub fn build(self) -> IntegrationTestContext {
        let ctx = IntegrationTestContext {
            conf: tempfile::tempdir().expect("create conf dir"),
            target: tempfile::tempdir().expect("create target dir"),
        };
        std::fs::write(ctx.config_path(), &self.toml).expect("write limits.toml");
        for (relative, content) in &self.files {
            let path = ctx.conf.path().join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("create source dir");
            }
            std::fs::write(path, content).expect("write source file");
        }
        ctx
    }
}

/// A logger that does not write a log file.
pub fn logger() -> pam_limits::logging::Logger {
    pam_limits::logging::Logger::with_log_file(None)
}
