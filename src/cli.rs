//! Command-line interface definition.
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Top-level CLI entry point for the PAM limits fragment manager.
#[derive(Parser, Debug)]
#[command(
    name = "pam-limits",
    about = "Render and manage PAM limits.d fragment files",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options accepted by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Path to limits.toml (default: $PAM_LIMITS_CONFIG, then ./limits.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Materialize target paths under this directory instead of /
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Target platform identifier (e.g. debian12, el8, ubuntu2204, suse15, solaris11)
    #[arg(long, global = true)]
    pub platform: Option<String>,

    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the file resources described by the declared fragments
    Render(RenderOpts),
    /// Check every fragment declaration and report problems
    Validate,
    /// Install packages and write fragments to disk
    Apply,
    /// Print version information
    Version,
}

impl Command {
    /// Name used for the per-command log file.
    #[must_use]
    pub const fn log_name(&self) -> &'static str {
        match self {
            Self::Render(_) => "render",
            Self::Validate => "validate",
            Self::Apply => "apply",
            Self::Version => "version",
        }
    }
}

/// Output format for `render`.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable resource blocks
    #[default]
    Text,
    /// JSON array of file resources
    Json,
}

/// Options for the `render` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct RenderOpts {
    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Render only these fragments (default: all)
    pub names: Vec<String>,
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_render_defaults() {
        let cli = Cli::parse_from(["pam-limits", "render"]);
        let Command::Render(opts) = cli.command else {
            panic!("expected render");
        };
        assert_eq!(opts.format, OutputFormat::Text);
        assert!(opts.names.is_empty());
    }

    #[test]
    fn parse_render_json_with_names() {
        let cli = Cli::parse_from([
            "pam-limits",
            "render",
            "--format",
            "json",
            "80-nproc",
            "90-nofile",
        ]);
        let Command::Render(opts) = cli.command else {
            panic!("expected render");
        };
        assert_eq!(opts.format, OutputFormat::Json);
        assert_eq!(opts.names, vec!["80-nproc", "90-nofile"]);
    }

    #[test]
    fn parse_global_options_after_subcommand() {
        let cli = Cli::parse_from([
            "pam-limits",
            "apply",
            "--platform",
            "el8",
            "--root",
            "/srv/image",
            "-c",
            "/etc/pam-limits/limits.toml",
            "-d",
        ]);
        assert!(matches!(cli.command, Command::Apply));
        assert_eq!(cli.global.platform.as_deref(), Some("el8"));
        assert_eq!(cli.global.root, Some(PathBuf::from("/srv/image")));
        assert_eq!(
            cli.global.config,
            Some(PathBuf::from("/etc/pam-limits/limits.toml"))
        );
        assert!(cli.global.dry_run);
    }

    #[test]
    fn parse_verbose_and_validate() {
        let cli = Cli::parse_from(["pam-limits", "-v", "validate"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Validate));
        assert_eq!(cli.command.log_name(), "validate");
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["pam-limits", "version"]);
        assert!(matches!(cli.command, Command::Version));
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["pam-limits", "render", "--format", "yaml"]).is_err());
    }
}
