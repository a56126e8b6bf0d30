//! `render`: print the file descriptions fragments expand to.
use std::fmt::Write as _;

use anyhow::{Context as _, Result};

use super::CommandSetup;
use crate::cli::{GlobalOpts, OutputFormat, RenderOpts};
use crate::fragment::FileResource;
use crate::logging::Logger;

/// Run the render command.
///
/// Fragments that render are printed to stdout; failures are logged and
/// make the command fail after the rest have been printed.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, a requested
/// fragment is not declared, or any fragment fails to render.
#[allow(clippy::print_stdout)]
pub fn run(global: &GlobalOpts, opts: &RenderOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let decls = setup.config.select(&opts.names)?;
    log.debug(&format!(
        "rendering {} fragment(s) for {}",
        decls.len(),
        setup.platform.identifier()
    ));

    let mut files = Vec::new();
    let mut failed = 0usize;
    for (_, result) in setup.config.render(decls, &setup.platform) {
        match result {
            Ok(file) => files.push(file),
            Err(e) => {
                log.error(&e.to_string());
                failed += 1;
            }
        }
    }

    let output = match opts.format {
        OutputFormat::Text => files.iter().map(format_text).collect::<Vec<_>>().join("\n"),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&files).context("serializing file resources")?
        }
    };
    if !output.is_empty() {
        println!("{output}");
    }

    if failed > 0 {
        anyhow::bail!("{failed} fragment(s) failed to render");
    }
    Ok(())
}

/// Human-readable block describing one file resource.
///
/// # Examples
///
/// ```
/// use pam_limits::commands::render::format_text;
/// use pam_limits::fragment::{FragmentDecl, render};
///
/// let decl = FragmentDecl::named("x").with_source("x.conf");
/// let file = render(&decl, "pam-limits", &["pam"]).unwrap();
/// let text = format_text(&file);
/// assert!(text.starts_with("File[/etc/security/limits.d/x.conf]\n"));
/// assert!(text.contains("  require => [Package[pam]]\n"));
/// ```
#[must_use]
pub fn format_text(file: &FileResource) -> String {
    let mut out = format!("File[{}]\n", file.path.display());
    let _ = writeln!(out, "  ensure  => {}", file.ensure);
    let _ = writeln!(out, "  owner   => {}", file.owner);
    let _ = writeln!(out, "  group   => {}", file.group);
    let _ = writeln!(out, "  mode    => {}", file.mode);
    let requires: Vec<String> = file.requires.iter().map(ToString::to_string).collect();
    let _ = writeln!(out, "  require => [{}]", requires.join(", "));
    if let Some(source) = &file.source {
        let _ = writeln!(out, "  source  => {source}");
    }
    if let Some(content) = &file.content {
        out.push_str("  content => |\n");
        for line in content.lines() {
            let _ = writeln!(out, "    {line}");
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fragment::{Ensure, FragmentDecl, render};

    #[test]
    fn text_block_for_list_fragment() {
        let decl = FragmentDecl::named("80-nproc")
            .with_ensure(Ensure::File)
            .with_list(["*  soft  nproc  4096"]);
        let file = render(&decl, "pam-limits", &["libpam0g", "libpam-modules"]).unwrap();
        assert_eq!(
            format_text(&file),
            "File[/etc/security/limits.d/80-nproc.conf]\n\
             \x20 ensure  => file\n\
             \x20 owner   => root\n\
             \x20 group   => root\n\
             \x20 mode    => 0644\n\
             \x20 require => [Package[libpam0g], Package[libpam-modules]]\n\
             \x20 content => |\n\
             \x20   # This file is being maintained by pam-limits.\n\
             \x20   # DO NOT EDIT\n\
             \x20   *  soft  nproc  4096\n"
        );
    }

    #[test]
    fn text_block_for_source_fragment_without_packages() {
        let decl = FragmentDecl::named("custom").with_source("files/custom.conf");
        let file = render(&decl, "pam-limits", &[]).unwrap();
        let text = format_text(&file);
        assert!(text.contains("  require => []\n"));
        assert!(text.contains("  source  => files/custom.conf\n"));
        assert!(!text.contains("content"));
    }
}
