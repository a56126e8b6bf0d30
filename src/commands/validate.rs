//! `validate`: check every fragment without touching the host.
use anyhow::Result;

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::logging::Logger;

/// Run the validate command.
///
/// Every fragment is rendered for the target platform; configuration
/// warnings are reported but only render failures fail the command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or any fragment
/// fails to render.
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    log.stage(&format!("Validating for {}", setup.platform.identifier()));

    let mut failed = 0usize;
    for (decl, result) in setup.config.render_all(&setup.platform) {
        match result {
            Ok(file) => log.debug(&format!("ok: {}", file.path.display())),
            Err(e) => {
                log.error(&e.to_string());
                failed += 1;
            }
        }
        log.debug(&format!("checked fragment '{}'", decl.name));
    }

    if failed > 0 {
        anyhow::bail!("{failed} fragment(s) failed validation");
    }
    log.info(&format!(
        "{} fragment(s) valid",
        setup.config.fragments.len()
    ));
    Ok(())
}
