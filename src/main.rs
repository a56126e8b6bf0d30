//! Command-line entry point for `pam-limits`.

use anyhow::Result;
use clap::Parser;

use pam_limits::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();

    let command_name = args.command.log_name();
    logging::init_subscriber(args.verbose, command_name);
    let log = logging::Logger::new(command_name);

    match &args.command {
        cli::Command::Render(opts) => commands::render::run(&args.global, opts, &log),
        cli::Command::Validate => commands::validate::run(&args.global, &log),
        cli::Command::Apply => commands::apply::run(&args.global, &log),
        cli::Command::Version => {
            commands::version::run();
            Ok(())
        }
    }
}
