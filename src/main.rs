//! slimload command-line entry point.
//!
//! Parses arguments, runs the command and renders failures through
//! [`user_friendly_error`] with a non-zero exit status.

use anyhow::Result;
use clap::Parser;
use slimload::cli;
use slimload::core::user_friendly_error;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute() {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
