use clap::Parser;
use plugin_audit::{Cli, handlers, logging};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    handlers::dispatch(&cli)
}
