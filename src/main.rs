use std::process::ExitCode;

use arnold::builder;
use arnold::cli::Cli;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match builder::build(&cli.build_options()) {
        Ok(()) => {
            println!("{}", "=== Build succeeded ===".green().bold());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            println!("{}", "=== Build Failed ===".red().bold());
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr so diagnostics never interleave with the status report.
fn init_logging(verbose: bool) {
    let default = if verbose { "arnold=debug" } else { "arnold=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
