//! az-zone-migrate: move Azure VMs into an availability zone

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use az_zone_migrate::cli::Cli;
use az_zone_migrate::output::json::{error_code, format_error};

/// The HTTP stack logs at its own targets; keep those quiet unless asked.
const QUIET_TARGETS: &str = "reqwest=warn,hyper=warn,hyper_util=warn,rustls=warn";

fn init_tracing(debug: bool, json: bool, no_color: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},{QUIET_TARGETS}")));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(debug)
        .with_ansi(!no_color);
    // JSON output owns stdout.
    if json {
        builder.with_writer(std::io::stderr).init();
    } else {
        builder.with_writer(std::io::stdout).init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let json = cli.json;
    init_tracing(cli.debug, json, cli.no_color);
    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            let message = format!("{e:#}");
            match format_error(&message, error_code(&e)) {
                Ok(out) if json => println!("{out}"),
                _ => eprintln!("Error: {message}"),
            }
            ExitCode::FAILURE
        }
    }
}
