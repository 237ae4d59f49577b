//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::application::services::migration::RunMode;
use crate::commands;

/// Move Azure VMs into an availability zone by snapshot, delete and recreate
#[derive(Parser)]
#[command(
    name = "az-zone-migrate",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Log at DEBUG level
    #[arg(long, global = true)]
    pub debug: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Do not ask before deleting and recreating VMs
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Migrate every VM listed in the CSV file to its desired zone
    Migrate(commands::migrate::MigrateArgs),

    /// Report current zones and capacity without changing anything
    Check(commands::migrate::InputArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error for run-level failures (configuration, input file,
    /// credentials). Per-VM failures are reported, not returned.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            yes,
            command,
            ..
        } = self;
        let app = AppContext::new(&AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            behaviour: BehaviourFlags { yes },
        });
        match command {
            Command::Migrate(args) => {
                let mode = if args.check {
                    RunMode::CheckOnly
                } else {
                    RunMode::Migrate
                };
                commands::migrate::run(&app, &args.input, mode).await
            }
            Command::Check(input) => commands::migrate::run(&app, &input, RunMode::CheckOnly).await,
            Command::Config(cmd) => commands::config::run(&app, cmd),
            Command::Version => commands::version::run(&app),
        }
    }
}
