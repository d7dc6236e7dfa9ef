pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use peerpost_core::config::LoadOptions;

#[derive(Debug, Parser)]
#[command(
    name = "peerpost",
    about = "Peerpost operator CLI",
    long_about = "Operate the peerpost archive: migrations, demo data, offline reports, config inspection, and readiness checks.",
    after_help = "Examples:\n  peerpost doctor --json\n  peerpost seed\n  peerpost report --channel demo-peer-channel --since 2024/01/15"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to the TOML config file (defaults to peerpost.toml or config/peerpost.toml)")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo recognition dataset into the archive")]
    Seed {
        #[arg(long, help = "Remove previously seeded demo rows before loading")]
        reset: bool,
    },
    #[command(about = "Render a peer report for a channel from the local archive")]
    Report {
        #[arg(long, help = "Channel id whose recognition posts are counted")]
        channel: String,
        #[arg(long, value_name = "YYYY/MM/DD", help = "Window start (defaults to the most recent Monday)")]
        since: Option<String>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, database connectivity, and Mattermost API reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions { config_path: cli.config, ..LoadOptions::default() };

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(options),
        Command::Seed { reset } => commands::seed::run(options, reset),
        Command::Report { channel, since } => {
            commands::report::run(options, &channel, since.as_deref())
        }
        Command::Config => commands::CommandResult::text(commands::config::run(options)),
        Command::Doctor { json } => commands::CommandResult::text(commands::doctor::run(options, json)),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
