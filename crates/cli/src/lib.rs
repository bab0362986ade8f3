pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "procura",
    about = "Procura operator CLI",
    long_about = "Apply migrations, inspect configuration, check readiness, and run reply scans.",
    after_help = "Examples:\n  procura doctor --json\n  procura config\n  procura scan --rfp <id>"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Check config, extraction backend, mail transport, and database readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Run one response-correlation pass for an RFP (suited to cron)")]
    Scan {
        #[arg(long = "rfp", value_name = "ID", help = "RFP whose replies should be collected")]
        rfp: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Scan { rfp } => commands::scan::run(&rfp),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
