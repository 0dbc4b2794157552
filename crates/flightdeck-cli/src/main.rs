//! deckctl - cockpit bridge control CLI
//!
//! Validates panel profiles, generates the protocol contract for the
//! exporter script, and runs the live bridge.

#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{ContractArgs, RunArgs};
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "deckctl")]
#[command(about = "Cockpit bridge CLI - validate panel profiles and talk to the simulator exporter")]
#[command(version)]
struct Cli {
    /// Output in JSON format for machine parsing
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a profile loads and every function builds
    Validate {
        /// Panel profile (YAML, or JSON by extension)
        profile: PathBuf,
    },

    /// Print the protocol contract for the exporter script
    Contract(ContractArgs),

    /// List the values, triggers and actions a profile exposes
    Bindings {
        /// Panel profile (YAML, or JSON by extension)
        profile: PathBuf,
    },

    /// Decode an ALERT_MESSAGE payload
    DecodeAlert {
        /// Base64 payload with '-' padding
        payload: String,
    },

    /// Run the bridge and print events
    Run(RunArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "deckctl={log_level},flightdeck_interface={log_level},flightdeck_functions={log_level}"
                )
                .into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match execute_command(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            let code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(code)
        }
    }
}

async fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Validate { profile } => commands::profile::validate(profile, cli.json),
        Commands::Contract(args) => commands::profile::contract(args),
        Commands::Bindings { profile } => commands::profile::bindings(profile, cli.json),
        Commands::DecodeAlert { payload } => commands::alert::execute(payload, cli.json),
        Commands::Run(args) => commands::run::execute(args, cli.json).await,
    }
}
