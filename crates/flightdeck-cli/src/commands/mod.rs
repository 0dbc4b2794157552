//! Command implementations for deckctl

pub mod alert;
pub mod profile;
pub mod run;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ContractFormat {
    /// Lua driver tables read by the exporter script
    #[default]
    Lua,
    /// Structured contract for tooling
    Json,
}

#[derive(Debug, Args)]
pub struct ContractArgs {
    /// Panel profile (YAML, or JSON by extension)
    pub profile: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = ContractFormat::Lua)]
    pub format: ContractFormat,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Panel profile (YAML, or JSON by extension)
    pub profile: PathBuf,

    /// Override the local listen address
    #[arg(long)]
    pub listen: Option<SocketAddr>,

    /// Override the exporter address
    #[arg(long)]
    pub remote: Option<SocketAddr>,

    /// Override the export driver to request
    #[arg(long)]
    pub driver: Option<String>,

    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(long)]
    pub duration: Option<u64>,
}
