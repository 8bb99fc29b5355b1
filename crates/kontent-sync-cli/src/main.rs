//! ksync - Command-line client for the Kontent.ai Sync API
//!
//! Provides commands for:
//! - Initializing a sync session and printing its first token
//! - Fetching a single delta page
//! - Pulling every available page from a token
//! - Inspecting and validating the configuration file

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use kontent_sync_core::config::Config;
use kontent_sync_http::DEFAULT_CLIENT_NAME;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    config::ConfigCommand, delta::DeltaCommand, init::InitCommand, pull::PullCommand,
    CommandContext,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "ksync", version, about = "Kontent.ai Sync API client")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Named client from the config file
    #[arg(long, global = true, default_value = DEFAULT_CLIENT_NAME)]
    client: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start a new sync session and print its continuation token
    Init(InitCommand),
    /// Fetch one page of changes for a token
    Delta(DeltaCommand),
    /// Fetch pages until caught up (Ctrl-C cancels)
    Pull(PullCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);

    // Setup tracing; the config file's level applies unless -v is given
    let filter = match cli.verbose {
        0 => Config::load_or_default(&config_path).logging.level,
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    let ctx = CommandContext {
        format,
        config_path,
        client_name: cli.client,
    };

    match cli.command {
        Commands::Init(cmd) => cmd.execute(&ctx).await,
        Commands::Delta(cmd) => cmd.execute(&ctx).await,
        Commands::Pull(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
    }
}
