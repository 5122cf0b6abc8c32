//! Cedar QA CLI - Main Entry Point
//!
//! Runs the browser scenarios and the pet-store API checks, and exposes the
//! test data generators and configuration for inspection.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use cedar_qa_common::config::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use commands::{config, generate, pets, run};

/// Cedar QA - UI and API test automation
#[derive(Parser)]
#[command(name = "cedar-qa")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, env = CONFIG_PATH_ENV, default_value = DEFAULT_CONFIG_PATH, global = true)]
    config: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run browser scenarios
    Run(run::RunArgs),

    /// Pet-store API checks
    #[command(subcommand)]
    Pets(pets::PetsCommands),

    /// Generate test data
    #[command(subcommand, name = "gen")]
    Generate(generate::GenerateCommands),

    /// Inspect the configuration
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let outcome = match cli.command {
        Commands::Run(args) => run::execute(args, &cli.config, cli.format).await,
        Commands::Pets(cmd) => pets::execute(cmd, &cli.config, cli.format).await,
        Commands::Generate(cmd) => generate::execute(cmd, cli.format),
        Commands::Config(cmd) => config::execute(cmd, &cli.config, cli.format),
    };

    match outcome {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            std::process::exit(2);
        }
    }
}
