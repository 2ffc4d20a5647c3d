//! Mizan CLI
//!
//! Offline operator tool for the compliance engine.
//!
//! # Usage
//!
//! ```bash
//! mizan catalog validate --catalog controls.json
//! mizan catalog list --domain 6
//! mizan applicability --profile hospital.yaml
//! mizan score --responses answers.yaml --profile hospital.yaml --format json
//! MIZAN_CONFIG=mizan.json mizan config show
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use mizan_compliance::ComplianceConfig;
use std::path::PathBuf;

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "mizan")]
#[command(author = "Mizan")]
#[command(version)]
#[command(about = "Mizan compliance engine command line interface", long_about = None)]
struct Cli {
    /// Engine configuration file (JSON)
    #[arg(long, global = true, env = "MIZAN_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    format: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the control catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogCommands,
    },
    /// Show which controls apply to an organization profile
    Applicability {
        /// Profile file (YAML or JSON)
        #[arg(long)]
        profile: PathBuf,
        /// Catalog file instead of the built-in catalog
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Score a response file
    Score {
        /// Response file: list of {control_id, answer, na_justification}
        #[arg(long)]
        responses: PathBuf,
        /// Profile file, enables the mandatory N/A check
        #[arg(long)]
        profile: Option<PathBuf>,
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Engine configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub(crate) enum CatalogCommands {
    /// Load and validate a catalog
    Validate {
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// List controls
    List {
        #[arg(long)]
        catalog: Option<PathBuf>,
        #[arg(long)]
        domain: Option<u8>,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Print the default configuration
    Defaults,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ComplianceConfig> {
    match path {
        Some(path) => ComplianceConfig::load(path)
            .with_context(|| format!("invalid configuration {}", path.display())),
        None => Ok(ComplianceConfig::default()),
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Catalog { action } => commands::catalog::handle(action, cli.format),
        Commands::Applicability { profile, catalog } => {
            commands::applicability::handle(&profile, catalog.as_deref(), cli.format)
        }
        Commands::Score { responses, profile, catalog } => commands::score::handle(
            &responses,
            profile.as_deref(),
            catalog.as_deref(),
            &config,
            cli.format,
        ),
        Commands::Config { action } => commands::config::handle(action, &config, cli.format),
    }
}

fn main() {
    mizan_common::telemetry::init_tracing("warn");

    if let Err(e) = run(Cli::parse()) {
        eprintln!("{} {e:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
