//! vendo-cli - Command-line interface for vendo
//!
//! Provides both a REPL and one-shot command execution.

mod commands;
mod render;
mod repl;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vendo_core::{Config, Money};

#[derive(Parser)]
#[command(name = "vendo-cli")]
#[command(about = "Interactive front end for the vendo vending machine")]
#[command(version)]
struct Cli {
    /// Catalog JSON file (overrides the config file)
    #[arg(short, long, env = "VENDO_CATALOG")]
    catalog: Option<PathBuf>,

    /// YAML config file
    #[arg(long, env = "VENDO_CONFIG")]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive session
    Repl,

    /// Print the catalog
    List,

    /// Show how an amount is paid back in coins
    Change {
        /// Amount such as 3.85
        amount: Money,
    },

    /// Run a session from a script file, one command line per line
    Run {
        /// Script file
        script: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .map_err(|e| {
        eprintln!("{}: {}", "Config error".red(), e);
        e
    })?;

    if let Some(path) = cli.catalog {
        config.catalog.path = path;
    }
    if cli.no_color {
        config.repl.color = false;
    }
    if !config.repl.color {
        colored::control::set_override(false);
    }

    match cli.command {
        Some(Commands::Repl) | None => {
            repl::run(&config)?;
        }
        Some(cmd) => match commands::execute(&config, cmd) {
            Ok(output) => {
                println!("{}", output);
            }
            Err(e) => {
                eprintln!("{}: {}", "Error".red(), e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
