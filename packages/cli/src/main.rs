mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{apply, init, paste, ApplyArgs, InitArgs, PasteArgs};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Tabula CLI - structural table editing from the command line
#[derive(Parser, Debug)]
#[command(name = "tabula")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Engine config file (defaults to ./tabula.config.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default config file
    Init(InitArgs),

    /// Apply a JSON mutation script to a fresh document
    Apply(ApplyArgs),

    /// Normalize clipboard markup, optionally pasting it
    Paste(PasteArgs),
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Apply(args) => apply(args, config::load(&cwd, cli.config.as_deref())?),
        Command::Paste(args) => paste(args, config::load(&cwd, cli.config.as_deref())?),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
