use super::print_lines;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use tabula_editor::{EngineConfig, Mutation, TableDocument};
use tabula_model::{Document, IdGenerator};

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// JSON file holding an array of mutations
    pub script: PathBuf,

    /// Id seed (defaults to one derived from the file name)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print each result as JSON instead of a summary
    #[arg(long)]
    pub json: bool,

    /// Stop at the first failing mutation
    #[arg(long)]
    pub strict: bool,
}

pub fn apply(args: ApplyArgs, config: EngineConfig) -> Result<()> {
    let source = fs::read_to_string(&args.script)
        .with_context(|| format!("Failed to read {}", args.script.display()))?;
    let mutations: Vec<Mutation> = serde_json::from_str(&source)
        .with_context(|| format!("Invalid mutation script {}", args.script.display()))?;

    let mut doc = match args.seed {
        Some(seed) => TableDocument::seeded(config, seed),
        None => TableDocument::from_tree(
            Document::new(),
            config,
            IdGenerator::for_document(&args.script.to_string_lossy()),
        ),
    };

    if !args.json {
        println!(
            "{} {} mutations",
            "Applying".bright_blue().bold(),
            mutations.len()
        );
    }

    let mut failures = 0;
    for (index, mutation) in mutations.into_iter().enumerate() {
        let name = mutation.name();
        match doc.apply(mutation) {
            Ok(result) if args.json => println!("{}", serde_json::to_string(&result)?),
            Ok(result) => {
                let marker = if result.applied { "✓".green() } else { "·".dimmed() };
                let mut summary = format!("v{}", result.version);
                if let Some(node) = result.inserted {
                    summary.push_str(&format!(" inserted {}", node));
                }
                if let Some(cursor) = result.cursor {
                    summary.push_str(&format!(" cursor {}", cursor));
                }
                if result.table_removed {
                    summary.push_str(" table removed");
                }
                println!("  {} {:>3} {} {}", marker, index, name, summary.dimmed());
            }
            Err(err) if args.strict => {
                return Err(err).with_context(|| format!("Mutation {} ({}) failed", index, name));
            }
            Err(err) => {
                failures += 1;
                eprintln!("  {} {:>3} {} - {}", "✗".red(), index, name, err.to_string().red());
            }
        }
    }

    if !args.json {
        println!();
        print_lines(&doc.lines());
        if failures > 0 {
            println!("{} {} mutations failed", "⚠️".yellow(), failures);
        }
    }

    Ok(())
}
