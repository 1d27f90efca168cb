use super::print_lines;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use tabula_editor::{EngineConfig, Mutation, TableDocument};
use tabula_model::{Document, IdGenerator};
use tabula_paste::{normalize, MarkupNode, PasteContext};

#[derive(Debug, Args)]
pub struct PasteArgs {
    /// JSON file holding the parsed clipboard markup
    pub markup: PathBuf,

    /// Paste the fragment into an empty document and print its lines
    #[arg(long)]
    pub apply: bool,

    /// Id seed (defaults to one derived from the file name)
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn paste(args: PasteArgs, config: EngineConfig) -> Result<()> {
    let source = fs::read_to_string(&args.markup)
        .with_context(|| format!("Failed to read {}", args.markup.display()))?;
    let nodes: Vec<MarkupNode> = serde_json::from_str(&source)
        .with_context(|| format!("Invalid markup {}", args.markup.display()))?;

    let fragment = normalize(&nodes, &PasteContext::default());
    if fragment.is_empty() {
        println!("{}", "⚠️  Nothing to paste".yellow());
        return Ok(());
    }

    if !args.apply {
        println!("{}", serde_json::to_string_pretty(&fragment)?);
        return Ok(());
    }

    let mut doc = match args.seed {
        Some(seed) => TableDocument::seeded(config, seed),
        None => TableDocument::from_tree(
            Document::new(),
            config,
            IdGenerator::for_document(&args.markup.to_string_lossy()),
        ),
    };
    let result = doc.apply(Mutation::Paste {
        position: 0,
        fragment,
    })?;
    println!(
        "{} {} tables, version {}",
        "Pasted".green().bold(),
        doc.tables().len(),
        result.version
    );
    print_lines(&doc.lines());
    Ok(())
}
