//! Inspect command - dry-run view of a structure's paths and chunks

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use treeforge_core::{chunk_tree, extract, list_paths, ForgeConfig};

pub async fn run(input: &Path, chunk_size: Option<usize>) -> Result<()> {
    let config = ForgeConfig::load_or_default(&std::env::current_dir()?)?;
    let chunk_size = chunk_size.unwrap_or(config.chunk_size);

    let text = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("failed to read input file {}", input.display()))?;

    let tree = extract(&text)
        .ok_or_else(|| anyhow!("no valid project structure found in {}", input.display()))?;

    let paths = list_paths(tree.root_contents());
    println!(
        "{} {} ({} files)",
        "📂".cyan(),
        tree.root_name().bold(),
        paths.len()
    );
    for path in &paths {
        println!("  {}", path);
    }

    let chunks = chunk_tree(&tree, chunk_size)?;
    println!();
    println!(
        "{} {} chunks at {} files per request",
        "📦".cyan(),
        chunks.len(),
        chunk_size
    );
    for (i, chunk) in chunks.iter().enumerate() {
        let files = list_paths(chunk.root_contents());
        println!("  chunk {}: {}", i + 1, files.join(", ").dimmed());
    }

    Ok(())
}
