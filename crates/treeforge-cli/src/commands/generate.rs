//! Generate command - run the full structure pipeline

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use treeforge_core::{
    AutoPrompt, ChunkStatus, FileInstructionStore, ForgeConfig, LocalStorage, OperatorPrompt,
    PipelineOptions, RunMode, StructureOrchestrator,
};

use crate::api::HttpGenerator;
use crate::prompt::ConsolePrompt;

pub struct GenerateOptions {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub instructions: String,
    pub auto: bool,
    pub chunk_size: Option<usize>,
}

pub async fn run(opts: GenerateOptions) -> Result<()> {
    let project_dir = std::env::current_dir()?;
    let config = ForgeConfig::load_or_default(&project_dir)?;

    let input = tokio::fs::read_to_string(&opts.input)
        .await
        .with_context(|| format!("failed to read input file {}", opts.input.display()))?;

    let output_dir = opts
        .output
        .unwrap_or_else(|| PathBuf::from(&config.output_dir));
    let mode = if opts.auto {
        RunMode::AutoContinue
    } else {
        RunMode::Interactive
    };
    let options = PipelineOptions {
        chunk_size: opts.chunk_size.unwrap_or(config.chunk_size),
        mode,
        specific_files: None,
    };

    let prompt: Box<dyn OperatorPrompt> = if opts.auto {
        Box::new(AutoPrompt)
    } else {
        Box::new(ConsolePrompt)
    };

    let orchestrator = StructureOrchestrator::new(
        Box::new(HttpGenerator::from_config(&config)),
        Box::new(LocalStorage::new()),
        Box::new(FileInstructionStore::new(&config.agents_dir)),
        prompt,
    );

    println!(
        "{}",
        format!("🤖 Generating project with {}...", config.model)
            .cyan()
            .bold()
    );

    let summary = orchestrator
        .run(&input, &opts.instructions, &output_dir, &options)
        .await?;

    println!();
    for outcome in &summary.outcomes {
        let (icon, label) = match outcome.status {
            ChunkStatus::Materialized => ("✅", "written".green()),
            ChunkStatus::SkippedByOperator => ("⏭️", "skipped".yellow()),
            ChunkStatus::GenerationFailed => ("❌", "generation failed".red()),
            ChunkStatus::ParseFailed => ("❌", "unparseable response".red()),
            ChunkStatus::StorageFailed => ("❌", "storage failure".red()),
        };
        println!(
            "  {} chunk {} ({} files) - {}",
            icon,
            outcome.index,
            outcome.files.len(),
            label
        );
    }

    println!();
    println!(
        "{} {} of {} chunks processed",
        "📦".green(),
        summary.chunks_attempted,
        summary.chunk_total
    );
    println!(
        "{} Files created in: {}",
        "📁".green(),
        summary.output_dir.display().to_string().cyan()
    );
    println!(
        "{} Responses saved in: {}",
        "💾".green(),
        summary
            .output_dir
            .join(treeforge_core::RESPONSES_DIR)
            .display()
            .to_string()
            .dimmed()
    );

    if !summary.all_materialized() {
        println!(
            "{}",
            "⚠️  Some chunks were not written; re-run against the same output directory to fill the gaps."
                .yellow()
        );
    }

    Ok(())
}
