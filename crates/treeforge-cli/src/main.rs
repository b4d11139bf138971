//! TreeForge CLI
//!
//! One-shot commands over the structure-generation pipeline.

mod api;
mod commands;
mod prompt;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::error;

#[derive(Parser)]
#[command(name = "treeforge")]
#[command(author, version, about = "TreeForge - Chunked AI project generation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a project from a structure description
    Generate {
        /// File containing the structure text (model output or fixture)
        input: PathBuf,

        /// Output directory (defaults to the configured one)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Free-text instructions forwarded to the generator
        #[arg(short, long, default_value = "")]
        instructions: String,

        /// Overwrite and continue without prompting
        #[arg(long)]
        auto: bool,

        /// Files per generation request
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Show the file paths and chunk layout of a structure without generating
    Inspect {
        /// File containing the structure text
        input: PathBuf,

        /// Files per generation request
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Zip a generated project
    Pack {
        /// Project directory (defaults to the most recent generated project)
        dir: Option<PathBuf>,

        /// Archive file name
        #[arg(short, long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(if cli.verbose {
            "treeforge_cli=debug,treeforge_core=debug"
        } else {
            "treeforge_cli=info,treeforge_core=warn"
        })
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let result = match cli.command {
        Commands::Generate {
            input,
            output,
            instructions,
            auto,
            chunk_size,
        } => {
            commands::generate::run(commands::generate::GenerateOptions {
                input,
                output,
                instructions,
                auto,
                chunk_size,
            })
            .await
        }
        Commands::Inspect { input, chunk_size } => {
            commands::inspect::run(&input, chunk_size).await
        }
        Commands::Pack { dir, name } => commands::pack::run(dir, name).await,
    };

    if let Err(ref e) = result {
        error!("Command failed: {}", e);
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    result
}
