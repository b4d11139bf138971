//! Pack command - zip a generated project
//!
//! With no directory argument, picks the most recently modified project
//! under the configured output directory.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use colored::Colorize;
use treeforge_core::{ForgeConfig, LocalStorage, Storage, RESPONSES_DIR};

pub async fn run(dir: Option<PathBuf>, name: Option<String>) -> Result<()> {
    let config = ForgeConfig::load_or_default(&std::env::current_dir()?)?;
    let storage = LocalStorage::new();

    let dir = match dir {
        Some(dir) => dir,
        None => latest_project(&storage, Path::new(&config.output_dir))
            .await
            .ok_or_else(|| {
                anyhow!(
                    "no generated project found under {}; pass a directory explicitly",
                    config.output_dir
                )
            })?,
    };

    let project_name = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "project".to_string());
    let name = name.unwrap_or_else(|| format!("{}.zip", project_name));
    let dest = dir.parent().unwrap_or(Path::new(".")).to_path_buf();

    let info = storage.create_archive(&dir, &dest, &name).await?;

    println!(
        "{} Archived {} → {} ({} bytes)",
        "📦".green(),
        dir.display().to_string().cyan(),
        info.path.display().to_string().cyan(),
        info.size
    );

    Ok(())
}

/// Most recently modified project directory under `output_dir`, ignoring
/// the per-chunk response logs.
async fn latest_project(storage: &LocalStorage, output_dir: &Path) -> Option<PathBuf> {
    let entries = storage.list_dir(output_dir).await.ok()?;
    let mut best: Option<(PathBuf, std::time::SystemTime)> = None;

    for entry in entries {
        if entry == RESPONSES_DIR {
            continue;
        }
        let path = output_dir.join(&entry);
        // Only directories can be projects
        if storage.list_dir(&path).await.is_err() {
            continue;
        }
        if let Some(stat) = storage.stat(&path).await {
            let newer = best
                .as_ref()
                .map(|(_, modified)| stat.modified > *modified)
                .unwrap_or(true);
            if newer {
                best = Some((path, stat.modified));
            }
        }
    }

    best.map(|(path, _)| path)
}
