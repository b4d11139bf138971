//! Console operator prompts

use async_trait::async_trait;
use colored::Colorize;
use dialoguer::Input;
use treeforge_core::{ChunkControl, ForgeError, OperatorPrompt, Result};

/// Line-based terminal prompts: overwrite confirmation (`y`/other) and
/// between-chunk continuation (Enter / `stop`).
pub struct ConsolePrompt;

#[async_trait]
impl OperatorPrompt for ConsolePrompt {
    async fn confirm_overwrite(&self, existing: &[String]) -> Result<bool> {
        println!();
        println!("{}", "⚠️  The following files already exist:".yellow());
        for file in existing {
            println!("  - {}", file);
        }

        let answer: String = Input::new()
            .with_prompt("Do you want to overwrite these files? (y/n)")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| ForgeError::Other(e.to_string()))?;

        Ok(answer.trim().eq_ignore_ascii_case("y"))
    }

    async fn continue_to_next_chunk(&self) -> Result<ChunkControl> {
        let answer: String = Input::new()
            .with_prompt("Press Enter to continue to next chunk (or type \"stop\" to end)")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| ForgeError::Other(e.to_string()))?;

        if answer.trim().eq_ignore_ascii_case("stop") {
            Ok(ChunkControl::Stop)
        } else {
            Ok(ChunkControl::Continue)
        }
    }
}
