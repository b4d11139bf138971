//! Operator interaction
//!
//! The overwrite policy is a pure decision function; resolving
//! `AskOperator` through a live terminal is an adapter concern, which
//! keeps the orchestrator state machine testable without one.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::RunMode;

/// What to do about files that already exist in the output directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteDecision {
    Proceed,
    AskOperator,
}

/// Whether the run advances to the next chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkControl {
    Continue,
    Stop,
}

/// Pure overwrite policy: no conflicts or auto-continue mode proceed
/// silently; conflicts in interactive mode go to the operator.
pub fn overwrite_decision(existing: &[String], mode: RunMode) -> OverwriteDecision {
    if existing.is_empty() || mode == RunMode::AutoContinue {
        OverwriteDecision::Proceed
    } else {
        OverwriteDecision::AskOperator
    }
}

/// I/O adapter resolving operator decisions
#[async_trait]
pub trait OperatorPrompt: Send + Sync {
    /// Ask whether the listed existing files may be overwritten
    async fn confirm_overwrite(&self, existing: &[String]) -> Result<bool>;

    /// Pause between chunks; `Stop` ends the run gracefully
    async fn continue_to_next_chunk(&self) -> Result<ChunkControl>;
}

/// Prompt that always proceeds; used in auto-continue mode and tests
pub struct AutoPrompt;

#[async_trait]
impl OperatorPrompt for AutoPrompt {
    async fn confirm_overwrite(&self, _existing: &[String]) -> Result<bool> {
        Ok(true)
    }

    async fn continue_to_next_chunk(&self) -> Result<ChunkControl> {
        Ok(ChunkControl::Continue)
    }
}
