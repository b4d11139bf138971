//! Generation capability and instruction templates
//!
//! The pipeline's only coupling to any model vendor: an ordered list of
//! role/content messages in, raw text out. Vendor adapters live outside
//! the core and implement [`Generator`].

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ForgeError, Result};
use crate::storage::{LocalStorage, Storage};

/// Name of the fixed system instruction used by every structure run
pub const STRUCTURE_INSTRUCTION: &str = "structure";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// External completion capability
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a text completion for the given conversation
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Named lookup for fixed instruction templates
#[async_trait]
pub trait InstructionStore: Send + Sync {
    async fn load(&self, name: &str) -> Result<String>;
}

/// Instruction templates stored as `<dir>/<name>.txt`
pub struct FileInstructionStore {
    dir: PathBuf,
    storage: LocalStorage,
}

impl FileInstructionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            storage: LocalStorage::new(),
        }
    }
}

#[async_trait]
impl InstructionStore for FileInstructionStore {
    async fn load(&self, name: &str) -> Result<String> {
        let path = self.dir.join(format!("{}.txt", name));
        self.storage.read_file(&path).await.ok_or_else(|| {
            ForgeError::Config(format!(
                "instruction template not found: {}",
                path.display()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_template_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new();
        storage
            .write_file(&dir.path().join("structure.txt"), "respond with JSON")
            .await
            .unwrap();

        let store = FileInstructionStore::new(dir.path());
        let text = store.load(STRUCTURE_INSTRUCTION).await.unwrap();
        assert_eq!(text, "respond with JSON");
    }

    #[tokio::test]
    async fn missing_template_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileInstructionStore::new(dir.path());
        assert!(matches!(
            store.load("structure").await,
            Err(ForgeError::Config(_))
        ));
    }
}
