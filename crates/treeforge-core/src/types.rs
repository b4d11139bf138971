//! Core type definitions for TreeForge
//!
//! The canonical project-tree shape exchanged with the model:
//! `{ "project": { "rootDirectory": { "name", "contents": { "files", "directories" } } } }`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Number of files handed to the model per generation request.
///
/// Bounds the expected response size of a single request.
pub const DEFAULT_CHUNK_SIZE: usize = 5;

/// Canonical project tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectTree {
    pub project: Project,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "rootDirectory")]
    pub root_directory: DirectoryNode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryNode {
    pub name: String,
    #[serde(default)]
    pub contents: Contents,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contents {
    #[serde(default)]
    pub files: Vec<FileNode>,
    #[serde(default)]
    pub directories: Vec<DirectoryNode>,
}

/// A single file entry
///
/// `contents` is `None` when the file has not been generated yet; such
/// files are skipped during materialization. A string value is written
/// verbatim, any other JSON value is pretty-printed first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<serde_json::Value>,
}

impl ProjectTree {
    /// Create an empty tree with the given root directory name
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            project: Project {
                root_directory: DirectoryNode {
                    name: root_name.into(),
                    contents: Contents::default(),
                },
            },
        }
    }

    /// Name of the root directory
    pub fn root_name(&self) -> &str {
        &self.project.root_directory.name
    }

    /// Contents of the root directory
    pub fn root_contents(&self) -> &Contents {
        &self.project.root_directory.contents
    }
}

impl FileNode {
    /// Render file contents for writing: strings verbatim, everything
    /// else pretty-printed JSON. `None` for not-yet-generated files.
    pub fn rendered_contents(&self) -> Option<String> {
        match &self.contents {
            None => None,
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(
                serde_json::to_string_pretty(other)
                    .unwrap_or_else(|_| other.to_string()),
            ),
        }
    }
}

/// Outcome of validating a candidate JSON value against the tree shape
#[derive(Debug)]
pub enum SchemaCheck {
    Valid(ProjectTree),
    Invalid(String),
}

/// Validate a parsed JSON value against the ProjectTree shape.
///
/// Replaces ad hoc property probing with one explicit check: the value
/// must carry `project.rootDirectory.contents`, and every directory and
/// file name must be a single path segment.
pub fn validate_tree(value: serde_json::Value) -> SchemaCheck {
    let has_shape = value
        .get("project")
        .and_then(|p| p.get("rootDirectory"))
        .map(|r| r.get("contents").is_some())
        .unwrap_or(false);

    if !has_shape {
        return SchemaCheck::Invalid(
            "missing project.rootDirectory.contents".to_string(),
        );
    }

    let tree: ProjectTree = match serde_json::from_value(value) {
        Ok(tree) => tree,
        Err(e) => return SchemaCheck::Invalid(e.to_string()),
    };

    if let Err(reason) = check_names(&tree.project.root_directory) {
        return SchemaCheck::Invalid(reason);
    }

    SchemaCheck::Valid(tree)
}

fn check_names(dir: &DirectoryNode) -> std::result::Result<(), String> {
    if !is_single_segment(&dir.name) {
        return Err(format!("invalid directory name: {:?}", dir.name));
    }
    for file in &dir.contents.files {
        if !is_single_segment(&file.name) {
            return Err(format!("invalid file name: {:?}", file.name));
        }
    }
    for sub in &dir.contents.directories {
        check_names(sub)?;
    }
    Ok(())
}

fn is_single_segment(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('\\')
}

/// Raw model exchange kept per chunk for audit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub chunk_index: usize,
    pub raw_response: String,
}

/// How the run handles operator interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Prompt before overwriting and between chunks
    Interactive,
    /// Never prompt; overwrite and continue
    AutoContinue,
}

/// Options for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub chunk_size: usize,
    pub mode: RunMode,
    /// Restrict materialization to these relative file paths (resume support)
    pub specific_files: Option<Vec<String>>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            mode: RunMode::Interactive,
            specific_files: None,
        }
    }
}

/// Per-chunk result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkStatus {
    Materialized,
    SkippedByOperator,
    GenerationFailed,
    ParseFailed,
    StorageFailed,
}

#[derive(Debug, Clone)]
pub struct ChunkOutcome {
    /// 1-based chunk index, matching the `.responses/chunk_<N>.json` key
    pub index: usize,
    pub files: Vec<String>,
    pub status: ChunkStatus,
    pub record: Option<GenerationRecord>,
}

/// Result of a full pipeline run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub success: bool,
    pub chunk_total: usize,
    pub chunks_attempted: usize,
    pub outcomes: Vec<ChunkOutcome>,
    /// Absolute output directory, handed to the packaging step
    pub output_dir: PathBuf,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// True when every attempted chunk reached the filesystem
    pub fn all_materialized(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| o.status == ChunkStatus::Materialized)
    }
}
