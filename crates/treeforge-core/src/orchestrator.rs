//! Generation orchestrator
//!
//! Drives the end-to-end pipeline: parse the input tree, partition it
//! into chunks, and for each chunk build a generation request, invoke
//! the completion capability, decode the response, reconcile it onto the
//! filesystem, and log the exchange. Strictly sequential: a later chunk
//! is never requested before the prior chunk's materialization and
//! logging complete. One bad chunk does not poison the rest of the run.

use std::path::{Path, PathBuf};

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use crate::codec;
use crate::error::{ForgeError, Result};
use crate::generator::{ChatMessage, Generator, InstructionStore, STRUCTURE_INSTRUCTION};
use crate::materialize::Materializer;
use crate::partition::{chunk_tree, list_paths};
use crate::prompt::{overwrite_decision, ChunkControl, OperatorPrompt, OverwriteDecision};
use crate::storage::Storage;
use crate::types::{
    ChunkOutcome, ChunkStatus, GenerationRecord, PipelineOptions, ProjectTree, RunMode,
    RunSummary,
};

/// Subdirectory of the output tree holding per-chunk audit logs
pub const RESPONSES_DIR: &str = ".responses";

static FLAG_TOKENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"--\w+\s*").unwrap());

/// Orchestrates one structure-generation run at a time
pub struct StructureOrchestrator {
    generator: Box<dyn Generator>,
    storage: Box<dyn Storage>,
    instructions: Box<dyn InstructionStore>,
    prompt: Box<dyn OperatorPrompt>,
}

impl StructureOrchestrator {
    pub fn new(
        generator: Box<dyn Generator>,
        storage: Box<dyn Storage>,
        instructions: Box<dyn InstructionStore>,
        prompt: Box<dyn OperatorPrompt>,
    ) -> Self {
        Self {
            generator,
            storage,
            instructions,
            prompt,
        }
    }

    /// Run the pipeline over `input`, materializing into `output_dir`.
    ///
    /// Structural failures (no tree in the input, bad chunk size, missing
    /// instruction template) are fatal and occur before any generation
    /// call. Per-chunk failures are recovered: the chunk is recorded in
    /// the summary and the run continues with the next one.
    pub async fn run(
        &self,
        input: &str,
        user_instructions: &str,
        output_dir: &Path,
        options: &PipelineOptions,
    ) -> Result<RunSummary> {
        let instruction = self.instructions.load(STRUCTURE_INSTRUCTION).await?;

        let tree = codec::extract(input).ok_or(ForgeError::NoStructureFound)?;
        let chunks = chunk_tree(&tree, options.chunk_size)?;

        let full_tree = codec::serialize(&tree).ok_or_else(|| {
            ForgeError::InvalidStructure("project tree failed to serialize".to_string())
        })?;
        let stripped = FLAG_TOKENS.replace_all(user_instructions, "").to_string();

        self.storage.mkdir(output_dir).await?;

        info!(
            chunks = chunks.len(),
            output = %output_dir.display(),
            "starting structure run"
        );

        let mut outcomes = Vec::new();

        for (i, chunk) in chunks.iter().enumerate() {
            let index = i + 1;
            let status = self
                .process_chunk(chunk, index, &instruction, &stripped, &full_tree, &tree, output_dir, options, &mut outcomes)
                .await?;

            // A declined overwrite already advanced past this chunk's
            // pause, matching the original flow.
            let paused = status != ChunkStatus::SkippedByOperator;
            if paused && options.mode == RunMode::Interactive && index < chunks.len() {
                if self.prompt.continue_to_next_chunk().await? == ChunkControl::Stop {
                    info!(completed = index, total = chunks.len(), "run stopped by operator");
                    break;
                }
            }
        }

        let output_dir = absolute_path(output_dir).await;
        let summary = RunSummary {
            success: true,
            chunk_total: chunks.len(),
            chunks_attempted: outcomes.len(),
            outcomes,
            output_dir,
            finished_at: Utc::now(),
        };

        info!(
            attempted = summary.chunks_attempted,
            total = summary.chunk_total,
            "structure run finished"
        );

        Ok(summary)
    }

    #[allow(clippy::too_many_arguments)]
    async fn process_chunk(
        &self,
        chunk: &ProjectTree,
        index: usize,
        instruction: &str,
        user_instructions: &str,
        full_tree: &str,
        tree: &ProjectTree,
        output_dir: &Path,
        options: &PipelineOptions,
        outcomes: &mut Vec<ChunkOutcome>,
    ) -> Result<ChunkStatus> {
        let chunk_paths = list_paths(chunk.root_contents());
        info!(chunk = index, files = ?chunk_paths, "processing chunk");

        let mut outcome = ChunkOutcome {
            index,
            files: chunk_paths.clone(),
            status: ChunkStatus::Materialized,
            record: None,
        };

        let chunk_json = match codec::serialize(chunk) {
            Some(json) => json,
            None => {
                warn!(chunk = index, "chunk failed to serialize, skipping");
                outcome.status = ChunkStatus::ParseFailed;
                outcomes.push(outcome);
                return Ok(ChunkStatus::ParseFailed);
            }
        };

        let messages = [
            ChatMessage::system(instruction),
            ChatMessage::user(build_chunk_request(user_instructions, full_tree, &chunk_json)),
        ];

        let response = match self.generator.generate(&messages).await {
            Ok(response) => response,
            Err(e) => {
                warn!(chunk = index, error = %e, "generation failed, skipping chunk");
                outcome.status = ChunkStatus::GenerationFailed;
                outcomes.push(outcome);
                return Ok(ChunkStatus::GenerationFailed);
            }
        };

        outcome.record = Some(GenerationRecord {
            chunk_index: index,
            raw_response: response.clone(),
        });

        let Some(generated) = codec::extract(&response) else {
            let err = ForgeError::FailedToParseResponse { chunk: index };
            warn!(chunk = index, error = %err, "skipping chunk");
            outcome.status = ChunkStatus::ParseFailed;
            outcomes.push(outcome);
            return Ok(ChunkStatus::ParseFailed);
        };

        // Conflict check against the files this chunk is about to write
        let project_dir = output_dir.join(tree.root_name());
        let mut existing = Vec::new();
        for path in &chunk_paths {
            if self.storage.exists(&project_dir.join(path)).await {
                existing.push(path.clone());
            }
        }

        if overwrite_decision(&existing, options.mode) == OverwriteDecision::AskOperator
            && !self.prompt.confirm_overwrite(&existing).await?
        {
            info!(chunk = index, "overwrite declined, skipping chunk");
            outcome.status = ChunkStatus::SkippedByOperator;
            outcomes.push(outcome);
            return Ok(ChunkStatus::SkippedByOperator);
        }

        // Materialize the parsed response, which carries the generated
        // contents for this chunk's paths.
        let materializer = Materializer::new(self.storage.as_ref());
        if let Err(e) = materializer
            .materialize(&generated, output_dir, options.specific_files.as_deref())
            .await
        {
            warn!(chunk = index, error = %e, "materialization failed, continuing");
            outcome.status = ChunkStatus::StorageFailed;
            outcomes.push(outcome);
            return Ok(ChunkStatus::StorageFailed);
        }

        // Audit log; a failed log write does not fail the chunk.
        if let Some(pretty) = codec::serialize(&generated) {
            let log_path = output_dir
                .join(RESPONSES_DIR)
                .join(format!("chunk_{}.json", index));
            if let Err(e) = self.storage.write_file(&log_path, &pretty).await {
                warn!(chunk = index, error = %e, "failed to log response");
            }
        }

        outcomes.push(outcome);
        Ok(ChunkStatus::Materialized)
    }
}

fn build_chunk_request(user_instructions: &str, full_tree: &str, chunk_json: &str) -> String {
    format!(
        "=== User Instructions ===\n{}\n\n\
         === Project Structure ===\n{}\n\n\
         === Current Chunk ===\n{}\n\n\
         Please generate the code for the files in this chunk. \
         Respond only with the JSON structure containing the generated \
         code in the contents field.",
        user_instructions, full_tree, chunk_json
    )
}

async fn absolute_path(path: &Path) -> PathBuf {
    tokio::fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::AutoPrompt;
    use crate::storage::LocalStorage;
    use crate::types::{Contents, DirectoryNode, FileNode};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Seven files across nested directories, contents not yet generated
    fn seven_file_input() -> String {
        let mut tree = ProjectTree::new("demo");
        let root = &mut tree.project.root_directory.contents;
        let file = |name: &str| FileNode {
            name: name.to_string(),
            contents: None,
        };
        root.files.push(file("README.md"));
        root.files.push(file("Cargo.toml"));
        root.directories.push(DirectoryNode {
            name: "src".to_string(),
            contents: Contents {
                files: vec![file("main.rs"), file("lib.rs"), file("config.rs")],
                directories: vec![DirectoryNode {
                    name: "utils".to_string(),
                    contents: Contents {
                        files: vec![file("paths.rs")],
                        directories: vec![],
                    },
                }],
            },
        });
        root.directories.push(DirectoryNode {
            name: "tests".to_string(),
            contents: Contents {
                files: vec![file("smoke.rs")],
                directories: vec![],
            },
        });
        format!(
            "Here is the project structure you asked for:\n{}\nLet me know!",
            codec::serialize(&tree).unwrap()
        )
    }

    fn fill_contents(contents: &mut Contents) {
        for file in &mut contents.files {
            file.contents = Some(json!(format!("// generated {}", file.name)));
        }
        for dir in &mut contents.directories {
            fill_contents(&mut dir.contents);
        }
    }

    /// Echoes the request's chunk back with generated contents, wrapped
    /// in prose the way real model output tends to be.
    struct EchoGenerator {
        calls: AtomicUsize,
        garbage_on: Option<usize>,
    }

    impl EchoGenerator {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                garbage_on: None,
            }
        }

        fn garbage_on(call: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                garbage_on: Some(call),
            }
        }
    }

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.garbage_on == Some(call) {
                return Ok("I'm sorry, I cannot produce that structure.".to_string());
            }
            let user = &messages[1].content;
            let section = user.split("=== Current Chunk ===").nth(1).unwrap();
            let mut chunk = codec::extract(section).unwrap();
            fill_contents(&mut chunk.project.root_directory.contents);
            Ok(format!(
                "Sure, here is the generated code:\n{}\nDone.",
                codec::serialize(&chunk).unwrap()
            ))
        }
    }

    struct FixedInstructions;

    #[async_trait]
    impl InstructionStore for FixedInstructions {
        async fn load(&self, _name: &str) -> Result<String> {
            Ok("You generate project structures as JSON.".to_string())
        }
    }

    /// Prompt with scripted answers; records what it was asked.
    struct ScriptedPrompt {
        overwrite_answer: bool,
        stop_after: Option<usize>,
        continues: AtomicUsize,
        overwrite_asks: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedPrompt {
        fn new(overwrite_answer: bool, stop_after: Option<usize>) -> Self {
            Self {
                overwrite_answer,
                stop_after,
                continues: AtomicUsize::new(0),
                overwrite_asks: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl OperatorPrompt for ScriptedPrompt {
        async fn confirm_overwrite(&self, existing: &[String]) -> Result<bool> {
            self.overwrite_asks
                .lock()
                .unwrap()
                .push(existing.to_vec());
            Ok(self.overwrite_answer)
        }

        async fn continue_to_next_chunk(&self) -> Result<ChunkControl> {
            let pauses = self.continues.fetch_add(1, Ordering::SeqCst) + 1;
            match self.stop_after {
                Some(limit) if pauses >= limit => Ok(ChunkControl::Stop),
                _ => Ok(ChunkControl::Continue),
            }
        }
    }

    fn orchestrator(
        generator: EchoGenerator,
        prompt: Box<dyn OperatorPrompt>,
    ) -> StructureOrchestrator {
        StructureOrchestrator::new(
            Box::new(generator),
            Box::new(LocalStorage::new()),
            Box::new(FixedInstructions),
            prompt,
        )
    }

    #[tokio::test]
    async fn seven_files_at_chunk_size_five_materialize_in_two_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(EchoGenerator::new(), Box::new(AutoPrompt));
        let options = PipelineOptions {
            mode: RunMode::AutoContinue,
            ..Default::default()
        };

        let summary = orch
            .run(&seven_file_input(), "make it nice", dir.path(), &options)
            .await
            .unwrap();

        assert!(summary.success);
        assert_eq!(summary.chunk_total, 2);
        assert_eq!(summary.chunks_attempted, 2);
        assert!(summary.all_materialized());

        let project = dir.path().join("demo");
        for path in [
            "README.md",
            "Cargo.toml",
            "src/main.rs",
            "src/lib.rs",
            "src/config.rs",
            "src/utils/paths.rs",
            "tests/smoke.rs",
        ] {
            let content = tokio::fs::read_to_string(project.join(path)).await.unwrap();
            assert!(content.starts_with("// generated "), "{}: {}", path, content);
        }

        for n in 1..=2 {
            let log = tokio::fs::read_to_string(
                dir.path().join(".responses").join(format!("chunk_{}.json", n)),
            )
            .await
            .unwrap();
            assert!(codec::extract(&log).is_some());
        }
    }

    #[tokio::test]
    async fn declined_overwrite_leaves_existing_files_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("demo");

        // Pre-populate three of the seven target files
        for path in ["README.md", "src/main.rs", "tests/smoke.rs"] {
            let full = project.join(path);
            tokio::fs::create_dir_all(full.parent().unwrap()).await.unwrap();
            tokio::fs::write(&full, "original content").await.unwrap();
        }

        let orch = orchestrator(
            EchoGenerator::new(),
            Box::new(ScriptedPrompt::new(false, None)),
        );
        // One file per chunk so a declined overwrite skips only the
        // conflicting file
        let options = PipelineOptions {
            chunk_size: 1,
            ..Default::default()
        };

        let summary = orch
            .run(&seven_file_input(), "", dir.path(), &options)
            .await
            .unwrap();

        assert_eq!(summary.chunk_total, 7);
        assert_eq!(summary.chunks_attempted, 7);
        let skipped = summary
            .outcomes
            .iter()
            .filter(|o| o.status == ChunkStatus::SkippedByOperator)
            .count();
        assert_eq!(skipped, 3);

        for path in ["README.md", "src/main.rs", "tests/smoke.rs"] {
            let content = tokio::fs::read_to_string(project.join(path)).await.unwrap();
            assert_eq!(content, "original content");
        }
        for path in ["Cargo.toml", "src/lib.rs", "src/config.rs", "src/utils/paths.rs"] {
            let content = tokio::fs::read_to_string(project.join(path)).await.unwrap();
            assert!(content.starts_with("// generated "));
        }
    }

    #[tokio::test]
    async fn unparseable_response_skips_only_that_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(EchoGenerator::garbage_on(1), Box::new(AutoPrompt));
        let options = PipelineOptions {
            mode: RunMode::AutoContinue,
            ..Default::default()
        };

        let summary = orch
            .run(&seven_file_input(), "", dir.path(), &options)
            .await
            .unwrap();

        assert!(summary.success);
        assert_eq!(summary.outcomes[0].status, ChunkStatus::ParseFailed);
        assert_eq!(summary.outcomes[1].status, ChunkStatus::Materialized);

        // Nothing logged for the failed chunk, chunk 2 logged normally
        assert!(!dir.path().join(".responses/chunk_1.json").exists());
        assert!(dir.path().join(".responses/chunk_2.json").exists());

        // Chunk 2's files made it to disk
        assert!(dir.path().join("demo/src/utils/paths.rs").exists());
        assert!(dir.path().join("demo/tests/smoke.rs").exists());
        // Chunk 1's files did not
        assert!(!dir.path().join("demo/README.md").exists());
    }

    #[tokio::test]
    async fn stop_sentinel_ends_run_after_current_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            EchoGenerator::new(),
            Box::new(ScriptedPrompt::new(true, Some(1))),
        );
        let options = PipelineOptions::default();

        let summary = orch
            .run(&seven_file_input(), "", dir.path(), &options)
            .await
            .unwrap();

        assert!(summary.success);
        assert_eq!(summary.chunk_total, 2);
        assert_eq!(summary.chunks_attempted, 1);

        // First chunk on disk, second never requested
        assert!(dir.path().join("demo/README.md").exists());
        assert!(!dir.path().join("demo/tests/smoke.rs").exists());
    }

    #[tokio::test]
    async fn zero_chunk_size_fails_before_any_generation() {
        let dir = tempfile::tempdir().unwrap();
        let generator = EchoGenerator::new();
        let orch = orchestrator(generator, Box::new(AutoPrompt));
        let options = PipelineOptions {
            chunk_size: 0,
            ..Default::default()
        };

        let result = orch.run(&seven_file_input(), "", dir.path(), &options).await;
        assert!(matches!(result, Err(ForgeError::InvalidArgument(_))));
        assert!(!dir.path().join("demo").exists());
    }

    #[tokio::test]
    async fn input_without_structure_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let orch = orchestrator(EchoGenerator::new(), Box::new(AutoPrompt));

        let result = orch
            .run("just some chat, no json", "", &out, &PipelineOptions::default())
            .await;

        assert!(matches!(result, Err(ForgeError::NoStructureFound)));
        // No partial state
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn flag_tokens_are_stripped_from_user_instructions() {
        let stripped = FLAG_TOKENS.replace_all("--auto build a blog --chunked please", "");
        assert_eq!(stripped, "build a blog please");
    }

    #[tokio::test]
    async fn summary_reports_absolute_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(EchoGenerator::new(), Box::new(AutoPrompt));
        let options = PipelineOptions {
            mode: RunMode::AutoContinue,
            ..Default::default()
        };

        let summary = orch
            .run(&seven_file_input(), "", dir.path(), &options)
            .await
            .unwrap();

        assert!(summary.output_dir.is_absolute());
    }
}
