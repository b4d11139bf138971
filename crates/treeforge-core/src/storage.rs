//! Storage abstraction
//!
//! Minimal capability surface consumed by the materializer, instruction
//! store, and packaging step. Backend-agnostic: `LocalStorage` runs on
//! the local filesystem today; a remote object store can replace it
//! without touching the materializer. Each operation is individually
//! atomic from the caller's perspective; there is no cross-operation
//! transaction, so recovery from a crash is idempotent re-run rather
//! than rollback.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;

use crate::error::{ForgeError, Result};

/// Metadata for a stored entry
#[derive(Debug, Clone)]
pub struct FileStat {
    pub modified: SystemTime,
}

/// Result of creating an archive
#[derive(Debug, Clone)]
pub struct ArchiveInfo {
    pub path: PathBuf,
    pub size: u64,
}

/// Storage capability surface
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write a file, creating parent directories as needed
    async fn write_file(&self, path: &Path, content: &str) -> Result<()>;

    /// Read a file; `None` when it does not exist or cannot be read
    async fn read_file(&self, path: &Path) -> Option<String>;

    /// List entry names in a directory
    async fn list_dir(&self, path: &Path) -> Result<Vec<String>>;

    /// Entry metadata; `None` when the path does not exist
    async fn stat(&self, path: &Path) -> Option<FileStat>;

    /// Create a directory (and parents); idempotent
    async fn mkdir(&self, path: &Path) -> Result<()>;

    /// Whether the path exists
    async fn exists(&self, path: &Path) -> bool;

    /// Zip `source_dir` into `<dest_dir>/<name>`
    async fn create_archive(
        &self,
        source_dir: &Path,
        dest_dir: &Path,
        name: &str,
    ) -> Result<ArchiveInfo>;
}

/// Local-disk storage backend
#[derive(Debug, Clone, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ForgeError::storage(parent, e))?;
        }
        tokio::fs::write(path, content)
            .await
            .map_err(|e| ForgeError::storage(path, e))
    }

    async fn read_file(&self, path: &Path) -> Option<String> {
        tokio::fs::read_to_string(path).await.ok()
    }

    async fn list_dir(&self, path: &Path) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(path)
            .await
            .map_err(|e| ForgeError::storage(path, e))?;
        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ForgeError::storage(path, e))?
        {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        Ok(names)
    }

    async fn stat(&self, path: &Path) -> Option<FileStat> {
        let metadata = tokio::fs::metadata(path).await.ok()?;
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        Some(FileStat { modified })
    }

    async fn mkdir(&self, path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| ForgeError::storage(path, e))
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn create_archive(
        &self,
        source_dir: &Path,
        dest_dir: &Path,
        name: &str,
    ) -> Result<ArchiveInfo> {
        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| ForgeError::storage(dest_dir, e))?;

        let source = source_dir.to_path_buf();
        let archive_path = dest_dir.join(name);
        let target = archive_path.clone();

        let size = tokio::task::spawn_blocking(move || zip_directory(&source, &target))
            .await
            .map_err(|e| ForgeError::Other(format!("archive task failed: {}", e)))?
            .map_err(|e| ForgeError::storage(&archive_path, e))?;

        Ok(ArchiveInfo {
            path: archive_path,
            size,
        })
    }
}

fn zip_directory(source: &Path, target: &Path) -> std::io::Result<u64> {
    let file = std::fs::File::create(target)?;
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    zip_entries(&mut writer, source, source, &options)?;

    writer
        .finish()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    Ok(std::fs::metadata(target)?.len())
}

fn zip_entries(
    writer: &mut zip::ZipWriter<std::fs::File>,
    base: &Path,
    dir: &Path,
    options: &zip::write::SimpleFileOptions,
) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let relative = path
            .strip_prefix(base)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?
            .to_string_lossy()
            .replace('\\', "/");

        if path.is_dir() {
            writer
                .add_directory(format!("{}/", relative), options.clone())
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            zip_entries(writer, base, &path, options)?;
        } else {
            writer
                .start_file(relative, options.clone())
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            let mut source = std::fs::File::open(&path)?;
            std::io::copy(&mut source, writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}
