//! Filesystem materializer
//!
//! Realizes a project tree onto a storage backend: directories are
//! created recursively, files with generated contents are written
//! (overwriting unconditionally). The caller owns any pre-write
//! confirmation policy. The sole component with write side effects.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;

use crate::error::{ForgeError, Result};
use crate::types::{Contents, ProjectTree};

/// Writes project trees through a storage backend
pub struct Materializer<'a> {
    storage: &'a dyn crate::storage::Storage,
}

impl<'a> Materializer<'a> {
    pub fn new(storage: &'a dyn crate::storage::Storage) -> Self {
        Self { storage }
    }

    /// Materialize `tree` under `<base>/<root name>`.
    ///
    /// When `specific_files` is given, only files whose relative path
    /// (root name excluded) appears in the list are written; everything
    /// else is left untouched. Files whose contents are absent are
    /// skipped as not yet generated. Re-running is idempotent.
    pub async fn materialize(
        &self,
        tree: &ProjectTree,
        base: &Path,
        specific_files: Option<&[String]>,
    ) -> Result<()> {
        let root_name = tree.root_name();
        if root_name.is_empty() || root_name.contains('/') || root_name.contains('\\') {
            return Err(ForgeError::InvalidStructure(format!(
                "root directory name is not a single path segment: {:?}",
                root_name
            )));
        }

        let allow: Option<HashSet<&str>> =
            specific_files.map(|paths| paths.iter().map(String::as_str).collect());

        let project_dir = base.join(root_name);
        self.write_contents(tree.root_contents(), project_dir, String::new(), allow.as_ref())
            .await
    }

    fn write_contents<'b>(
        &'b self,
        contents: &'b Contents,
        dir: PathBuf,
        prefix: String,
        allow: Option<&'b HashSet<&'b str>>,
    ) -> BoxFuture<'b, Result<()>> {
        Box::pin(async move {
            self.storage.mkdir(&dir).await?;

            for file in &contents.files {
                let Some(rendered) = file.rendered_contents() else {
                    continue;
                };
                let relative = if prefix.is_empty() {
                    file.name.clone()
                } else {
                    format!("{}/{}", prefix, file.name)
                };
                if let Some(allow) = allow {
                    if !allow.contains(relative.as_str()) {
                        continue;
                    }
                }
                self.storage.write_file(&dir.join(&file.name), &rendered).await?;
            }

            for sub in &contents.directories {
                let sub_prefix = if prefix.is_empty() {
                    sub.name.clone()
                } else {
                    format!("{}/{}", prefix, sub.name)
                };
                self.write_contents(&sub.contents, dir.join(&sub.name), sub_prefix, allow)
                    .await?;
            }

            Ok(())
        })
    }
}
