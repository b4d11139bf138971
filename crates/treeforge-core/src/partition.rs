//! Tree partitioner
//!
//! Flattens a project tree into an ordered list of file paths and
//! repartitions a subset of paths back into a structurally valid
//! sub-tree. Pure, no I/O. Traversal order (pre-order, files before
//! subdirectories) is shared with the materializer: chunk numbering and
//! audit logs depend on it.

use std::collections::HashMap;

use crate::error::{ForgeError, Result};
use crate::types::{Contents, DirectoryNode, FileNode, ProjectTree};

/// List every file path reachable from `contents`, depth-first,
/// files at a level before that level's subdirectories.
pub fn list_paths(contents: &Contents) -> Vec<String> {
    let mut paths = Vec::new();
    collect_paths(contents, "", &mut paths);
    paths
}

fn collect_paths(contents: &Contents, prefix: &str, out: &mut Vec<String>) {
    for file in &contents.files {
        out.push(join_path(prefix, &file.name));
    }
    for dir in &contents.directories {
        collect_paths(&dir.contents, &join_path(prefix, &dir.name), out);
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Split a tree into consecutive chunks of at most `chunk_size` files.
///
/// The chunks form a true partition of the tree's file paths: every path
/// appears in exactly one chunk, in traversal order, and every chunk
/// shares the source tree's root directory name. An empty tree yields no
/// chunks.
pub fn chunk_tree(tree: &ProjectTree, chunk_size: usize) -> Result<Vec<ProjectTree>> {
    if chunk_size == 0 {
        return Err(ForgeError::InvalidArgument(
            "chunk size must be positive".to_string(),
        ));
    }

    let paths = list_paths(tree.root_contents());
    Ok(paths
        .chunks(chunk_size)
        .map(|group| rebuild(tree, group))
        .collect())
}

/// Rebuild a sub-tree containing only the given file paths.
///
/// Walks each path, creating the directory spine on demand in the output
/// tree and copying the matching file node from the source. Paths with no
/// counterpart in the source are dropped with a warning; they can only
/// appear when a caller passes paths from a different tree.
pub fn rebuild(tree: &ProjectTree, paths: &[String]) -> ProjectTree {
    let index = file_index(tree);
    let mut out = ProjectTree::new(tree.root_name());

    for path in paths {
        let Some(file) = index.get(path.as_str()) else {
            tracing::warn!(path = %path, "dropping path with no file in source tree");
            continue;
        };

        let segments: Vec<&str> = path.split('/').collect();
        let mut level = &mut out.project.root_directory.contents;
        for segment in &segments[..segments.len() - 1] {
            let pos = match level.directories.iter().position(|d| d.name == *segment) {
                Some(pos) => pos,
                None => {
                    level.directories.push(DirectoryNode {
                        name: segment.to_string(),
                        contents: Contents::default(),
                    });
                    level.directories.len() - 1
                }
            };
            level = &mut level.directories[pos].contents;
        }
        level.files.push((*file).clone());
    }

    out
}

/// Index every file in the tree by its path, built once per rebuild so
/// lookups stay constant-time instead of rescanning the tree per path.
fn file_index(tree: &ProjectTree) -> HashMap<String, &FileNode> {
    let mut index = HashMap::new();
    index_contents(tree.root_contents(), "", &mut index);
    index
}

fn index_contents<'a>(
    contents: &'a Contents,
    prefix: &str,
    index: &mut HashMap<String, &'a FileNode>,
) {
    for file in &contents.files {
        index.insert(join_path(prefix, &file.name), file);
    }
    for dir in &contents.directories {
        index_contents(&dir.contents, &join_path(prefix, &dir.name), index);
    }
}
