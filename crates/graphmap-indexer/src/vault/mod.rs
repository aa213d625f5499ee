//! Storage layer the synchronizer reads from and writes to.
//!
//! Paths are vault-relative and slash-delimited; `/` names the root.

mod fs;
mod memory;

pub use fs::FsVault;
pub use memory::MemoryVault;

use crate::naming::ROOT_PATH;
use crate::tree::{parent_path, DocumentNode};
use crate::IndexerError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Component, Path};

/// What a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Folder,
    File,
}

/// Host storage operations the core depends on.
#[async_trait]
pub trait VaultStore: Send + Sync {
    /// Read the whole tree as it is right now.
    async fn snapshot(&self) -> Result<DocumentNode, IndexerError>;

    /// Kind of the entry at `path`, `None` when nothing is there.
    async fn entry_kind(&self, path: &str) -> Result<Option<EntryKind>, IndexerError>;

    /// Paths of the files directly inside `folder`.
    async fn list_files(&self, folder: &str) -> Result<Vec<String>, IndexerError>;

    /// Read a file's content.
    async fn read(&self, path: &str) -> Result<String, IndexerError>;

    /// Create a new file; fails if anything already exists at `path`.
    async fn create(&self, path: &str, content: &str) -> Result<(), IndexerError>;

    /// Overwrite an existing file.
    async fn modify(&self, path: &str, content: &str) -> Result<(), IndexerError>;

    /// Create a folder and any missing parents.
    async fn create_folder(&self, path: &str) -> Result<(), IndexerError>;

    /// Delete a file.
    async fn remove(&self, path: &str) -> Result<(), IndexerError>;
}

/// Vault-relative form of `path`, `None` if it is outside `root` or not UTF-8.
pub fn vault_relative(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut segments = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }

    if segments.is_empty() {
        Some(ROOT_PATH.to_string())
    } else {
        Some(segments.join("/"))
    }
}

/// Whether any segment of a vault path is hidden (starts with a dot).
pub fn is_hidden(path: &str) -> bool {
    path.split('/').any(|segment| segment.starts_with('.'))
}

/// Build a snapshot from a flat list of `(path, is_folder)` entries.
pub(crate) fn assemble_tree(
    root_name: &str,
    entries: impl IntoIterator<Item = (String, bool)>,
) -> DocumentNode {
    let mut by_parent: HashMap<String, Vec<(String, bool)>> = HashMap::new();
    for (path, is_folder) in entries {
        by_parent
            .entry(parent_path(&path).to_string())
            .or_default()
            .push((path, is_folder));
    }

    let children = assemble_children(ROOT_PATH, &mut by_parent);
    DocumentNode::root(root_name, children)
}

fn assemble_children(
    folder: &str,
    by_parent: &mut HashMap<String, Vec<(String, bool)>>,
) -> Vec<DocumentNode> {
    let entries = by_parent.remove(folder).unwrap_or_default();
    entries
        .into_iter()
        .map(|(path, is_folder)| {
            if is_folder {
                let children = assemble_children(&path, by_parent);
                DocumentNode::folder(path, children)
            } else {
                DocumentNode::file(path)
            }
        })
        .collect()
}
