//! Vault backed by a directory on the local file system.

use super::{assemble_tree, vault_relative, EntryKind, VaultStore};
use crate::naming::ROOT_PATH;
use crate::tree::{child_path, DocumentNode};
use crate::IndexerError;
use async_trait::async_trait;
use ignore::WalkBuilder;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Directory-backed vault.
///
/// Hidden entries (names starting with a dot) are invisible to snapshots,
/// which keeps settings and editor metadata out of the index.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
    name: String,
}

impl FsVault {
    /// Open the vault rooted at `root`.
    pub fn open(root: &Path) -> Result<Self, IndexerError> {
        let root = root
            .canonicalize()
            .map_err(|_| IndexerError::NotFound(root.display().to_string()))?;

        if !root.is_dir() {
            return Err(IndexerError::InvalidPath(root.display().to_string()));
        }

        let name = root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("vault")
            .to_string();

        Ok(Self { root, name })
    }

    /// Canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Vault name (the root directory's name).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path for a vault path, rejecting anything that escapes the root.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, IndexerError> {
        if path == ROOT_PATH {
            return Ok(self.root.clone());
        }

        let rel = Path::new(path);
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(IndexerError::InvalidPath(path.to_string()));
        }

        Ok(self.root.join(rel))
    }
}

fn map_io(path: &str, e: std::io::Error) -> IndexerError {
    match e.kind() {
        ErrorKind::NotFound => IndexerError::NotFound(path.to_string()),
        ErrorKind::AlreadyExists => IndexerError::AlreadyExists(path.to_string()),
        _ => IndexerError::Io(e),
    }
}

/// Walk the directory into a flat entry list and assemble the tree.
fn scan_tree(root: &Path, name: &str) -> DocumentNode {
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .ignore(false)
        .parents(false)
        .follow_links(false)
        .build();

    let mut entries = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                // Entries can vanish mid-walk; the next pass picks up the change
                debug!(error = %e, "Walk error");
                continue;
            }
        };

        if entry.depth() == 0 {
            continue;
        }

        let Some(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_dir() && !file_type.is_file() {
            continue;
        }

        match vault_relative(root, entry.path()) {
            Some(rel) => entries.push((rel, file_type.is_dir())),
            None => warn!(path = ?entry.path(), "Skipping path that is not valid UTF-8"),
        }
    }

    debug!(entries = entries.len(), "Vault scanned");

    assemble_tree(name, entries)
}

#[async_trait]
impl VaultStore for FsVault {
    async fn snapshot(&self) -> Result<DocumentNode, IndexerError> {
        let root = self.root.clone();
        let name = self.name.clone();
        let tree = tokio::task::spawn_blocking(move || scan_tree(&root, &name)).await?;
        Ok(tree)
    }

    async fn entry_kind(&self, path: &str) -> Result<Option<EntryKind>, IndexerError> {
        let abs = self.resolve(path)?;
        match tokio::fs::metadata(&abs).await {
            Ok(meta) if meta.is_dir() => Ok(Some(EntryKind::Folder)),
            Ok(_) => Ok(Some(EntryKind::File)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(IndexerError::Io(e)),
        }
    }

    async fn list_files(&self, folder: &str) -> Result<Vec<String>, IndexerError> {
        let abs = self.resolve(folder)?;
        let mut dir = tokio::fs::read_dir(&abs)
            .await
            .map_err(|e| map_io(folder, e))?;

        let mut files = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                files.push(child_path(folder, name));
            }
        }
        files.sort();
        Ok(files)
    }

    async fn read(&self, path: &str) -> Result<String, IndexerError> {
        let abs = self.resolve(path)?;
        tokio::fs::read_to_string(&abs)
            .await
            .map_err(|e| map_io(path, e))
    }

    async fn create(&self, path: &str, content: &str) -> Result<(), IndexerError> {
        let abs = self.resolve(path)?;
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&abs)
            .await
            .map_err(|e| map_io(path, e))?;

        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        debug!(path, size = content.len(), "Created file");
        Ok(())
    }

    async fn modify(&self, path: &str, content: &str) -> Result<(), IndexerError> {
        let abs = self.resolve(path)?;
        if !tokio::fs::try_exists(&abs).await? {
            return Err(IndexerError::NotFound(path.to_string()));
        }

        // Atomic write: write to temp file, then rename
        let file_name = abs
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| IndexerError::InvalidPath(path.to_string()))?;
        let temp_path = abs.with_file_name(format!(".{}.tmp", file_name));
        tokio::fs::write(&temp_path, content).await?;
        tokio::fs::rename(&temp_path, &abs).await?;

        debug!(path, size = content.len(), "Modified file");
        Ok(())
    }

    async fn create_folder(&self, path: &str) -> Result<(), IndexerError> {
        let abs = self.resolve(path)?;
        tokio::fs::create_dir_all(&abs)
            .await
            .map_err(|e| map_io(path, e))
    }

    async fn remove(&self, path: &str) -> Result<(), IndexerError> {
        let abs = self.resolve(path)?;
        tokio::fs::remove_file(&abs)
            .await
            .map_err(|e| map_io(path, e))
    }
}
