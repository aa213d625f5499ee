//! In-memory vault for tests and embedders.

use super::{assemble_tree, EntryKind, VaultStore};
use crate::naming::ROOT_PATH;
use crate::tree::{parent_path, DocumentNode};
use crate::IndexerError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
enum MemEntry {
    Folder,
    File(String),
}

/// Vault kept entirely in memory.
///
/// The `add_*`, `rename` and `delete` helpers play the part of a user editing
/// the vault and are not recorded. Writes through [`VaultStore`] are recorded
/// in a write log.
#[derive(Debug)]
pub struct MemoryVault {
    name: String,
    entries: Mutex<BTreeMap<String, MemEntry>>,
    write_log: Mutex<Vec<String>>,
    failing: Mutex<BTreeSet<String>>,
}

impl MemoryVault {
    /// Create an empty vault.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Mutex::new(BTreeMap::new()),
            write_log: Mutex::new(Vec::new()),
            failing: Mutex::new(BTreeSet::new()),
        }
    }

    /// Create a vault holding the given files (parents created implicitly).
    pub fn with_files(name: impl Into<String>, files: &[(&str, &str)]) -> Self {
        let vault = Self::new(name);
        for (path, content) in files {
            vault.add_file(path, content);
        }
        vault
    }

    /// Add or replace a file, creating missing parent folders.
    pub fn add_file(&self, path: &str, content: &str) {
        let mut entries = self.entries.lock();
        insert_parents(&mut entries, path);
        entries.insert(path.to_string(), MemEntry::File(content.to_string()));
    }

    /// Add a folder, creating missing parent folders.
    pub fn add_folder(&self, path: &str) {
        let mut entries = self.entries.lock();
        insert_parents(&mut entries, path);
        entries.insert(path.to_string(), MemEntry::Folder);
    }

    /// Move an entry and everything below it.
    pub fn rename(&self, from: &str, to: &str) {
        let mut entries = self.entries.lock();
        let moved: Vec<String> = entries
            .keys()
            .filter(|k| is_at_or_below(k, from))
            .cloned()
            .collect();

        insert_parents(&mut entries, to);
        for old in moved {
            if let Some(entry) = entries.remove(&old) {
                let new = format!("{}{}", to, &old[from.len()..]);
                entries.insert(new, entry);
            }
        }
    }

    /// Remove an entry and everything below it.
    pub fn delete(&self, path: &str) {
        self.entries.lock().retain(|k, _| !is_at_or_below(k, path));
    }

    /// Current content of a file.
    pub fn content(&self, path: &str) -> Option<String> {
        match self.entries.lock().get(path) {
            Some(MemEntry::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    /// Whether anything exists at `path`.
    pub fn contains(&self, path: &str) -> bool {
        path == ROOT_PATH || self.entries.lock().contains_key(path)
    }

    /// Paths written through the store, oldest first.
    pub fn write_log(&self) -> Vec<String> {
        self.write_log.lock().clone()
    }

    /// Drain the write log.
    pub fn take_write_log(&self) -> Vec<String> {
        std::mem::take(&mut *self.write_log.lock())
    }

    /// Make every subsequent write to `path` fail.
    pub fn fail_writes_to(&self, path: &str) {
        self.failing.lock().insert(path.to_string());
    }

    fn check_failing(&self, path: &str) -> Result<(), IndexerError> {
        if self.failing.lock().contains(path) {
            return Err(IndexerError::Storage(format!("write refused: {}", path)));
        }
        Ok(())
    }
}

fn is_at_or_below(path: &str, base: &str) -> bool {
    match path.strip_prefix(base) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn insert_parents(entries: &mut BTreeMap<String, MemEntry>, path: &str) {
    let mut parent = parent_path(path);
    while parent != ROOT_PATH {
        entries
            .entry(parent.to_string())
            .or_insert(MemEntry::Folder);
        parent = parent_path(parent);
    }
}

#[async_trait]
impl VaultStore for MemoryVault {
    async fn snapshot(&self) -> Result<DocumentNode, IndexerError> {
        let entries = self.entries.lock();
        let flat = entries
            .iter()
            .map(|(path, entry)| (path.clone(), matches!(entry, MemEntry::Folder)));
        Ok(assemble_tree(&self.name, flat))
    }

    async fn entry_kind(&self, path: &str) -> Result<Option<EntryKind>, IndexerError> {
        if path == ROOT_PATH {
            return Ok(Some(EntryKind::Folder));
        }
        Ok(self.entries.lock().get(path).map(|entry| match entry {
            MemEntry::Folder => EntryKind::Folder,
            MemEntry::File(_) => EntryKind::File,
        }))
    }

    async fn list_files(&self, folder: &str) -> Result<Vec<String>, IndexerError> {
        if !self.contains(folder) {
            return Err(IndexerError::NotFound(folder.to_string()));
        }
        Ok(self
            .entries
            .lock()
            .iter()
            .filter(|(path, entry)| {
                matches!(entry, MemEntry::File(_)) && parent_path(path) == folder
            })
            .map(|(path, _)| path.clone())
            .collect())
    }

    async fn read(&self, path: &str) -> Result<String, IndexerError> {
        match self.entries.lock().get(path) {
            Some(MemEntry::File(content)) => Ok(content.clone()),
            Some(MemEntry::Folder) => Err(IndexerError::NotAFile(path.to_string())),
            None => Err(IndexerError::NotFound(path.to_string())),
        }
    }

    async fn create(&self, path: &str, content: &str) -> Result<(), IndexerError> {
        self.check_failing(path)?;
        let mut entries = self.entries.lock();

        if entries.contains_key(path) {
            return Err(IndexerError::AlreadyExists(path.to_string()));
        }
        let parent = parent_path(path);
        if parent != ROOT_PATH && !matches!(entries.get(parent), Some(MemEntry::Folder)) {
            return Err(IndexerError::NotFound(parent.to_string()));
        }

        entries.insert(path.to_string(), MemEntry::File(content.to_string()));
        self.write_log.lock().push(path.to_string());
        Ok(())
    }

    async fn modify(&self, path: &str, content: &str) -> Result<(), IndexerError> {
        self.check_failing(path)?;
        let mut entries = self.entries.lock();

        match entries.get_mut(path) {
            Some(MemEntry::File(existing)) => {
                *existing = content.to_string();
                self.write_log.lock().push(path.to_string());
                Ok(())
            }
            Some(MemEntry::Folder) => Err(IndexerError::NotAFile(path.to_string())),
            None => Err(IndexerError::NotFound(path.to_string())),
        }
    }

    async fn create_folder(&self, path: &str) -> Result<(), IndexerError> {
        let mut entries = self.entries.lock();
        if let Some(MemEntry::File(_)) = entries.get(path) {
            return Err(IndexerError::AlreadyExists(path.to_string()));
        }
        insert_parents(&mut entries, path);
        entries.insert(path.to_string(), MemEntry::Folder);
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), IndexerError> {
        let mut entries = self.entries.lock();
        match entries.get(path) {
            Some(MemEntry::File(_)) => {
                entries.remove(path);
                Ok(())
            }
            Some(MemEntry::Folder) => Err(IndexerError::NotAFile(path.to_string())),
            None => Err(IndexerError::NotFound(path.to_string())),
        }
    }
}
