//! File system watcher for detecting vault changes.
//!
//! Uses FSEvents on macOS and inotify on Linux, with a short debounce
//! window that stitches rename pairs and drops duplicate native events.

use crate::naming::ROOT_PATH;
use crate::tree::{extension_of, MARKDOWN_EXTENSION};
use crate::vault::{is_hidden, vault_relative, EntryKind};
use crate::IndexerError;
use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebouncedEvent, Debouncer, RecommendedCache};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Vault change type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Entry was created
    Created,
    /// Entry was deleted
    Deleted,
    /// Entry was renamed or moved (path is the new location)
    Renamed,
}

/// A change to a vault entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultChange {
    /// Vault-relative path of the entry
    pub path: String,
    /// Kind of change
    pub kind: ChangeKind,
    /// Whether the entry is a folder or a file
    pub entry: EntryKind,
}

impl VaultChange {
    /// Create a change record.
    pub fn new(path: impl Into<String>, kind: ChangeKind, entry: EntryKind) -> Self {
        Self {
            path: path.into(),
            kind,
            entry,
        }
    }

    /// Extension of the changed entry's name.
    pub fn extension(&self) -> &str {
        let name = self.path.rsplit('/').next().unwrap_or(&self.path);
        extension_of(name)
    }

    /// Check if the change concerns a markdown file.
    pub fn is_markdown(&self) -> bool {
        self.entry == EntryKind::File && self.extension() == MARKDOWN_EXTENSION
    }
}

/// Options for the vault watcher.
#[derive(Debug, Clone)]
pub struct WatcherOptions {
    /// Debounce duration for native events
    pub debounce_duration: Duration,
    /// Whether to watch recursively
    pub recursive: bool,
}

impl Default for WatcherOptions {
    fn default() -> Self {
        Self {
            debounce_duration: Duration::from_millis(200),
            recursive: true,
        }
    }
}

/// Vault watcher with debouncing.
pub struct VaultWatcher {
    root: PathBuf,
    options: WatcherOptions,
    tx: mpsc::Sender<VaultChange>,
    rx: mpsc::Receiver<VaultChange>,
    _debouncer: Option<Debouncer<RecommendedWatcher, RecommendedCache>>,
}

impl VaultWatcher {
    /// Create a watcher for the vault rooted at `root`.
    pub fn new(root: &Path, options: WatcherOptions) -> Result<Self, IndexerError> {
        let root = root
            .canonicalize()
            .map_err(|_| IndexerError::NotFound(root.display().to_string()))?;

        let (tx, rx) = mpsc::channel(1000);
        Ok(Self {
            root,
            options,
            tx,
            rx,
            _debouncer: None,
        })
    }

    /// Start watching the vault.
    pub fn watch(&mut self) -> Result<(), IndexerError> {
        let tx = self.tx.clone();
        let root = self.root.clone();

        let mut debouncer = new_debouncer(
            self.options.debounce_duration,
            None,
            move |result: Result<Vec<DebouncedEvent>, Vec<notify::Error>>| match result {
                Ok(events) => {
                    for event in events {
                        if let Some(change) = convert_event(&root, &event.event) {
                            if let Err(e) = tx.blocking_send(change) {
                                error!(error = %e, "Failed to send vault change");
                            }
                        }
                    }
                }
                Err(errors) => {
                    for e in errors {
                        warn!(error = %e, "Watcher error");
                    }
                }
            },
        )
        .map_err(|e| IndexerError::Watcher(e.to_string()))?;

        let mode = if self.options.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };

        debouncer
            .watch(&self.root, mode)
            .map_err(|e: notify::Error| IndexerError::Watcher(e.to_string()))?;

        info!(path = ?self.root, recursive = self.options.recursive, "Started watching vault");

        self._debouncer = Some(debouncer);

        Ok(())
    }

    /// Receive the next change.
    pub async fn next(&mut self) -> Option<VaultChange> {
        self.rx.recv().await
    }

    /// Try to receive a change without blocking.
    pub fn try_next(&mut self) -> Option<VaultChange> {
        self.rx.try_recv().ok()
    }

    /// Check if there are pending changes.
    pub fn has_pending(&self) -> bool {
        !self.rx.is_empty()
    }
}

/// Convert a notify Event to a VaultChange.
///
/// Content modifications and access events are dropped; only creation,
/// deletion and renaming change the folder structure.
fn convert_event(root: &Path, event: &Event) -> Option<VaultChange> {
    let kind = match &event.kind {
        EventKind::Create(_) => ChangeKind::Created,
        EventKind::Remove(_) => ChangeKind::Deleted,
        EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Renamed,
        EventKind::Modify(_) => return None,
        EventKind::Access(_) => return None,
        EventKind::Any => return None,
        EventKind::Other => return None,
    };

    // Renames carry [from, to]; the destination is what exists now
    let abs = event.paths.last()?;
    let path = vault_relative(root, abs)?;
    if path == ROOT_PATH || is_hidden(&path) {
        return None;
    }

    let entry = entry_kind_of(abs, &event.kind, &path);

    debug!(path = %path, kind = ?kind, entry = ?entry, "Vault change detected");

    Some(VaultChange { path, kind, entry })
}

/// Folder or file, from the disk when the path still exists.
fn entry_kind_of(abs: &Path, kind: &EventKind, path: &str) -> EntryKind {
    if let Ok(meta) = std::fs::symlink_metadata(abs) {
        return if meta.is_dir() {
            EntryKind::Folder
        } else {
            EntryKind::File
        };
    }

    match kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => {
            EntryKind::Folder
        }
        EventKind::Create(CreateKind::File) | EventKind::Remove(RemoveKind::File) => {
            EntryKind::File
        }
        _ => {
            let name = path.rsplit('/').next().unwrap_or(path);
            if extension_of(name).is_empty() {
                EntryKind::Folder
            } else {
                EntryKind::File
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, DataChange, RenameMode};
    use std::fs;
    use tempfile::tempdir;

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        Event {
            kind,
            paths: paths.iter().map(PathBuf::from).collect(),
            attrs: Default::default(),
        }
    }

    fn root() -> PathBuf {
        PathBuf::from("/vault")
    }

    #[test]
    fn test_watcher_options_default() {
        let options = WatcherOptions::default();
        assert_eq!(options.debounce_duration, Duration::from_millis(200));
        assert!(options.recursive);
    }

    #[tokio::test]
    async fn test_watcher_create() {
        let temp_dir = tempdir().unwrap();
        let mut watcher = VaultWatcher::new(temp_dir.path(), WatcherOptions::default()).unwrap();

        let result = watcher.watch();
        assert!(result.is_ok());
        assert!(!watcher.has_pending());
    }

    #[tokio::test]
    async fn test_watcher_reports_created_note() {
        let temp_dir = tempdir().unwrap();
        let options = WatcherOptions {
            debounce_duration: Duration::from_millis(50),
            recursive: true,
        };
        let mut watcher = VaultWatcher::new(temp_dir.path(), options).unwrap();
        watcher.watch().unwrap();

        fs::write(temp_dir.path().join("new.md"), "# New").unwrap();

        let change = tokio::time::timeout(Duration::from_secs(10), watcher.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(change.path, "new.md");
        assert_eq!(change.kind, ChangeKind::Created);
        assert!(change.is_markdown());
    }

    #[test]
    fn test_watcher_missing_root() {
        let result = VaultWatcher::new(Path::new("/no/such/vault"), WatcherOptions::default());
        assert!(matches!(result, Err(IndexerError::NotFound(_))));
    }

    #[test]
    fn test_convert_create_file() {
        let change = convert_event(
            &root(),
            &event(EventKind::Create(CreateKind::File), &["/vault/Notes/a.md"]),
        )
        .unwrap();

        assert_eq!(change.path, "Notes/a.md");
        assert_eq!(change.kind, ChangeKind::Created);
        assert_eq!(change.entry, EntryKind::File);
        assert!(change.is_markdown());
    }

    #[test]
    fn test_convert_remove_folder_uses_hint() {
        let change = convert_event(
            &root(),
            &event(EventKind::Remove(RemoveKind::Folder), &["/vault/Old.Stuff"]),
        )
        .unwrap();

        assert_eq!(change.kind, ChangeKind::Deleted);
        assert_eq!(change.entry, EntryKind::Folder);
    }

    #[test]
    fn test_convert_rename_uses_destination() {
        let change = convert_event(
            &root(),
            &event(
                EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
                &["/vault/Notes/a.md", "/vault/Notes/b.md"],
            ),
        )
        .unwrap();

        assert_eq!(change.path, "Notes/b.md");
        assert_eq!(change.kind, ChangeKind::Renamed);
        assert_eq!(change.entry, EntryKind::File);
    }

    #[test]
    fn test_convert_rename_without_extension_is_folder() {
        let change = convert_event(
            &root(),
            &event(
                EventKind::Modify(ModifyKind::Name(RenameMode::To)),
                &["/vault/Projects"],
            ),
        )
        .unwrap();

        assert_eq!(change.entry, EntryKind::Folder);
    }

    #[test]
    fn test_convert_content_modify_ignored() {
        let change = convert_event(
            &root(),
            &event(
                EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                &["/vault/Notes/a.md"],
            ),
        );
        assert!(change.is_none());
    }

    #[test]
    fn test_convert_access_ignored() {
        let change = convert_event(
            &root(),
            &event(EventKind::Access(AccessKind::Read), &["/vault/Notes/a.md"]),
        );
        assert!(change.is_none());
    }

    #[test]
    fn test_convert_hidden_and_outside_ignored() {
        let hidden = convert_event(
            &root(),
            &event(EventKind::Create(CreateKind::File), &["/vault/.graphmap/config.yaml"]),
        );
        let outside = convert_event(
            &root(),
            &event(EventKind::Create(CreateKind::File), &["/elsewhere/a.md"]),
        );
        assert!(hidden.is_none());
        assert!(outside.is_none());
    }

    #[test]
    fn test_entry_kind_from_disk() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        fs::create_dir(root.join("Notes.d")).unwrap();

        let change = convert_event(
            &root,
            &event(
                EventKind::Create(CreateKind::Any),
                &[root.join("Notes.d").to_str().unwrap()],
            ),
        )
        .unwrap();
        assert_eq!(change.entry, EntryKind::Folder);
    }
}
