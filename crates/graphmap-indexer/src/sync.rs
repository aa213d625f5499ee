//! Full-tree synchronization passes.

use crate::naming;
use crate::tree::TreeWalker;
use crate::vault::{EntryKind, VaultStore};
use crate::writer::{IndexWriter, WriteOutcome};
use crate::{IndexerError, SyncConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Summary of one synchronization pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Folders with nothing to list
    pub skipped: usize,
    /// Folders whose index could not be written
    pub failed: usize,
    /// Every index path this pass is responsible for
    pub index_paths: BTreeSet<String>,
    pub duration_ms: u64,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    fn new() -> Self {
        Self {
            created: 0,
            updated: 0,
            unchanged: 0,
            skipped: 0,
            failed: 0,
            index_paths: BTreeSet::new(),
            duration_ms: 0,
            finished_at: Utc::now(),
        }
    }

    fn record(&mut self, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Created => self.created += 1,
            WriteOutcome::Updated => self.updated += 1,
            WriteOutcome::Unchanged => self.unchanged += 1,
            WriteOutcome::Skipped => self.skipped += 1,
        }
    }

    /// Number of index files written.
    pub fn writes(&self) -> usize {
        self.created + self.updated
    }

    /// Whether every folder was handled.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Runs synchronization passes against a vault, one at a time.
pub struct SyncOrchestrator<V: VaultStore + ?Sized> {
    vault: Arc<V>,
    run_lock: Mutex<()>,
}

impl<V: VaultStore + ?Sized> SyncOrchestrator<V> {
    /// Create an orchestrator for `vault`.
    pub fn new(vault: Arc<V>) -> Self {
        Self {
            vault,
            run_lock: Mutex::new(()),
        }
    }

    /// The underlying vault.
    pub fn vault(&self) -> &Arc<V> {
        &self.vault
    }

    /// Bring every index in the vault up to date.
    ///
    /// Concurrent callers queue on the run lock. A failure to write one
    /// folder's index is logged and counted; the pass carries on.
    pub async fn synchronize_all(&self, config: &SyncConfig) -> Result<SyncReport, IndexerError> {
        let _guard = self.run_lock.lock().await;
        let started = Instant::now();

        self.ensure_container(config).await?;

        let tree = self.vault.snapshot().await?;
        let plans = TreeWalker::new(config).plan(&tree);
        debug!(folders = plans.len(), "Planned folder indexes");

        let writer = IndexWriter::new(self.vault.as_ref(), config);
        let mut report = SyncReport::new();

        for plan in &plans {
            if !plan.is_empty() {
                report
                    .index_paths
                    .insert(naming::index_path(config, &plan.path));
            }

            match writer.write_index(plan).await {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    warn!(folder = %plan.path, error = %e, "Failed to write index");
                    report.failed += 1;
                }
            }
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        report.finished_at = Utc::now();

        info!(
            created = report.created,
            updated = report.updated,
            unchanged = report.unchanged,
            failed = report.failed,
            duration_ms = report.duration_ms,
            "Synchronization complete"
        );

        Ok(report)
    }

    /// Delete index files in the container that `report` did not produce.
    ///
    /// Does nothing after a pass with failures.
    pub async fn prune_orphans(
        &self,
        config: &SyncConfig,
        report: &SyncReport,
    ) -> Result<Vec<String>, IndexerError> {
        if !report.is_clean() {
            warn!(failed = report.failed, "Skipping prune after incomplete pass");
            return Ok(Vec::new());
        }

        let _guard = self.run_lock.lock().await;
        let container = config.container_path();
        let mut removed = Vec::new();

        for path in self.vault.list_files(container).await? {
            let name = path.rsplit('/').next().unwrap_or(&path);
            let generated = name.starts_with(&config.file_prefix) && name.ends_with(".md");
            if !generated || report.index_paths.contains(&path) {
                continue;
            }

            match self.vault.remove(&path).await {
                Ok(()) => {
                    info!(path = %path, "Removed orphaned index");
                    removed.push(path);
                }
                Err(e) => warn!(path = %path, error = %e, "Failed to remove orphaned index"),
            }
        }

        Ok(removed)
    }

    async fn ensure_container(&self, config: &SyncConfig) -> Result<(), IndexerError> {
        let container = config.container_path();
        if container.is_empty() {
            return Err(IndexerError::InvalidPath(config.index_container.clone()));
        }

        match self.vault.entry_kind(container).await? {
            Some(EntryKind::Folder) => Ok(()),
            Some(EntryKind::File) => Err(IndexerError::AlreadyExists(container.to_string())),
            None => {
                self.vault.create_folder(container).await?;
                info!(path = %container, "Created index container");
                Ok(())
            }
        }
    }
}
