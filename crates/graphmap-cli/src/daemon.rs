//! Watch daemon lifecycle management.

use anyhow::{Context, Result};
use graphmap_core::Settings;
use graphmap_indexer::{ChangeGate, FsVault, SyncOrchestrator, VaultWatcher, WatcherOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::signals;

/// Keeps one vault's indexes in sync until shut down
pub struct Daemon {
    vault_root: PathBuf,
    pid_file: PathBuf,
    shutdown_tx: broadcast::Sender<()>,
    is_running: Arc<AtomicBool>,
    owns_pid_file: AtomicBool,
    passes: AtomicU64,
    start_time: std::time::Instant,
}

impl Daemon {
    /// Create a daemon for the vault at `vault_root`
    pub fn new(vault_root: &Path) -> Result<Self> {
        let vault_root = vault_root
            .canonicalize()
            .with_context(|| format!("Vault not found: {}", vault_root.display()))?;

        std::fs::create_dir_all(Settings::settings_dir(&vault_root))
            .context("Failed to create settings directory")?;

        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            pid_file: Settings::pid_path(&vault_root),
            vault_root,
            shutdown_tx,
            is_running: Arc::new(AtomicBool::new(false)),
            owns_pid_file: AtomicBool::new(false),
            passes: AtomicU64::new(0),
            start_time: std::time::Instant::now(),
        })
    }

    /// Run the daemon
    pub async fn run(&self) -> Result<()> {
        // Check single instance
        self.acquire_pid_lock()?;

        self.is_running.store(true, Ordering::SeqCst);

        // Subscribe before the first pass so an early shutdown is not lost
        let shutdown_rx = self.shutdown_tx.subscribe();

        let mut settings = Settings::load(&self.vault_root);

        tracing::info!(
            vault = %self.vault_root.display(),
            container = %settings.index_container,
            debounce_ms = settings.debounce_ms,
            "Daemon starting"
        );

        let vault = FsVault::open(&self.vault_root).context("Failed to open vault")?;
        let sync = SyncOrchestrator::new(Arc::new(vault));

        if settings.auto_sync {
            self.run_pass(&sync, &settings).await;
        } else {
            tracing::warn!("auto_sync is disabled, changes are ignored until it is enabled");
        }

        let mut watcher = VaultWatcher::new(&self.vault_root, WatcherOptions::default())
            .context("Failed to create vault watcher")?;
        watcher.watch().context("Failed to watch vault")?;

        let (mut gate, mut triggers) = ChangeGate::channel(settings.debounce());

        let shutdown = signals::wait_for_shutdown(shutdown_rx);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                change = watcher.next() => {
                    let Some(change) = change else {
                        tracing::warn!("Watcher channel closed");
                        break;
                    };
                    settings = Settings::load(&self.vault_root);
                    gate.set_delay(settings.debounce());
                    gate.on_change(&change, &settings.sync_config());
                }
                Some(()) = triggers.recv() => {
                    settings = Settings::load(&self.vault_root);
                    self.on_trigger(&sync, &settings).await;
                }
                reason = &mut shutdown => {
                    tracing::info!(%reason, "Shutting down");
                    break;
                }
            }
        }

        gate.cancel();

        self.cleanup().await?;

        Ok(())
    }

    /// Ask a running daemon to stop
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Run a debounced pass unless auto_sync was turned off since it was scheduled.
    async fn on_trigger(&self, sync: &SyncOrchestrator<FsVault>, settings: &Settings) -> bool {
        if !settings.auto_sync {
            tracing::debug!("auto_sync disabled, dropping scheduled pass");
            return false;
        }

        self.run_pass(sync, settings).await;
        true
    }

    async fn run_pass(&self, sync: &SyncOrchestrator<FsVault>, settings: &Settings) {
        let config = settings.sync_config();
        self.passes.fetch_add(1, Ordering::SeqCst);

        let report = match sync.synchronize_all(&config).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "Synchronization failed");
                return;
            }
        };

        if settings.prune_orphans {
            if let Err(e) = sync.prune_orphans(&config, &report).await {
                tracing::warn!(error = %e, "Failed to prune orphaned indexes");
            }
        }
    }

    /// Acquire PID lock to ensure single instance
    fn acquire_pid_lock(&self) -> Result<()> {
        let pid_file = &self.pid_file;

        if pid_file.exists() {
            if let Ok(pid_str) = std::fs::read_to_string(pid_file) {
                if let Ok(pid) = pid_str.trim().parse::<u32>() {
                    if is_process_running(pid) {
                        anyhow::bail!("Daemon already running for this vault (PID: {})", pid);
                    }
                }
            }
            // Stale PID file, remove it
            std::fs::remove_file(pid_file)?;
        }

        std::fs::write(pid_file, std::process::id().to_string())?;
        self.owns_pid_file.store(true, Ordering::SeqCst);

        tracing::debug!(pid = std::process::id(), "PID lock acquired");

        Ok(())
    }

    /// Cleanup resources on shutdown
    async fn cleanup(&self) -> Result<()> {
        tracing::info!("Cleaning up...");

        self.release_pid_lock();
        self.is_running.store(false, Ordering::SeqCst);

        tracing::info!(
            passes = self.passes.load(Ordering::SeqCst),
            uptime = %format_duration(self.start_time.elapsed().as_secs()),
            "Daemon stopped"
        );

        Ok(())
    }

    fn release_pid_lock(&self) {
        if self.owns_pid_file.swap(false, Ordering::SeqCst) && self.pid_file.exists() {
            let _ = std::fs::remove_file(&self.pid_file);
        }
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        self.release_pid_lock();
    }
}

/// Check if a process is running by PID
fn is_process_running(pid: u32) -> bool {
    // kill(pid, 0) only checks existence
    unsafe { libc::kill(pid as i32, 0) == 0 }
}

fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::time::{sleep, timeout};

    #[test]
    fn test_is_process_running() {
        // Current process should be running
        assert!(is_process_running(std::process::id()));

        // Very high PID should not exist
        assert!(!is_process_running(999999999));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(42), "42s");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(7260), "2h 1m");
        assert_eq!(format_duration(90000), "1d 1h");
    }

    #[tokio::test]
    async fn test_second_instance_refused() {
        let temp_dir = tempdir().unwrap();
        let daemon = Daemon::new(temp_dir.path()).unwrap();
        std::fs::write(&daemon.pid_file, std::process::id().to_string()).unwrap();

        let result = daemon.run().await;
        assert!(result.is_err());
        assert!(!daemon.is_running.load(Ordering::SeqCst));

        // The refused instance must not remove the other one's PID file
        let pid_file = daemon.pid_file.clone();
        drop(daemon);
        assert!(pid_file.exists());
    }

    #[tokio::test]
    async fn test_stale_pid_file_replaced() {
        let temp_dir = tempdir().unwrap();
        let daemon = Daemon::new(temp_dir.path()).unwrap();
        std::fs::write(&daemon.pid_file, "999999999").unwrap();

        daemon.acquire_pid_lock().unwrap();
        let pid = std::fs::read_to_string(&daemon.pid_file).unwrap();
        assert_eq!(pid, std::process::id().to_string());
    }

    #[tokio::test]
    async fn test_scheduled_pass_dropped_when_auto_sync_turned_off() {
        let temp_dir = tempdir().unwrap();
        std::fs::write(temp_dir.path().join("a.md"), "# A").unwrap();

        let daemon = Daemon::new(temp_dir.path()).unwrap();
        let sync = SyncOrchestrator::new(Arc::new(FsVault::open(&daemon.vault_root).unwrap()));

        let mut settings = Settings {
            auto_sync: false,
            ..Default::default()
        };
        settings.save(&daemon.vault_root).unwrap();
        let reloaded = Settings::load(&daemon.vault_root);

        assert!(!daemon.on_trigger(&sync, &reloaded).await);
        assert_eq!(daemon.passes.load(Ordering::SeqCst), 0);
        assert!(!daemon.vault_root.join("_GraphMaps").exists());

        settings.auto_sync = true;
        assert!(daemon.on_trigger(&sync, &settings).await);
        assert_eq!(daemon.passes.load(Ordering::SeqCst), 1);
        assert!(daemon.vault_root.join("_GraphMaps/Map_ROOT.md").exists());
    }

    #[tokio::test]
    async fn test_initial_pass_and_shutdown() {
        let temp_dir = tempdir().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("Notes")).unwrap();
        std::fs::write(temp_dir.path().join("Notes/a.md"), "# A").unwrap();

        let daemon = Arc::new(Daemon::new(temp_dir.path()).unwrap());
        let runner = {
            let daemon = daemon.clone();
            tokio::spawn(async move { daemon.run().await })
        };

        let root_index = daemon.vault_root.join("_GraphMaps/Map_ROOT.md");
        timeout(Duration::from_secs(10), async {
            while !root_index.exists() {
                sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .unwrap();
        assert!(daemon.vault_root.join("_GraphMaps/Map_Notes.md").exists());

        daemon.shutdown();
        timeout(Duration::from_secs(10), runner)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        assert!(!daemon.pid_file.exists());
        assert!(!daemon.is_running.load(Ordering::SeqCst));
    }
}
