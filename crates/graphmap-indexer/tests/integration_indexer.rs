//! Integration tests for GraphMap synchronization against real and in-memory vaults.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

use graphmap_indexer::{
    ChangeGate, ChangeKind, EntryKind, FsVault, MemoryVault, SyncConfig, SyncOrchestrator,
    VaultChange,
};

/// Helper to create a small vault on disk
fn create_test_vault(base: &Path) -> PathBuf {
    let vault = base.join("vault");
    std::fs::create_dir_all(vault.join("Notes/Daily Logs")).unwrap();
    std::fs::create_dir_all(vault.join("Attachments")).unwrap();
    std::fs::create_dir_all(vault.join(".obsidian")).unwrap();

    std::fs::write(vault.join("Notes/a.md"), "# A").unwrap();
    std::fs::write(vault.join("Notes/Daily Logs/2024-01-01.md"), "log").unwrap();
    std::fs::write(vault.join("Attachments/cat.png"), [0u8; 4]).unwrap();
    std::fs::write(vault.join(".obsidian/workspace.md"), "hidden").unwrap();
    std::fs::write(vault.join("Inbox.md"), "inbox").unwrap();

    vault
}

fn read(vault: &Path, rel: &str) -> String {
    std::fs::read_to_string(vault.join(rel)).unwrap()
}

/// Test a full pass on disk end-to-end
#[tokio::test]
async fn test_sync_on_disk_end_to_end() {
    let temp_dir = tempdir().unwrap();
    let root = create_test_vault(temp_dir.path());

    let vault = Arc::new(FsVault::open(&root).unwrap());
    let sync = SyncOrchestrator::new(vault);
    let config = SyncConfig::default();

    let report = sync.synchronize_all(&config).await.unwrap();
    assert_eq!(report.created, 3, "Notes/Daily Logs, Notes and root");
    assert!(report.is_clean());

    let daily = read(&root, "_GraphMaps/Map_Notes_Daily-Logs.md");
    assert!(daily.contains("- [[Notes/Daily Logs/2024-01-01.md|📄 2024-01-01]]"));

    let notes = read(&root, "_GraphMaps/Map_Notes.md");
    assert_eq!(
        notes,
        "---\ntags: [auto-graph-map]\n---\n# 🗺️ Notes\n\n\
         - [[Notes/a.md|📄 a]]\n\
         - [[Map_Notes_Daily-Logs|📂 Daily Logs]]\n"
    );

    let root_index = read(&root, "_GraphMaps/Map_ROOT.md");
    assert!(root_index.contains("# 🗺️ vault"));
    assert!(root_index.contains("- [[Inbox.md|📄 Inbox]]"));
    assert!(root_index.contains("- [[Map_Notes|📂 Notes]]"));
    assert!(!root_index.contains("Attachments"));
    assert!(!root_index.contains("obsidian"));
    assert!(!root.join("_GraphMaps/Map_Attachments.md").exists());
}

/// Test that a second pass leaves files untouched
#[tokio::test]
async fn test_second_pass_is_noop_on_disk() {
    let temp_dir = tempdir().unwrap();
    let root = create_test_vault(temp_dir.path());

    let sync = SyncOrchestrator::new(Arc::new(FsVault::open(&root).unwrap()));
    let config = SyncConfig::default();

    sync.synchronize_all(&config).await.unwrap();
    let before = std::fs::metadata(root.join("_GraphMaps/Map_ROOT.md"))
        .unwrap()
        .modified()
        .unwrap();

    let report = sync.synchronize_all(&config).await.unwrap();
    assert_eq!(report.writes(), 0);
    assert_eq!(report.unchanged, 3);

    let after = std::fs::metadata(root.join("_GraphMaps/Map_ROOT.md"))
        .unwrap()
        .modified()
        .unwrap();
    assert_eq!(before, after);
}

/// Test that renaming a note only rewrites its folder's index
#[tokio::test]
async fn test_rename_on_disk() {
    let temp_dir = tempdir().unwrap();
    let root = create_test_vault(temp_dir.path());

    let sync = SyncOrchestrator::new(Arc::new(FsVault::open(&root).unwrap()));
    let config = SyncConfig::default();
    sync.synchronize_all(&config).await.unwrap();

    std::fs::rename(root.join("Notes/a.md"), root.join("Notes/b.md")).unwrap();
    let report = sync.synchronize_all(&config).await.unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(report.created, 0);
    assert!(read(&root, "_GraphMaps/Map_Notes.md").contains("[[Notes/b.md|📄 b]]"));
}

/// Test custom container and prefix settings
#[tokio::test]
async fn test_custom_container_and_prefix() {
    let temp_dir = tempdir().unwrap();
    let root = create_test_vault(temp_dir.path());

    let sync = SyncOrchestrator::new(Arc::new(FsVault::open(&root).unwrap()));
    let config = SyncConfig {
        index_container: "Meta/Index".to_string(),
        file_prefix: "Idx_".to_string(),
        auto_sync: true,
    };

    sync.synchronize_all(&config).await.unwrap();

    assert!(root.join("Meta/Index/Idx_ROOT.md").exists());
    assert!(root.join("Meta/Index/Idx_Notes.md").exists());
    assert!(!root.join("_GraphMaps").exists());
    assert!(read(&root, "Meta/Index/Idx_ROOT.md").contains("[[Idx_Notes|📂 Notes]]"));
}

/// Test the change-driven loop: gate, trigger, pass
#[tokio::test(start_paused = true)]
async fn test_gate_drives_single_pass_after_burst() {
    let vault = Arc::new(MemoryVault::with_files("vault", &[("Notes/a.md", "")]));
    let sync = SyncOrchestrator::new(vault.clone());
    let config = SyncConfig::default();

    sync.synchronize_all(&config).await.unwrap();
    vault.take_write_log();

    let (mut gate, mut triggers) = ChangeGate::channel(Duration::from_secs(2));

    // A burst of edits, plus the echo of our own writes
    for name in ["b.md", "c.md", "d.md"] {
        let path = format!("Notes/{}", name);
        vault.add_file(&path, "");
        gate.on_change(
            &VaultChange::new(path, ChangeKind::Created, EntryKind::File),
            &config,
        );
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    assert!(!gate.on_change(
        &VaultChange::new("_GraphMaps/Map_Notes.md", ChangeKind::Created, EntryKind::File),
        &config,
    ));

    let mut passes = 0;
    while tokio::time::timeout(Duration::from_secs(5), triggers.recv())
        .await
        .is_ok()
    {
        passes += 1;
        sync.synchronize_all(&config).await.unwrap();
    }

    assert_eq!(passes, 1);
    assert_eq!(vault.write_log(), vec!["_GraphMaps/Map_Notes.md".to_string()]);
    let content = vault.content("_GraphMaps/Map_Notes.md").unwrap();
    assert!(content.contains("[[Notes/d.md|📄 d]]"));
}
