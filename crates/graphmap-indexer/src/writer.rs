//! Rendering and content-diffing writes of index files.

use crate::naming;
use crate::tree::{FolderPlan, LinkEntry};
use crate::vault::{EntryKind, VaultStore};
use crate::{IndexerError, SyncConfig};
use tracing::{debug, info};

/// Tag placed in the front matter of every generated index.
pub const INDEX_TAG: &str = "auto-graph-map";

/// Glyph in front of the folder name in the heading.
pub const HEADING_GLYPH: &str = "🗺️";

/// What a single index write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Nothing to list; the folder gets no index
    Skipped,
    /// Stored content already matched
    Unchanged,
    /// Existing index overwritten
    Updated,
    /// New index created
    Created,
}

impl WriteOutcome {
    /// Whether the store was written to.
    pub fn wrote(self) -> bool {
        matches!(self, WriteOutcome::Updated | WriteOutcome::Created)
    }
}

/// Render the full index document for a folder.
pub fn render_index(folder_name: &str, links: &[LinkEntry]) -> String {
    let mut content = format!(
        "---\ntags: [{}]\n---\n# {} {}\n\n",
        INDEX_TAG, HEADING_GLYPH, folder_name
    );
    for link in links {
        content.push_str(&link.render());
        content.push('\n');
    }
    content
}

/// Writes one folder's index, touching the store only when content changed.
pub struct IndexWriter<'a, V: VaultStore + ?Sized> {
    vault: &'a V,
    config: &'a SyncConfig,
}

impl<'a, V: VaultStore + ?Sized> IndexWriter<'a, V> {
    /// Create a writer against `vault`.
    pub fn new(vault: &'a V, config: &'a SyncConfig) -> Self {
        Self { vault, config }
    }

    /// Create, update or leave alone the index for `plan`.
    pub async fn write_index(&self, plan: &FolderPlan) -> Result<WriteOutcome, IndexerError> {
        if plan.is_empty() {
            return Ok(WriteOutcome::Skipped);
        }

        let target = naming::index_path(self.config, &plan.path);
        let content = render_index(&plan.name, &plan.links);

        match self.vault.entry_kind(&target).await? {
            Some(EntryKind::File) => {
                let existing = self.vault.read(&target).await?;
                if existing == content {
                    debug!(path = %target, "Index unchanged");
                    return Ok(WriteOutcome::Unchanged);
                }
                self.vault.modify(&target, &content).await?;
                info!(path = %target, links = plan.links.len(), "Index updated");
                Ok(WriteOutcome::Updated)
            }
            Some(EntryKind::Folder) => Err(IndexerError::NotAFile(target)),
            None => {
                self.vault.create(&target, &content).await?;
                info!(path = %target, links = plan.links.len(), "Index created");
                Ok(WriteOutcome::Created)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::LinkKind;
    use crate::vault::MemoryVault;

    fn notes_plan() -> FolderPlan {
        FolderPlan {
            path: "Notes".to_string(),
            name: "Notes".to_string(),
            links: vec![
                LinkEntry {
                    kind: LinkKind::Folder,
                    label: "Sub".to_string(),
                    target: "Map_Notes_Sub".to_string(),
                },
                LinkEntry {
                    kind: LinkKind::Document,
                    label: "a".to_string(),
                    target: "Notes/a.md".to_string(),
                },
            ],
        }
    }

    async fn vault_with_container() -> MemoryVault {
        let vault = MemoryVault::new("vault");
        vault.create_folder("_GraphMaps").await.unwrap();
        vault
    }

    #[test]
    fn test_render_index_format() {
        let plan = notes_plan();
        let content = render_index(&plan.name, &plan.links);
        assert_eq!(
            content,
            "---\ntags: [auto-graph-map]\n---\n# 🗺️ Notes\n\n\
             - [[Map_Notes_Sub|📂 Sub]]\n\
             - [[Notes/a.md|📄 a]]\n"
        );
    }

    #[tokio::test]
    async fn test_creates_missing_index() {
        let vault = vault_with_container().await;
        let config = SyncConfig::default();
        let writer = IndexWriter::new(&vault, &config);

        let outcome = writer.write_index(&notes_plan()).await.unwrap();
        assert_eq!(outcome, WriteOutcome::Created);
        assert!(vault
            .content("_GraphMaps/Map_Notes.md")
            .unwrap()
            .contains("[[Notes/a.md|📄 a]]"));
    }

    #[tokio::test]
    async fn test_unchanged_content_is_not_rewritten() {
        let vault = vault_with_container().await;
        let config = SyncConfig::default();
        let writer = IndexWriter::new(&vault, &config);

        writer.write_index(&notes_plan()).await.unwrap();
        vault.take_write_log();

        let outcome = writer.write_index(&notes_plan()).await.unwrap();
        assert_eq!(outcome, WriteOutcome::Unchanged);
        assert!(vault.write_log().is_empty());
    }

    #[tokio::test]
    async fn test_changed_content_overwrites_user_edits() {
        let vault = vault_with_container().await;
        vault.add_file("_GraphMaps/Map_Notes.md", "hand edited");
        let config = SyncConfig::default();
        let writer = IndexWriter::new(&vault, &config);

        let outcome = writer.write_index(&notes_plan()).await.unwrap();
        assert_eq!(outcome, WriteOutcome::Updated);
        assert!(vault
            .content("_GraphMaps/Map_Notes.md")
            .unwrap()
            .starts_with("---\ntags: [auto-graph-map]"));
    }

    #[tokio::test]
    async fn test_empty_plan_leaves_existing_index_alone() {
        let vault = vault_with_container().await;
        vault.add_file("_GraphMaps/Map_Notes.md", "stale");
        let config = SyncConfig::default();
        let writer = IndexWriter::new(&vault, &config);

        let plan = FolderPlan {
            links: vec![],
            ..notes_plan()
        };
        let outcome = writer.write_index(&plan).await.unwrap();
        assert_eq!(outcome, WriteOutcome::Skipped);
        assert_eq!(vault.content("_GraphMaps/Map_Notes.md").as_deref(), Some("stale"));
    }

    #[tokio::test]
    async fn test_folder_at_target_is_an_error() {
        let vault = vault_with_container().await;
        vault.add_folder("_GraphMaps/Map_Notes.md");
        let config = SyncConfig::default();
        let writer = IndexWriter::new(&vault, &config);

        let result = writer.write_index(&notes_plan()).await;
        assert!(matches!(result, Err(IndexerError::NotAFile(_))));
    }

    #[test]
    fn test_outcome_wrote() {
        assert!(WriteOutcome::Created.wrote());
        assert!(WriteOutcome::Updated.wrote());
        assert!(!WriteOutcome::Unchanged.wrote());
        assert!(!WriteOutcome::Skipped.wrote());
    }
}
