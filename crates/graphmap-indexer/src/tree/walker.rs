//! Post-order planning of folder indexes over a vault snapshot.

use super::{locale_cmp, DocumentNode, FolderPlan, LinkEntry};
use crate::SyncConfig;
use tracing::trace;

/// A sorted, filtered child of a folder.
#[derive(Debug)]
pub enum ChildSlot<'a> {
    /// Subfolder that still has to be planned before it can be linked
    Folder(&'a DocumentNode),
    /// Markdown file, already resolved to its entry
    Document(LinkEntry),
}

/// Computes the link list of every folder in a snapshot.
///
/// Planning is pure. Writes happen afterwards, in the order of the returned
/// plans, which is post-order: every folder's subtree precedes it.
pub struct TreeWalker<'a> {
    config: &'a SyncConfig,
}

impl<'a> TreeWalker<'a> {
    /// Create a new walker for the given configuration.
    pub fn new(config: &'a SyncConfig) -> Self {
        Self { config }
    }

    /// Plan every folder reachable from `root`, children before parents.
    ///
    /// Folders with nothing to list are included with empty links so the
    /// writer can account for them.
    pub fn plan(&self, root: &DocumentNode) -> Vec<FolderPlan> {
        let mut plans = Vec::new();
        self.visit(root, &mut plans);
        plans
    }

    /// Links for a single folder, planning its subtree along the way.
    pub fn compute_links(&self, folder: &DocumentNode) -> Vec<LinkEntry> {
        self.plan(folder)
            .pop()
            .map(|plan| plan.links)
            .unwrap_or_default()
    }

    /// Direct children that take part in the index, in display order.
    pub fn child_entries<'n>(&self, folder: &'n DocumentNode) -> Vec<ChildSlot<'n>> {
        let mut children: Vec<&DocumentNode> = folder.children().iter().collect();
        children.sort_by(|a, b| locale_cmp(&a.name, &b.name));

        children
            .into_iter()
            .filter_map(|child| {
                if child.is_folder() {
                    if self.is_container(child) {
                        trace!(path = %child.path, "Skipping index container");
                        return None;
                    }
                    Some(ChildSlot::Folder(child))
                } else if child.is_markdown() && !self.config.is_within_container(&child.path) {
                    Some(ChildSlot::Document(LinkEntry::document(child)))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Returns whether `folder` ended up with a non-empty link list.
    fn visit(&self, folder: &DocumentNode, plans: &mut Vec<FolderPlan>) -> bool {
        let mut links = Vec::new();

        for slot in self.child_entries(folder) {
            match slot {
                ChildSlot::Folder(child) => {
                    if self.visit(child, plans) {
                        links.push(LinkEntry::folder(child, &self.config.file_prefix));
                    }
                }
                ChildSlot::Document(entry) => links.push(entry),
            }
        }

        let qualifies = !links.is_empty();
        plans.push(FolderPlan {
            path: folder.path.clone(),
            name: folder.name.clone(),
            links,
        });
        qualifies
    }

    fn is_container(&self, folder: &DocumentNode) -> bool {
        folder.name == self.config.container_path()
            || self.config.is_within_container(&folder.path)
    }
}
