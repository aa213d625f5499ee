//! Tree structure for representing a vault snapshot.
//!
//! Provides the folder/file node model the walker traverses, the link
//! entries an index lists, and the name ordering used everywhere.

mod walker;

pub use walker::{ChildSlot, TreeWalker};

use crate::naming::{self, ROOT_PATH};
use feruca::{Collator, Locale, Tailoring};
use std::cell::RefCell;
use std::cmp::Ordering;

/// Extension marking a file as markdown.
pub const MARKDOWN_EXTENSION: &str = "md";

/// A node in a vault snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentNode {
    /// Slash-delimited vault-relative path, `/` for the root
    pub path: String,

    /// Last path segment (the vault name for the root)
    pub name: String,

    /// Kind of node
    pub kind: NodeKind,
}

/// Kind of vault node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Folder with its direct children
    Folder { children: Vec<DocumentNode> },

    /// File with its extension (empty when the name has none)
    File { extension: String },
}

impl DocumentNode {
    /// Create the root folder of a vault.
    pub fn root(name: impl Into<String>, children: Vec<DocumentNode>) -> Self {
        Self {
            path: ROOT_PATH.to_string(),
            name: name.into(),
            kind: NodeKind::Folder { children },
        }
    }

    /// Create a folder node at `path`.
    pub fn folder(path: impl Into<String>, children: Vec<DocumentNode>) -> Self {
        let path = path.into();
        Self {
            name: last_segment(&path).to_string(),
            path,
            kind: NodeKind::Folder { children },
        }
    }

    /// Create a file node at `path`.
    pub fn file(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = last_segment(&path).to_string();
        Self {
            kind: NodeKind::File {
                extension: extension_of(&name).to_string(),
            },
            name,
            path,
        }
    }

    /// Check if this is a folder node.
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder { .. })
    }

    /// Check if this is a file node.
    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File { .. })
    }

    /// Check if this is the vault root.
    pub fn is_root(&self) -> bool {
        self.path == ROOT_PATH
    }

    /// Direct children (empty for files).
    pub fn children(&self) -> &[DocumentNode] {
        match &self.kind {
            NodeKind::Folder { children } => children,
            NodeKind::File { .. } => &[],
        }
    }

    /// Get the extension if this is a file.
    pub fn extension(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::File { extension } => Some(extension),
            NodeKind::Folder { .. } => None,
        }
    }

    /// Name without its extension.
    pub fn basename(&self) -> &str {
        match self.extension() {
            Some(ext) if !ext.is_empty() => &self.name[..self.name.len() - ext.len() - 1],
            _ => &self.name,
        }
    }

    /// Check if this is a markdown file.
    pub fn is_markdown(&self) -> bool {
        self.extension() == Some(MARKDOWN_EXTENSION)
    }

    /// Find a descendant by vault path.
    pub fn find(&self, path: &str) -> Option<&DocumentNode> {
        if self.path == path {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(path))
    }
}

/// Vault path of `name` inside the folder at `parent`.
pub fn child_path(parent: &str, name: &str) -> String {
    if parent == ROOT_PATH || parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Vault path of the folder containing `path`.
pub fn parent_path(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => ROOT_PATH,
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Extension after the last dot; names starting with their only dot have none.
pub fn extension_of(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[idx + 1..],
        _ => "",
    }
}

thread_local! {
    static COLLATOR: RefCell<Collator> =
        RefCell::new(Collator::new(Tailoring::Cldr(Locale::Root), false, true));
}

/// Order names the way a user-facing file list does.
///
/// Unicode collation with the CLDR root order: accents and case are
/// secondary to the base letters, lowercase sorts first on ties, and
/// punctuation is not ignored. Byte order breaks any remaining tie, so the
/// order is total.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    COLLATOR.with(|collator| collator.borrow_mut().collate(a, b))
}

/// Kind of link in a generated index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// Link to a child folder's own index
    Folder,
    /// Link to a markdown document
    Document,
}

impl LinkKind {
    /// Glyph shown in front of the label.
    pub fn glyph(self) -> &'static str {
        match self {
            LinkKind::Folder => "📂",
            LinkKind::Document => "📄",
        }
    }
}

/// One line of a generated index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    pub kind: LinkKind,
    pub label: String,
    pub target: String,
}

impl LinkEntry {
    /// Entry pointing at a child folder's index file.
    pub fn folder(folder: &DocumentNode, prefix: &str) -> Self {
        Self {
            kind: LinkKind::Folder,
            label: folder.name.clone(),
            target: naming::index_file_name(prefix, &folder.path),
        }
    }

    /// Entry pointing at a markdown file.
    pub fn document(file: &DocumentNode) -> Self {
        Self {
            kind: LinkKind::Document,
            label: file.basename().to_string(),
            target: file.path.clone(),
        }
    }

    /// Render as a markdown list item with a wiki link.
    pub fn render(&self) -> String {
        format!("- [[{}|{} {}]]", self.target, self.kind.glyph(), self.label)
    }
}

/// Link list computed for one folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderPlan {
    /// Vault path of the folder
    pub path: String,

    /// Display name used in the heading
    pub name: String,

    /// Entries in sorted child order
    pub links: Vec<LinkEntry>,
}

impl FolderPlan {
    /// A folder with nothing to list gets no index.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
