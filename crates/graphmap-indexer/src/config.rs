//! Synchronization settings consumed by a single pass.

/// Default folder holding generated index files.
pub const DEFAULT_INDEX_CONTAINER: &str = "_GraphMaps";

/// Default name prefix of generated index files.
pub const DEFAULT_FILE_PREFIX: &str = "Map_";

/// Settings a synchronization pass or a change gate decision reads.
///
/// Callers hand a value in per call; nothing in this crate holds on to a
/// mutable copy, so a pass always sees one consistent configuration.
/// Persistence belongs to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Vault-relative folder holding generated index files
    pub index_container: String,

    /// Prefix prepended to every generated index file name
    pub file_prefix: String,

    /// React to vault changes automatically
    pub auto_sync: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            index_container: DEFAULT_INDEX_CONTAINER.to_string(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            auto_sync: true,
        }
    }
}

impl SyncConfig {
    /// Container path without leading or trailing separators.
    pub fn container_path(&self) -> &str {
        self.index_container.trim_matches(|c| c == '/' || c == '\\')
    }

    /// Last segment of the container path.
    pub fn container_name(&self) -> &str {
        let path = self.container_path();
        path.rsplit('/').next().unwrap_or(path)
    }

    /// Whether `path` is the container itself or lies below it.
    pub fn is_within_container(&self, path: &str) -> bool {
        let container = self.container_path();
        match path.strip_prefix(container) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Whether the container name occurs anywhere in `path`.
    ///
    /// Looser than [`SyncConfig::is_within_container`]. The change gate
    /// drops every path this matches, including the system's own writes.
    pub fn mentions_container(&self, path: &str) -> bool {
        let container = self.container_path();
        !container.is_empty() && path.contains(container)
    }
}
