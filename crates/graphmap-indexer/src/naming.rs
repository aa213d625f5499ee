//! Canonical names for generated index files.

use crate::SyncConfig;

/// Token used for the vault root.
pub const ROOT_TOKEN: &str = "ROOT";

/// Path of the vault root.
pub const ROOT_PATH: &str = "/";

/// Flatten a vault path into a single file-name-safe token.
///
/// Separators (`/` and `\`) become `_` and whitespace becomes `-`, one
/// character for one character. The root maps to [`ROOT_TOKEN`].
pub fn canonicalize(path: &str) -> String {
    if path == ROOT_PATH {
        return ROOT_TOKEN.to_string();
    }

    path.chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_whitespace() => '-',
            c => c,
        })
        .collect()
}

/// Index file name without extension, which is also its link target.
pub fn index_file_name(prefix: &str, folder_path: &str) -> String {
    format!("{}{}", prefix, canonicalize(folder_path))
}

/// Vault path of the index file generated for `folder_path`.
pub fn index_path(config: &SyncConfig, folder_path: &str) -> String {
    format!(
        "{}/{}.md",
        config.container_path(),
        index_file_name(&config.file_prefix, folder_path)
    )
}
