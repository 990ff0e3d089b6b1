use super::SEPARATOR;
use crate::types::ObjectMetadata;
use chrono::{DateTime, Utc};

/// Permission bits reported for objects
pub const FILE_MODE: u32 = 0o444;
/// Permission bits reported for synthesized directories
pub const DIR_MODE: u32 = 0o555;

/// A child of a synthesized directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Name relative to the parent prefix, never empty
    pub name: String,
    pub size: u64,
    pub mod_time: DateTime<Utc>,
    pub mode: u32,
    pub is_dir: bool,
}

/// Project a listed object into an entry of the directory at `prefix`.
///
/// Returns `None` for the prefix object itself (a folder marker) and for keys
/// outside the prefix.
pub fn project(prefix: &str, object: &ObjectMetadata) -> Option<DirEntry> {
    let name = object.key.strip_prefix(prefix)?;
    if name.is_empty() {
        return None;
    }

    Some(DirEntry {
        name: name.to_string(),
        size: object.size,
        mod_time: object.last_modified,
        mode: FILE_MODE,
        is_dir: false,
    })
}

/// Project a rolled-up common prefix into a sub-directory entry.
pub fn project_prefix(
    prefix: &str,
    common_prefix: &str,
    mod_time: DateTime<Utc>,
) -> Option<DirEntry> {
    let relative = common_prefix.strip_prefix(prefix)?;
    let name = relative.strip_suffix(SEPARATOR).unwrap_or(relative);
    if name.is_empty() {
        return None;
    }

    Some(DirEntry {
        name: name.to_string(),
        size: 0,
        mod_time,
        mode: DIR_MODE,
        is_dir: true,
    })
}
