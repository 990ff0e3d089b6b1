//! Filesystem view over a flat object keyspace.
//!
//! A request path resolves to a single object ([`ObjectReader`]), a synthesized
//! directory of keys sharing a prefix ([`DirectoryView`]), or nothing.

mod directory;
mod entry;
mod handle;
mod reader;
mod resolver;

pub use directory::DirectoryView;
pub use entry::{DIR_MODE, DirEntry, FILE_MODE, project, project_prefix};
pub use handle::FileHandle;
pub use reader::ObjectReader;
pub use resolver::{DEFAULT_PAGE_SIZE, PathResolver, Resolved, directory_prefix};

use serde::{Deserialize, Serialize};

/// Key separator used to infer directories
pub const SEPARATOR: char = '/';

/// How a directory's children are listed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingMode {
    /// Immediate children only; deeper keys show up as sub-directories
    #[default]
    Shallow,
    /// Every key below the prefix, named relative to it
    Recursive,
}

impl ListingMode {
    pub(crate) fn delimiter(self) -> Option<&'static str> {
        match self {
            ListingMode::Shallow => Some("/"),
            ListingMode::Recursive => None,
        }
    }
}
