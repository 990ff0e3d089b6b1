use super::directory::DirectoryView;
use super::handle::FileHandle;
use super::reader::ObjectReader;
use super::{ListingMode, SEPARATOR};
use crate::storage::ObjectStore;
use crate::types::{FsError, StoreError};
use std::sync::Arc;

/// Listing page size requested from the store (the S3 maximum)
pub const DEFAULT_PAGE_SIZE: i32 = 1000;

/// Outcome of resolving a request path
#[derive(Debug)]
pub enum Resolved {
    File(ObjectReader),
    Directory(DirectoryView),
    Missing,
}

/// Maps request paths onto objects and synthesized directories of one store.
///
/// Cheap to clone; clones share the store client.
#[derive(Clone)]
pub struct PathResolver {
    store: Arc<dyn ObjectStore>,
    listing: ListingMode,
    page_size: i32,
}

/// Key prefix of the directory a request path names.
///
/// The leading separator is dropped and a trailing one is ensured, so `docs`
/// and `/docs/` both become `docs/`; the root becomes the empty prefix.
pub fn directory_prefix(path: &str) -> String {
    let trimmed = path.trim_start_matches(SEPARATOR);
    if trimmed.is_empty() || trimmed.ends_with(SEPARATOR) {
        trimmed.to_string()
    } else {
        format!("{}{}", trimmed, SEPARATOR)
    }
}

impl PathResolver {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            listing: ListingMode::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_listing_mode(mut self, listing: ListingMode) -> Self {
        self.listing = listing;
        self
    }

    /// Page size for listing requests, clamped to `1..=1000`
    pub fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = page_size.clamp(1, DEFAULT_PAGE_SIZE);
        self
    }

    pub fn listing_mode(&self) -> ListingMode {
        self.listing
    }

    pub fn page_size(&self) -> i32 {
        self.page_size
    }

    /// Resolve a request path to a file, a directory, or nothing.
    ///
    /// Paths without a trailing separator are first tried as an exact key;
    /// when no such object exists they are tried as a directory. Store failures
    /// other than a missing key are returned as [`FsError::Upstream`].
    pub async fn resolve(&self, path: &str) -> Result<Resolved, FsError> {
        if !path.ends_with(SEPARATOR) {
            let key = path.trim_start_matches(SEPARATOR);
            if !key.is_empty() {
                match self.store.get_object(key).await {
                    Ok((body, metadata)) => {
                        tracing::debug!("Resolved {} to object ({} bytes)", path, metadata.size);
                        return Ok(Resolved::File(ObjectReader::new(body, metadata)));
                    }
                    Err(StoreError::NotFound { .. }) => {
                        tracing::debug!("No object at {}, trying as directory", path);
                    }
                    Err(e) => {
                        tracing::error!("Failed to fetch {}: {}", path, e);
                        return Err(e.into());
                    }
                }
            }
        }

        let prefix = directory_prefix(path);
        let page = self
            .store
            .list_objects(&prefix, self.listing.delimiter(), None, self.page_size)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list {:?}: {}", prefix, e);
                FsError::from(e)
            })?;

        if page.is_empty() {
            tracing::debug!("Nothing found under {:?}", prefix);
            return Ok(Resolved::Missing);
        }

        tracing::debug!(
            "Resolved {} to directory {:?} ({} objects, {} prefixes in first page)",
            path,
            prefix,
            page.objects.len(),
            page.common_prefixes.len()
        );
        Ok(Resolved::Directory(DirectoryView::new(
            Arc::clone(&self.store),
            prefix,
            self.listing,
            self.page_size,
            page,
        )))
    }

    /// Resolve a path into a handle, treating a missing path as an error
    pub async fn open(&self, path: &str) -> Result<FileHandle, FsError> {
        match self.resolve(path).await? {
            Resolved::File(reader) => Ok(FileHandle::File(reader)),
            Resolved::Directory(dir) => Ok(FileHandle::Directory(dir)),
            Resolved::Missing => Err(FsError::not_exist(path)),
        }
    }
}
