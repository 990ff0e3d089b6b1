use super::entry::{DIR_MODE, DirEntry, project, project_prefix};
use super::{ListingMode, SEPARATOR};
use crate::storage::ObjectStore;
use crate::types::{FsError, ListPage};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A directory synthesized from the keys sharing a prefix.
///
/// Holds one listing page at a time. The cursor only moves forward; when it
/// runs off the end of a page and the store reported more results, the next
/// page is fetched on demand.
pub struct DirectoryView {
    store: Arc<dyn ObjectStore>,
    prefix: String,
    listing: ListingMode,
    page_size: i32,
    entries: Vec<DirEntry>,
    cursor: usize,
    /// Entries taken off the cursor by a call whose page fetch failed
    carried: Vec<DirEntry>,
    next_token: Option<String>,
    mod_time: DateTime<Utc>,
}

impl DirectoryView {
    pub(crate) fn new(
        store: Arc<dyn ObjectStore>,
        prefix: String,
        listing: ListingMode,
        page_size: i32,
        first_page: ListPage,
    ) -> Self {
        let mut view = Self {
            store,
            prefix,
            listing,
            page_size,
            entries: Vec::new(),
            cursor: 0,
            carried: Vec::new(),
            next_token: None,
            mod_time: Utc::now(),
        };
        view.load_page(first_page);
        view
    }

    /// Key prefix shared by every child
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Last path segment of the prefix, `/` for the bucket root
    pub fn name(&self) -> &str {
        self.prefix
            .trim_end_matches(SEPARATOR)
            .rsplit(SEPARATOR)
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or("/")
    }

    pub fn size(&self) -> u64 {
        0
    }

    /// Directories have no stored timestamp; this is when the view was created
    pub fn mod_time(&self) -> DateTime<Utc> {
        self.mod_time
    }

    pub fn mode(&self) -> u32 {
        DIR_MODE
    }

    /// True once every entry of the listing has been returned
    pub fn is_done(&self) -> bool {
        self.carried.is_empty() && self.cursor == self.entries.len() && self.next_token.is_none()
    }

    /// Return up to `max_count` entries from the cursor, or every remaining
    /// entry when `max_count <= 0`, together with whether the listing is done.
    ///
    /// A failed page fetch is returned as an error. Entries collected before
    /// the failure are not lost: the next call returns them first and retries
    /// the fetch.
    pub async fn list_entries(
        &mut self,
        max_count: i64,
    ) -> Result<(Vec<DirEntry>, bool), FsError> {
        let limit = usize::try_from(max_count).ok().filter(|n| *n > 0);
        let mut out = std::mem::take(&mut self.carried);

        if let Some(limit) = limit
            && out.len() >= limit
        {
            self.carried = out.split_off(limit);
            return Ok((out, self.is_done()));
        }

        loop {
            if self.cursor == self.entries.len() {
                match self.fetch_next_page().await {
                    Ok(true) => continue,
                    Ok(false) => break,
                    Err(e) => {
                        tracing::debug!(
                            "Listing {:?} interrupted with {} entries pending",
                            self.prefix,
                            out.len()
                        );
                        self.carried = out;
                        return Err(e);
                    }
                }
            }

            let available = self.entries.len() - self.cursor;
            let take = match limit {
                Some(limit) => available.min(limit - out.len()),
                None => available,
            };
            out.extend_from_slice(&self.entries[self.cursor..self.cursor + take]);
            self.cursor += take;

            if limit.is_some_and(|limit| out.len() >= limit) {
                break;
            }
        }

        Ok((out, self.is_done()))
    }

    /// Directories are not byte streams
    pub fn read(&mut self, _buf: &mut [u8]) -> Result<usize, FsError> {
        Err(FsError::UnsupportedOperation("read on directory"))
    }

    pub fn seek(&mut self, _pos: std::io::SeekFrom) -> Result<u64, FsError> {
        Err(FsError::UnsupportedOperation("seek on directory"))
    }

    pub fn close(&mut self) {
        self.entries.clear();
        self.carried.clear();
        self.cursor = 0;
        self.next_token = None;
    }

    async fn fetch_next_page(&mut self) -> Result<bool, FsError> {
        let Some(token) = self.next_token.as_deref() else {
            return Ok(false);
        };

        tracing::debug!("Fetching next listing page for prefix {:?}", self.prefix);
        let page = self
            .store
            .list_objects(
                &self.prefix,
                self.listing.delimiter(),
                Some(token),
                self.page_size,
            )
            .await?;

        self.load_page(page);
        Ok(true)
    }

    fn load_page(&mut self, page: ListPage) {
        let mut entries: Vec<DirEntry> = page
            .objects
            .iter()
            .filter_map(|object| project(&self.prefix, object))
            .collect();
        entries.extend(
            page.common_prefixes
                .iter()
                .filter_map(|p| project_prefix(&self.prefix, p, self.mod_time)),
        );

        self.entries = entries;
        self.cursor = 0;
        self.next_token = page.next_continuation_token;
    }
}

impl std::fmt::Debug for DirectoryView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryView")
            .field("prefix", &self.prefix)
            .field("listing", &self.listing)
            .field("cursor", &self.cursor)
            .field("loaded", &self.entries.len())
            .field("more_pages", &self.next_token.is_some())
            .finish()
    }
}
