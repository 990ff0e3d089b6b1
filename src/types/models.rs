/// Metadata of a stored object, as reported by the store
#[derive(Debug, Clone)]
pub struct ObjectMetadata {
    pub key: String,
    pub size: u64,
    pub etag: String,
    pub last_modified: chrono::DateTime<chrono::Utc>,
    pub content_type: String,
}

/// One page of a prefix listing
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Objects in store order (lexicographic by key)
    pub objects: Vec<ObjectMetadata>,
    /// Rolled-up key prefixes, only populated when listing with a delimiter
    pub common_prefixes: Vec<String>,
    /// Present when the store holds more results beyond this page
    pub next_continuation_token: Option<String>,
}

impl ListPage {
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.common_prefixes.is_empty()
    }
}
