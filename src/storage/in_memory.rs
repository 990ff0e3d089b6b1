use super::backend::{ObjectStore, ObjectStream};
use crate::types::{ListPage, ObjectMetadata, StoreError};
use bytes::Bytes;
use futures::stream;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;
const MAX_KEYS_LIMIT: i32 = 1000;

/// In-memory object store for testing/development
#[derive(Clone)]
pub struct InMemoryStorage {
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,
    chunk_size: usize,
}

#[derive(Clone)]
struct StoredObject {
    data: Bytes,
    metadata: ObjectMetadata,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(RwLock::new(BTreeMap::new())),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Serve object bodies in chunks of at most `chunk_size` bytes
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    fn calculate_etag(data: &[u8]) -> String {
        use sha2::{Digest, Sha256};
        let hash = Sha256::digest(data);
        format!("\"{}\"", hex::encode(hash))
    }

    /// Store an object, deriving its metadata from the data
    pub async fn insert(&self, key: &str, data: impl Into<Bytes>) -> ObjectMetadata {
        let data = data.into();
        let metadata = ObjectMetadata {
            key: key.to_string(),
            size: data.len() as u64,
            etag: Self::calculate_etag(&data),
            last_modified: chrono::Utc::now(),
            content_type: "binary/octet-stream".to_string(),
        };
        self.insert_with_metadata(metadata.clone(), data).await;
        metadata
    }

    /// Store an object with caller-provided metadata.
    ///
    /// The declared size is taken as-is, so a body shorter or longer than
    /// `metadata.size` can be simulated.
    pub async fn insert_with_metadata(&self, metadata: ObjectMetadata, data: impl Into<Bytes>) {
        let mut objects = self.objects.write().await;
        objects.insert(
            metadata.key.clone(),
            StoredObject {
                data: data.into(),
                metadata,
            },
        );
    }

    /// The listing item a key contributes: itself, or its rolled-up prefix
    fn listing_item<'a>(key: &'a str, prefix: &str, delimiter: Option<&str>) -> &'a str {
        if let Some(d) = delimiter
            && !d.is_empty()
            && let Some(pos) = key[prefix.len()..].find(d)
        {
            return &key[..prefix.len() + pos + d.len()];
        }
        key
    }
}

#[async_trait::async_trait]
impl ObjectStore for InMemoryStorage {
    async fn get_object(&self, key: &str) -> Result<(ObjectStream, ObjectMetadata), StoreError> {
        let objects = self.objects.read().await;

        let obj = objects.get(key).ok_or_else(|| StoreError::not_found(key))?;

        let data = obj.data.clone();
        let chunks: Vec<Result<Bytes, StoreError>> = (0..data.len())
            .step_by(self.chunk_size)
            .map(|start| Ok(data.slice(start..(start + self.chunk_size).min(data.len()))))
            .collect();

        Ok((Box::pin(stream::iter(chunks)), obj.metadata.clone()))
    }

    async fn list_objects(
        &self,
        prefix: &str,
        delimiter: Option<&str>,
        continuation_token: Option<&str>,
        max_keys: i32,
    ) -> Result<ListPage, StoreError> {
        let objects = self.objects.read().await;

        let max_keys = if max_keys <= 0 {
            MAX_KEYS_LIMIT
        } else {
            max_keys.min(MAX_KEYS_LIMIT)
        } as usize;

        let mut page = ListPage::default();
        let mut emitted = 0;
        let mut last_item: Option<String> = None;

        for (key, obj) in objects.range(prefix.to_string()..) {
            if !key.starts_with(prefix) {
                break;
            }

            let item = Self::listing_item(key, prefix, delimiter);

            // Items up to and including the token were returned by earlier pages
            if continuation_token.is_some_and(|token| item <= token) {
                continue;
            }
            if last_item.as_deref() == Some(item) {
                continue;
            }

            if emitted == max_keys {
                page.next_continuation_token = last_item.clone();
                break;
            }

            if item.len() == key.len() {
                page.objects.push(obj.metadata.clone());
            } else {
                page.common_prefixes.push(item.to_string());
            }
            emitted += 1;
            last_item = Some(item.to_string());
        }

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    async fn collect(mut stream: ObjectStream) -> (Vec<u8>, usize) {
        let mut collected = Vec::new();
        let mut chunks = 0;
        while let Some(result) = stream.next().await {
            collected.extend_from_slice(&result.unwrap());
            chunks += 1;
        }
        (collected, chunks)
    }

    #[tokio::test]
    async fn test_insert_and_get_object() {
        let storage = InMemoryStorage::new();
        let key = "test-key";
        let data = Bytes::from("Hello, World!");

        let stored = storage.insert(key, data.clone()).await;
        assert!(!stored.etag.is_empty());

        let (stream, metadata) = storage.get_object(key).await.unwrap();
        assert_eq!(metadata.key, key);
        assert_eq!(metadata.size, data.len() as u64);

        let (collected, _) = collect(stream).await;
        assert_eq!(collected, data);
    }

    #[tokio::test]
    async fn test_get_object_in_chunks() {
        let storage = InMemoryStorage::new().with_chunk_size(4);
        storage.insert("k", "0123456789").await;

        let (stream, _) = storage.get_object("k").await.unwrap();
        let (collected, chunks) = collect(stream).await;
        assert_eq!(collected, b"0123456789");
        assert_eq!(chunks, 3);
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let storage = InMemoryStorage::new();
        assert!(matches!(
            storage.get_object("nonexistent").await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_with_prefix() {
        let storage = InMemoryStorage::new();
        storage.insert("photos/a.jpg", "1").await;
        storage.insert("photos/b.jpg", "2").await;
        storage.insert("docs/c.pdf", "3").await;

        let page = storage
            .list_objects("photos/", None, None, 100)
            .await
            .unwrap();
        let keys: Vec<&str> = page.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["photos/a.jpg", "photos/b.jpg"]);
        assert!(page.next_continuation_token.is_none());
    }

    #[tokio::test]
    async fn test_list_with_delimiter_rolls_up_prefixes() {
        let storage = InMemoryStorage::new();
        storage.insert("docs/", "").await;
        storage.insert("docs/img/a.png", "1").await;
        storage.insert("docs/img/b.png", "2").await;
        storage.insert("docs/readme.txt", "3").await;
        storage.insert("docs/zz/c", "4").await;

        let page = storage
            .list_objects("docs/", Some("/"), None, 100)
            .await
            .unwrap();
        let keys: Vec<&str> = page.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["docs/", "docs/readme.txt"]);
        assert_eq!(page.common_prefixes, vec!["docs/img/", "docs/zz/"]);
    }

    #[tokio::test]
    async fn test_list_pagination_with_continuation_token() {
        let storage = InMemoryStorage::new();
        for i in 0..5 {
            storage.insert(&format!("dir/file-{}.txt", i), "x").await;
        }
        storage.insert("dir/sub/one", "x").await;
        storage.insert("dir/sub/two", "x").await;

        let mut token: Option<String> = None;
        let mut items = Vec::new();
        let mut pages = 0;
        loop {
            let page = storage
                .list_objects("dir/", Some("/"), token.as_deref(), 2)
                .await
                .unwrap();
            pages += 1;
            items.extend(page.objects.iter().map(|o| o.key.clone()));
            items.extend(page.common_prefixes.iter().cloned());
            token = page.next_continuation_token;
            if token.is_none() {
                break;
            }
        }

        assert_eq!(pages, 3);
        assert_eq!(
            items,
            vec![
                "dir/file-0.txt",
                "dir/file-1.txt",
                "dir/file-2.txt",
                "dir/file-3.txt",
                "dir/file-4.txt",
                "dir/sub/",
            ]
        );
    }

    #[tokio::test]
    async fn test_list_exact_page_boundary_has_no_token() {
        let storage = InMemoryStorage::new();
        storage.insert("a/1", "x").await;
        storage.insert("a/2", "x").await;

        let page = storage.list_objects("a/", None, None, 2).await.unwrap();
        assert_eq!(page.objects.len(), 2);
        assert!(page.next_continuation_token.is_none());
    }
}
