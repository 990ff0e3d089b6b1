use crate::types::{ListPage, ObjectMetadata, StoreError};
use bytes::Bytes;
use futures::stream::Stream;
use std::pin::Pin;

/// Streaming object body
pub type ObjectStream = Pin<Box<dyn Stream<Item = Result<Bytes, StoreError>> + Send>>;

/// Read-only object store capability - implement this for different storage backends
///
/// Implementations are shared across concurrent requests and must not hold
/// per-request state.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object body together with its metadata.
    ///
    /// Returns [`StoreError::NotFound`] when no object has exactly this key.
    async fn get_object(&self, key: &str) -> Result<(ObjectStream, ObjectMetadata), StoreError>;

    /// List one page of keys starting with `prefix`.
    ///
    /// With a `delimiter`, keys containing the delimiter after the prefix are
    /// rolled up into [`ListPage::common_prefixes`].
    async fn list_objects(
        &self,
        prefix: &str,
        delimiter: Option<&str>,
        continuation_token: Option<&str>,
        max_keys: i32,
    ) -> Result<ListPage, StoreError>;
}
