use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use s3proxy::{
    AppState, InMemoryStorage, ListingMode, Mount, ObjectStore, PathResolver, create_app,
};
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_BUCKET: &str = "test-bucket";

/// Test server wrapping the production router
///
/// Requests are driven through the actual router built by create_app(),
/// so routing, handlers and middleware match production.
pub struct TestServer {
    app: Router,
    pub storage: InMemoryStorage,
}

/// Fully collected response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// The body stream ended with an error
    pub body_failed: bool,
}

#[allow(dead_code)]
impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[allow(dead_code)]
impl TestServer {
    /// Start a test server serving an in-memory bucket at /
    pub async fn start() -> Self {
        Self::start_with(ListingMode::Shallow, 1000).await
    }

    /// Start a test server with specific listing options
    pub async fn start_with(listing: ListingMode, page_size: i32) -> Self {
        let storage = InMemoryStorage::new().with_chunk_size(16);
        let resolver = PathResolver::new(Arc::new(storage.clone()))
            .with_listing_mode(listing)
            .with_page_size(page_size);

        let app_state = AppState::new(vec![Mount::new("/", TEST_BUCKET.to_string(), resolver)]);

        Self {
            app: create_app(app_state),
            storage,
        }
    }

    /// Serve an arbitrary store at the given mount path
    pub fn with_store(path: &str, store: Arc<dyn ObjectStore>) -> Self {
        let resolver = PathResolver::new(store);
        let app_state = AppState::new(vec![Mount::new(path, TEST_BUCKET.to_string(), resolver)]);

        Self {
            app: create_app(app_state),
            storage: InMemoryStorage::new(),
        }
    }

    /// Serve several mounts; `storage` is left empty
    pub fn with_mounts(mounts: Vec<Mount>) -> Self {
        Self {
            app: create_app(AppState::new(mounts)),
            storage: InMemoryStorage::new(),
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, &[]).await
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::empty()).unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let (body, body_failed) = match response.into_body().collect().await {
            Ok(collected) => (collected.to_bytes(), false),
            Err(_) => (Bytes::new(), true),
        };

        TestResponse {
            status,
            headers,
            body,
            body_failed,
        }
    }
}
