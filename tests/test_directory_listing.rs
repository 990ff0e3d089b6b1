mod helpers;

use axum::http::StatusCode;
use helpers::{TEST_BUCKET, TestServer};
use s3proxy::storage::ObjectStream;
use s3proxy::types::{ListPage, ObjectMetadata};
use s3proxy::{InMemoryStorage, ListingMode, Mount, ObjectStore, PathResolver, StoreError};
use std::sync::Arc;

async fn seed_docs(server: &TestServer) {
    server.storage.insert("docs/a.txt", "alpha").await;
    server.storage.insert("docs/img/logo.png", "png").await;
    server.storage.insert("docs-old.txt", "old").await;
}

/// Hrefs of the listing in document order
fn links(html: &str) -> Vec<String> {
    html.lines()
        .filter_map(|line| line.strip_prefix("<a href=\""))
        .filter_map(|rest| rest.split('"').next())
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_directory_without_slash_redirects() {
    let server = TestServer::start().await;
    seed_docs(&server).await;

    let response = server.get("/docs").await;

    assert_eq!(response.status, StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.header("location"), Some("docs/"));
}

#[tokio::test]
async fn test_shallow_listing() {
    let server = TestServer::start().await;
    seed_docs(&server).await;

    let response = server.get("/docs/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.header("content-type"),
        Some("text/html; charset=utf-8")
    );
    assert_eq!(links(&response.text()), vec!["a.txt", "img/"]);
}

#[tokio::test]
async fn test_recursive_listing() {
    let server = TestServer::start_with(ListingMode::Recursive, 1000).await;
    seed_docs(&server).await;

    let response = server.get("/docs/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(links(&response.text()), vec!["a.txt", "img/logo.png"]);
}

#[tokio::test]
async fn test_root_listing() {
    let server = TestServer::start().await;
    seed_docs(&server).await;

    let response = server.get("/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(links(&response.text()), vec!["docs-old.txt", "docs/"]);
}

#[tokio::test]
async fn test_nested_directory_listing() {
    let server = TestServer::start().await;
    seed_docs(&server).await;

    let response = server.get("/docs/img/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(links(&response.text()), vec!["logo.png"]);
}

#[tokio::test]
async fn test_sibling_key_is_not_a_directory() {
    let server = TestServer::start().await;
    server.storage.insert("docs-old.txt", "old").await;

    let response = server.get("/docs/").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = server.get("/docs").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.text(), "404 page not found");
}

#[tokio::test]
async fn test_listing_spans_multiple_pages() {
    let server = TestServer::start_with(ListingMode::Shallow, 2).await;
    for i in 0..7 {
        server
            .storage
            .insert(&format!("logs/{:02}.log", i), format!("line {}", i))
            .await;
    }
    server.storage.insert("logs/archive/old.log", "old").await;

    let response = server.get("/logs/").await;

    assert_eq!(response.status, StatusCode::OK);
    let links = links(&response.text());
    assert_eq!(links.len(), 8);
    for i in 0..7 {
        assert!(links.contains(&format!("{:02}.log", i)), "missing {:02}.log", i);
    }
    assert!(links.contains(&"archive/".to_string()));
}

#[tokio::test]
async fn test_folder_marker_is_not_listed() {
    let server = TestServer::start().await;
    server.storage.insert("photos/", "").await;
    server.storage.insert("photos/cat.jpg", "meow").await;

    let response = server.get("/photos/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(links(&response.text()), vec!["cat.jpg"]);
}

#[tokio::test]
async fn test_listing_escapes_names() {
    let server = TestServer::start().await;
    server.storage.insert("files/a b&c.txt", "x").await;
    server.storage.insert("files/<tag>.txt", "y").await;

    let response = server.get("/files/").await;
    let html = response.text();

    assert_eq!(response.status, StatusCode::OK);
    assert!(html.contains("<a href=\"%3Ctag%3E.txt\">&lt;tag&gt;.txt</a>"));
    assert!(html.contains("<a href=\"a%20b%26c.txt\">a b&amp;c.txt</a>"));
}

#[tokio::test]
async fn test_empty_bucket_root_is_not_found() {
    let server = TestServer::start().await;

    let response = server.get("/").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mounts_route_by_longest_path() {
    let site = InMemoryStorage::new();
    site.insert("index.html", "<h1>site</h1>").await;
    let assets = InMemoryStorage::new();
    assets.insert("logo.png", "png-bytes").await;

    let server = TestServer::with_mounts(vec![
        Mount::new(
            "/",
            TEST_BUCKET.to_string(),
            PathResolver::new(Arc::new(site)),
        ),
        Mount::new(
            "/assets",
            "assets-bucket".to_string(),
            PathResolver::new(Arc::new(assets)),
        ),
    ]);

    let response = server.get("/index.html").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "<h1>site</h1>");

    let response = server.get("/assets/logo.png").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "png-bytes");

    // Not visible through the site bucket
    let response = server.get("/logo.png").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = server.get("/assets").await;
    assert_eq!(response.status, StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.header("location"), Some("assets/"));

    let response = server.get("/assets/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(links(&response.text()), vec!["logo.png"]);
}

/// Serves the first listing page, then refuses continuation requests
struct FirstPageOnly(InMemoryStorage);

#[async_trait::async_trait]
impl ObjectStore for FirstPageOnly {
    async fn get_object(&self, key: &str) -> Result<(ObjectStream, ObjectMetadata), StoreError> {
        self.0.get_object(key).await
    }

    async fn list_objects(
        &self,
        prefix: &str,
        delimiter: Option<&str>,
        continuation_token: Option<&str>,
        max_keys: i32,
    ) -> Result<ListPage, StoreError> {
        if continuation_token.is_some() {
            return Err(StoreError::service("AccessDenied", "Access Denied"));
        }
        self.0
            .list_objects(prefix, delimiter, continuation_token, max_keys)
            .await
    }
}

#[tokio::test]
async fn test_failed_follow_up_page_is_not_a_truncated_listing() {
    let storage = InMemoryStorage::new();
    for i in 0..5 {
        storage.insert(&format!("logs/{}.log", i), "x").await;
    }
    let resolver = PathResolver::new(Arc::new(FirstPageOnly(storage))).with_page_size(2);
    let server = TestServer::with_mounts(vec![Mount::new("/", TEST_BUCKET.to_string(), resolver)]);

    let response = server.get("/logs/").await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text(), "AccessDenied: Access Denied");
}
