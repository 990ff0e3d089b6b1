use super::directory_listing::{encode_path, render_listing};
use super::range::{ByteRange, parse_range};
use crate::{
    app_state::AppState,
    fs::{FileHandle, ObjectReader},
    types::FsError,
};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use std::io::SeekFrom;

/// GET / - Serve the root of the mounted buckets
pub async fn get_root(State(app_state): State<AppState>, headers: HeaderMap) -> Response {
    serve(app_state, "/".to_string(), headers).await
}

/// GET /{path} - Serve a file or directory listing
pub async fn get_path(
    Path(path): Path<String>,
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    serve(app_state, format!("/{}", path), headers).await
}

async fn serve(app_state: AppState, request_path: String, headers: HeaderMap) -> Response {
    let Some((mount, path)) = app_state.route(&request_path) else {
        tracing::debug!("No mount serves {}", request_path);
        return FsError::not_exist(request_path).into_response();
    };
    tracing::info!("GET path: bucket={}, path={}", mount.bucket, path);

    let result = match mount.resolver.open(&path).await {
        Ok(FileHandle::File(reader)) => serve_file(reader, &headers).await,
        Ok(FileHandle::Directory(_)) if !request_path.ends_with('/') => {
            Ok(redirect_to_directory(&request_path))
        }
        Ok(FileHandle::Directory(dir)) => render_listing(dir).await,
        Err(e) => Err(e),
    };

    result.unwrap_or_else(|err| {
        if err.is_failure() {
            tracing::error!("Failed to serve {} from {}: {}", path, mount.bucket, err);
        } else {
            tracing::debug!("Not found: {} in {}", path, mount.bucket);
        }
        err.into_response()
    })
}

/// Relative redirect from `/a/docs` to `docs/`
fn redirect_to_directory(request_path: &str) -> Response {
    let base = request_path.rsplit('/').next().unwrap_or_default();
    let location = encode_path(&format!("{}/", base));
    match HeaderValue::from_str(&location) {
        Ok(value) => (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, value)]).into_response(),
        Err(_) => StatusCode::MOVED_PERMANENTLY.into_response(),
    }
}

fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Whether the client's copy, dated by `If-Modified-Since`, is still current
fn not_modified(headers: &HeaderMap, mod_time: DateTime<Utc>) -> bool {
    headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
        .is_some_and(|since| mod_time.timestamp() <= since.timestamp())
}

async fn serve_file(mut reader: ObjectReader, headers: &HeaderMap) -> Result<Response, FsError> {
    let size = reader.size();
    let last_modified = http_date(reader.mod_time());

    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    if let Ok(value) = HeaderValue::from_str(&last_modified) {
        response_headers.insert(header::LAST_MODIFIED, value);
    }
    if let Ok(value) = HeaderValue::from_str(reader.etag())
        && !reader.etag().is_empty()
    {
        response_headers.insert(header::ETAG, value);
    }

    if not_modified(headers, reader.mod_time()) {
        reader.close();
        return Ok((StatusCode::NOT_MODIFIED, response_headers).into_response());
    }

    if let Ok(value) = HeaderValue::from_str(reader.content_type()) {
        response_headers.insert(header::CONTENT_TYPE, value);
    }

    let range = parse_range(
        headers.get(header::RANGE).and_then(|v| v.to_str().ok()),
        size,
    );

    match range {
        ByteRange::Full => {
            response_headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));
            let body = Body::from_stream(reader.into_stream(None));
            Ok((StatusCode::OK, response_headers, body).into_response())
        }
        ByteRange::Partial { start, len } => {
            reader.seek(SeekFrom::Start(start)).await?;

            let content_range = format!("bytes {}-{}/{}", start, start + len - 1, size);
            if let Ok(value) = HeaderValue::from_str(&content_range) {
                response_headers.insert(header::CONTENT_RANGE, value);
            }
            response_headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));

            let body = Body::from_stream(reader.into_stream(Some(len)));
            Ok((StatusCode::PARTIAL_CONTENT, response_headers, body).into_response())
        }
        ByteRange::Unsatisfiable => {
            reader.close();
            let content_range = format!("bytes */{}", size);
            if let Ok(value) = HeaderValue::from_str(&content_range) {
                response_headers.insert(header::CONTENT_RANGE, value);
            }
            response_headers.remove(header::CONTENT_TYPE);
            Ok((StatusCode::RANGE_NOT_SATISFIABLE, response_headers).into_response())
        }
    }
}
