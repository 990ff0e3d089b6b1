use crate::config::normalize_mount_path;
use crate::fs::PathResolver;
use std::sync::Arc;

/// A bucket served under a URL path
#[derive(Clone)]
pub struct Mount {
    pub path: String,
    pub bucket: String,
    pub resolver: PathResolver,
}

impl Mount {
    pub fn new(path: &str, bucket: String, resolver: PathResolver) -> Self {
        Self {
            path: normalize_mount_path(path),
            bucket,
            resolver,
        }
    }

    /// Path inside the bucket for a request path under this mount
    fn relative_path(&self, request_path: &str) -> Option<String> {
        if self.path == "/" {
            return Some(request_path.to_string());
        }

        let rest = request_path.strip_prefix(&self.path)?;
        if rest.is_empty() {
            Some("/".to_string())
        } else if rest.starts_with('/') {
            Some(rest.to_string())
        } else {
            None
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    mounts: Arc<Vec<Mount>>,
}

impl AppState {
    pub fn new(mut mounts: Vec<Mount>) -> Self {
        // Longest mount path wins
        mounts.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
        Self {
            mounts: Arc::new(mounts),
        }
    }

    pub fn mounts(&self) -> &[Mount] {
        &self.mounts
    }

    /// Find the mount serving `request_path` and the path relative to it
    pub fn route(&self, request_path: &str) -> Option<(&Mount, String)> {
        self.mounts
            .iter()
            .find_map(|mount| Some((mount, mount.relative_path(request_path)?)))
    }
}
