use crate::fs::{DEFAULT_PAGE_SIZE, ListingMode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_MOUNT_PATH: &str = "/";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub buckets: Vec<BucketConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    S3,
    /// Empty in-process store that cannot be seeded from config. Every path
    /// answers 404; useful only for smoke-testing a deployment.
    Memory,
}

/// One bucket served under a URL mount path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketConfig {
    pub name: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_mount_path")]
    pub path: String,
    #[serde(default, rename = "type")]
    pub backend: BackendKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub force_path_style: bool,
    #[serde(default)]
    pub listing: ListingMode,
    #[serde(default = "default_page_size")]
    pub page_size: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_mount_path() -> String {
    DEFAULT_MOUNT_PATH.to_string()
}

fn default_page_size() -> i32 {
    DEFAULT_PAGE_SIZE
}

impl BucketConfig {
    pub fn new(name: String, region: String) -> Self {
        Self {
            name,
            region,
            path: default_mount_path(),
            backend: BackendKind::default(),
            endpoint: None,
            force_path_style: false,
            listing: ListingMode::default(),
            page_size: DEFAULT_PAGE_SIZE,
            access_key_id: None,
            secret_access_key: None,
        }
    }
}

/// Normalize a mount path to `/segment/...` without a trailing separator
pub fn normalize_mount_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        DEFAULT_MOUNT_PATH.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

impl Config {
    /// Load a config file; `.json` files are parsed as JSON, anything else as YAML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config: Config = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yml::from_str(&content)?
        };

        config.validate()?;
        Ok(config)
    }

    /// Single bucket mounted at the root
    pub fn single(bucket: BucketConfig) -> Self {
        Self {
            buckets: vec![bucket],
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buckets.is_empty() {
            return Err(ConfigError::Invalid("no buckets configured".to_string()));
        }

        let mut mounts = HashSet::new();
        for bucket in &self.buckets {
            if bucket.name.trim().is_empty() {
                return Err(ConfigError::Invalid("bucket name is empty".to_string()));
            }
            let mount = normalize_mount_path(&bucket.path);
            if !mounts.insert(mount.clone()) {
                return Err(ConfigError::Invalid(format!(
                    "mount path {} is used by more than one bucket",
                    mount
                )));
            }
        }

        Ok(())
    }
}
