// Library exports for integration tests
pub mod app_state;
pub mod config;
pub mod fs;
pub mod handlers;
pub mod server;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use app_state::{AppState, Mount};
pub use config::{BackendKind, BucketConfig, Config};
pub use fs::{DirEntry, FileHandle, ListingMode, PathResolver, Resolved};
pub use storage::{InMemoryStorage, ObjectStore, S3Backend};
pub use types::{FsError, StoreError};

// Re-export server creation function
pub use server::create_app;
