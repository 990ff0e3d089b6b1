pub mod error;
mod models;

pub use error::{FsError, StoreError};
pub use models::{ListPage, ObjectMetadata};
