use super::directory::DirectoryView;
use super::entry::DirEntry;
use super::reader::ObjectReader;
use crate::types::FsError;
use chrono::{DateTime, Utc};
use std::io::SeekFrom;

/// A resolved path, as handed to the file server.
///
/// Owned by a single request; dropping it releases the object body.
#[derive(Debug)]
pub enum FileHandle {
    File(ObjectReader),
    Directory(DirectoryView),
}

impl FileHandle {
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, FsError> {
        match self {
            FileHandle::File(reader) => reader.read(buf).await,
            FileHandle::Directory(dir) => dir.read(buf),
        }
    }

    pub async fn seek(&mut self, pos: SeekFrom) -> Result<u64, FsError> {
        match self {
            FileHandle::File(reader) => reader.seek(pos).await,
            FileHandle::Directory(dir) => dir.seek(pos),
        }
    }

    pub async fn list_entries(
        &mut self,
        max_count: i64,
    ) -> Result<(Vec<DirEntry>, bool), FsError> {
        match self {
            FileHandle::File(_) => Err(FsError::UnsupportedOperation("list entries of a file")),
            FileHandle::Directory(dir) => dir.list_entries(max_count).await,
        }
    }

    pub fn close(&mut self) {
        match self {
            FileHandle::File(reader) => reader.close(),
            FileHandle::Directory(dir) => dir.close(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FileHandle::File(reader) => reader.name(),
            FileHandle::Directory(dir) => dir.name(),
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            FileHandle::File(reader) => reader.size(),
            FileHandle::Directory(dir) => dir.size(),
        }
    }

    pub fn mod_time(&self) -> DateTime<Utc> {
        match self {
            FileHandle::File(reader) => reader.mod_time(),
            FileHandle::Directory(dir) => dir.mod_time(),
        }
    }

    pub fn mode(&self) -> u32 {
        match self {
            FileHandle::File(reader) => reader.mode(),
            FileHandle::Directory(dir) => dir.mode(),
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, FileHandle::Directory(_))
    }
}
