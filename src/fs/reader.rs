use super::{FILE_MODE, SEPARATOR};
use crate::storage::ObjectStream;
use crate::types::{FsError, ObjectMetadata};
use bytes::{Buf, Bytes, BytesMut};
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use std::io::SeekFrom;

/// Reader over a single resolved object.
///
/// Reads stream straight from the object body. The first seek buffers the
/// full body in memory, after which reads and seeks use that buffer.
pub struct ObjectReader {
    metadata: ObjectMetadata,
    body: Option<ObjectStream>,
    /// Bytes already returned by streaming reads, kept so a seek can rewind
    consumed: BytesMut,
    /// Part of the last body chunk not yet handed out
    pending: Bytes,
    /// Bytes received from the body so far
    received: u64,
    buffer: Option<Buffered>,
    closed: bool,
}

/// The whole object held in memory
struct Buffered {
    data: Bytes,
    pos: u64,
}

impl Buffered {
    fn end(&self) -> u64 {
        self.data.len() as u64
    }

    fn remaining(&self) -> Bytes {
        if self.pos >= self.end() {
            return Bytes::new();
        }
        self.data.slice(self.pos as usize..)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64, FsError> {
        let target = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::End(delta) => self.end() as i128 + delta as i128,
            SeekFrom::Current(delta) => self.pos as i128 + delta as i128,
        };

        if target < 0 || target > u64::MAX as i128 {
            return Err(FsError::InvalidSeek { offset: target });
        }

        self.pos = target as u64;
        Ok(self.pos)
    }
}

impl ObjectReader {
    pub(crate) fn new(body: ObjectStream, metadata: ObjectMetadata) -> Self {
        Self {
            metadata,
            body: Some(body),
            consumed: BytesMut::new(),
            pending: Bytes::new(),
            received: 0,
            buffer: None,
            closed: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.metadata.key
    }

    /// Last path segment of the key
    pub fn name(&self) -> &str {
        self.metadata
            .key
            .rsplit(SEPARATOR)
            .next()
            .unwrap_or(&self.metadata.key)
    }

    /// Size declared by the store
    pub fn size(&self) -> u64 {
        self.metadata.size
    }

    pub fn mod_time(&self) -> DateTime<Utc> {
        self.metadata.last_modified
    }

    pub fn mode(&self) -> u32 {
        FILE_MODE
    }

    pub fn etag(&self) -> &str {
        &self.metadata.etag
    }

    pub fn content_type(&self) -> &str {
        &self.metadata.content_type
    }

    /// Whether the body has been drained into memory
    pub fn is_buffered(&self) -> bool {
        self.buffer.is_some()
    }

    /// Read into `buf`, returning 0 at the end of the object.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, FsError> {
        if buf.is_empty() {
            return Ok(0);
        }

        if self.closed {
            return Err(FsError::UnsupportedOperation("read on closed file"));
        }

        if let Some(buffered) = self.buffer.as_mut() {
            let available = buffered.remaining();
            let n = buf.len().min(available.len());
            buf[..n].copy_from_slice(&available[..n]);
            buffered.pos += n as u64;
            return Ok(n);
        }

        if self.pending.is_empty() {
            match self.next_body_chunk().await? {
                Some(chunk) => self.pending = chunk,
                None => return Ok(0),
            }
        }

        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.consumed.extend_from_slice(&self.pending[..n]);
        self.pending.advance(n);
        Ok(n)
    }

    /// Move the read position.
    ///
    /// The first call buffers the full body, including bytes already returned
    /// by earlier reads, and fails with [`FsError::ContentLengthMismatch`] if
    /// the store delivered a different number of bytes than it declared.
    pub async fn seek(&mut self, pos: SeekFrom) -> Result<u64, FsError> {
        if self.closed {
            return Err(FsError::UnsupportedOperation("seek on closed file"));
        }

        let mut buffered = match self.buffer.take() {
            Some(buffered) => buffered,
            None => self.drain_body().await?,
        };
        let result = buffered.seek(pos);
        self.buffer = Some(buffered);
        result
    }

    /// Release the body stream. Safe to call more than once.
    pub fn close(&mut self) {
        self.body = None;
        self.buffer = None;
        self.consumed = BytesMut::new();
        self.pending = Bytes::new();
        self.closed = true;
    }

    /// Consume the reader as a stream of body chunks, optionally capped at
    /// `limit` bytes.
    pub fn into_stream(self, limit: Option<u64>) -> BoxStream<'static, Result<Bytes, FsError>> {
        stream::try_unfold((self, limit), |(mut reader, remaining)| async move {
            if remaining == Some(0) {
                return Ok(None);
            }

            let Some(mut chunk) = reader.next_chunk().await? else {
                return Ok(None);
            };

            let remaining = remaining.map(|left| {
                if chunk.len() as u64 > left {
                    chunk.truncate(left as usize);
                }
                left - chunk.len() as u64
            });

            Ok(Some((chunk, (reader, remaining))))
        })
        .boxed()
    }

    async fn next_chunk(&mut self) -> Result<Option<Bytes>, FsError> {
        if self.closed {
            return Err(FsError::UnsupportedOperation("read on closed file"));
        }

        if let Some(buffered) = self.buffer.as_mut() {
            let chunk = buffered.remaining();
            if chunk.is_empty() {
                return Ok(None);
            }
            buffered.pos += chunk.len() as u64;
            return Ok(Some(chunk));
        }

        if !self.pending.is_empty() {
            return Ok(Some(std::mem::take(&mut self.pending)));
        }

        self.next_body_chunk().await
    }

    /// Pull the next non-empty chunk from the body, checking the total against
    /// the declared size.
    async fn next_body_chunk(&mut self) -> Result<Option<Bytes>, FsError> {
        // An exhausted body stays short if it ended early or failed
        let Some(body) = self.body.as_mut() else {
            if self.received != self.metadata.size {
                return Err(self.length_mismatch());
            }
            return Ok(None);
        };

        loop {
            match body.next().await {
                Some(Ok(chunk)) if chunk.is_empty() => continue,
                Some(Ok(chunk)) => {
                    self.received += chunk.len() as u64;
                    if self.received > self.metadata.size {
                        self.body = None;
                        return Err(self.length_mismatch());
                    }
                    return Ok(Some(chunk));
                }
                Some(Err(e)) => {
                    self.body = None;
                    return Err(e.into());
                }
                None => {
                    self.body = None;
                    if self.received != self.metadata.size {
                        return Err(self.length_mismatch());
                    }
                    return Ok(None);
                }
            }
        }
    }

    /// Buffer the whole object; the position stays where streaming reads left it
    async fn drain_body(&mut self) -> Result<Buffered, FsError> {
        let mut data = std::mem::take(&mut self.consumed);
        let pos = data.len() as u64;
        data.reserve(usize::try_from(self.metadata.size.saturating_sub(pos)).unwrap_or(0));

        data.extend_from_slice(&std::mem::take(&mut self.pending));
        while let Some(chunk) = self.next_body_chunk().await? {
            data.extend_from_slice(&chunk);
        }

        if data.len() as u64 != self.metadata.size {
            return Err(self.length_mismatch());
        }

        tracing::debug!(
            "Buffered {} bytes of {} for seeking",
            data.len(),
            self.metadata.key
        );

        Ok(Buffered {
            data: data.freeze(),
            pos,
        })
    }

    fn length_mismatch(&self) -> FsError {
        tracing::error!(
            "Content length mismatch for {}: declared {} bytes, received {}",
            self.metadata.key,
            self.metadata.size,
            self.received
        );
        FsError::ContentLengthMismatch {
            expected: self.metadata.size,
            actual: self.received,
        }
    }
}

impl std::fmt::Debug for ObjectReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectReader")
            .field("key", &self.metadata.key)
            .field("size", &self.metadata.size)
            .field("buffered", &self.buffer.is_some())
            .field("closed", &self.closed)
            .finish()
    }
}
