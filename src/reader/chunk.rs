//! The unit of data moving from the file reader to the socket.

use bytes::Bytes;
use std::io;

/// A slice of file bytes plus the number of bytes actually read.
///
/// A chunk is immutable once handed to a consumer; ownership moves with the
/// channel send. `len()` never exceeds the length of the underlying buffer.
#[derive(Debug)]
pub struct Chunk {
    length: usize,
    data: Bytes,
    error: Option<io::Error>,
}

impl Chunk {
    /// Create a chunk holding `data` in full.
    pub fn new(data: Bytes) -> Self {
        Self {
            length: data.len(),
            data,
            error: None,
        }
    }

    /// Attach the error that interrupted producing this chunk.
    pub fn with_error(mut self, error: io::Error) -> Self {
        self.error = Some(error);
        self
    }

    /// Number of bytes read into this chunk.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn into_data(self) -> Bytes {
        self.data
    }

    pub fn error(&self) -> Option<&io::Error> {
        self.error.as_ref()
    }

    /// Detach the error, leaving the chunk clean.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }
}
