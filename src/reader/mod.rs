//! Chunked media file reader.
//!
//! Two shapes of reading over the same open file:
//!
//! - [`read_by_chunks`]: a lazy, ordered, single-consumer sequence of chunks
//!   starting at a byte offset. The producer task publishes on a channel of
//!   capacity 1, so it never runs more than one chunk ahead of the socket.
//! - [`read_all`]: the whole file as one chunk, assembled by a small pool of
//!   workers doing positional reads concurrently.
//!
//! Both use positional reads on a shared handle, so readers never contend on
//! a file cursor.

mod chunk;

pub use chunk::Chunk;

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Capacity of the chunk channel handed to the consumer.
const CHUNKS_CHANNEL_CAPACITY: usize = 1;

/// Upper bound on concurrent workers in [`read_all`].
const READ_ALL_WORKERS: u64 = 5;

/// An open media file that supports positional reads.
///
/// Cloning is cheap and shares the handle; the file is closed when the last
/// clone is dropped.
#[derive(Debug, Clone)]
pub struct MediaFile {
    file: Arc<File>,
    path: PathBuf,
    size: u64,
}

impl MediaFile {
    /// Open a file for reading and record its size.
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let open_path = path.clone();
        let (file, size) = tokio::task::spawn_blocking(move || {
            let file = File::open(&open_path)?;
            let size = file.metadata()?.len();
            Ok::<_, io::Error>((file, size))
        })
        .await
        .map_err(io::Error::other)??;

        Ok(Self {
            file: Arc::new(file),
            path,
            size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the file when it was opened.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read up to `len` bytes at `offset` on the blocking pool.
    ///
    /// The returned buffer is truncated to the bytes actually read, which is
    /// shorter than `len` only when the file ends first.
    pub async fn read_at(&self, offset: u64, len: usize) -> io::Result<Bytes> {
        let file = Arc::clone(&self.file);
        tokio::task::spawn_blocking(move || {
            let mut buf = vec![0u8; len];
            let read = read_full_at(&file, &mut buf, offset)?;
            buf.truncate(read);
            Ok(Bytes::from(buf))
        })
        .await
        .map_err(io::Error::other)?
    }
}

/// Fill `buf` from `offset`, stopping early only at end of file.
fn read_full_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match positional_read(file, &mut buf[filled..], offset + filled as u64) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(unix)]
fn positional_read(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(windows)]
fn positional_read(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}

/// Reader configuration shared by every stream of the process.
///
/// Bundles the chunk size with the shutdown token so that everything which
/// reasons about chunk boundaries (the seek math included) sees the same
/// chunk size the reader uses.
#[derive(Debug, Clone)]
pub struct FileReader {
    chunk_size: usize,
    shutdown: CancellationToken,
}

impl FileReader {
    pub fn new(chunk_size: usize, shutdown: CancellationToken) -> Self {
        debug_assert!(chunk_size > 0, "chunk size must be positive");
        Self {
            chunk_size: chunk_size.max(1),
            shutdown,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// See [`read_by_chunks`].
    pub fn read_by_chunks(&self, file: &MediaFile, offset: u64) -> mpsc::Receiver<Chunk> {
        read_by_chunks(file, offset, self.chunk_size, self.shutdown.clone())
    }

    /// See [`read_all`].
    pub async fn read_all(&self, file: &MediaFile) -> Chunk {
        read_all(file, self.chunk_size).await
    }
}

/// Stream `file` in chunks of `chunk_size` bytes starting at `offset`.
///
/// The sequence is finite and not restartable. It ends when the file is
/// exhausted, when `shutdown` is cancelled, when the receiver is dropped, or
/// after a read error. The channel closes the same way in every case; a read
/// error is only visible in the logs.
pub fn read_by_chunks(
    file: &MediaFile,
    offset: u64,
    chunk_size: usize,
    shutdown: CancellationToken,
) -> mpsc::Receiver<Chunk> {
    let (tx, rx) = mpsc::channel(CHUNKS_CHANNEL_CAPACITY);
    let file = file.clone();
    let chunk_size = chunk_size.max(1) as u64;

    tokio::spawn(async move {
        tracing::debug!(path = %file.path().display(), offset, "Reading by chunks started");

        let size = file.size();
        let mut offset = offset;

        loop {
            let remaining = size.saturating_sub(offset);
            if remaining == 0 {
                tracing::debug!(path = %file.path().display(), "Reading by chunks finished");
                return;
            }
            let len = chunk_size.min(remaining) as usize;

            let data = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::info!(path = %file.path().display(), offset, "Reading by chunks interrupted");
                    return;
                }
                read = file.read_at(offset, len) => read,
            };

            let data = match data {
                Ok(data) if data.is_empty() => {
                    tracing::error!(
                        path = %file.path().display(),
                        offset,
                        "File ended before its recorded size"
                    );
                    return;
                }
                Ok(data) => data,
                Err(e) => {
                    tracing::error!(
                        path = %file.path().display(),
                        offset,
                        error = %e,
                        "Reading by chunks failed"
                    );
                    return;
                }
            };
            offset += data.len() as u64;

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::info!(path = %file.path().display(), offset, "Reading by chunks interrupted");
                    return;
                }
                sent = tx.send(Chunk::new(data)) => {
                    if sent.is_err() {
                        tracing::debug!(path = %file.path().display(), "Chunk consumer went away");
                        return;
                    }
                }
            }
        }
    });

    rx
}

struct ReadTask {
    index: u64,
    offset: u64,
    len: usize,
}

/// Read the whole of `file` into a single chunk.
///
/// The file is split into `ceil(size / chunk_size)` ranges and read by at
/// most five workers. If any range fails, the returned chunk carries the
/// first error and only the contiguous prefix that was read.
pub async fn read_all(file: &MediaFile, chunk_size: usize) -> Chunk {
    let size = file.size();
    let chunk_size = chunk_size.max(1) as u64;
    let chunks = size.div_ceil(chunk_size);
    if chunks == 0 {
        return Chunk::new(Bytes::new());
    }
    let workers = READ_ALL_WORKERS.min(chunks) as usize;

    tracing::debug!(path = %file.path().display(), chunks, workers, "Reading whole file");

    let (task_tx, task_rx) = flume::bounded::<ReadTask>(workers);
    let parts: Arc<Mutex<HashMap<u64, Bytes>>> =
        Arc::new(Mutex::new(HashMap::with_capacity(chunks as usize)));

    let mut set: JoinSet<io::Result<()>> = JoinSet::new();

    set.spawn(async move {
        for index in 0..chunks {
            let offset = index * chunk_size;
            let len = chunk_size.min(size - offset) as usize;
            if task_tx.send_async(ReadTask { index, offset, len }).await.is_err() {
                break;
            }
        }
        Ok(())
    });

    for _ in 0..workers {
        let task_rx = task_rx.clone();
        let parts = Arc::clone(&parts);
        let file = file.clone();
        set.spawn(async move {
            while let Ok(task) = task_rx.recv_async().await {
                let data = file.read_at(task.offset, task.len).await?;
                if data.len() != task.len {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("short read at offset {}", task.offset),
                    ));
                }
                parts.lock().insert(task.index, data);
            }
            Ok(())
        });
    }
    drop(task_rx);

    let mut error = None;
    while let Some(joined) = set.join_next().await {
        let result = joined.unwrap_or_else(|e| Err(io::Error::other(e)));
        if let Err(e) = result {
            tracing::error!(path = %file.path().display(), error = %e, "Reading whole file failed");
            error.get_or_insert(e);
        }
    }

    let parts = std::mem::take(&mut *parts.lock());
    let mut buf = BytesMut::with_capacity(size as usize);
    for index in 0..chunks {
        match parts.get(&index) {
            Some(part) => buf.extend_from_slice(part),
            None => break,
        }
    }

    let chunk = Chunk::new(buf.freeze());
    match error {
        Some(e) => chunk.with_error(e),
        None => {
            tracing::debug!(path = %file.path().display(), bytes = chunk.len(), "Whole file read");
            chunk
        }
    }
}
