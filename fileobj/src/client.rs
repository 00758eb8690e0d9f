//! Client API: path-level helpers over a storage backend.
//!
//! Wraps the common open/use/close patterns so callers never leave a handle
//! open by accident:
//! - `with_open`: scoped access, the handle is closed on every exit path
//! - `copy_lines` / `copy_chunked`: text and binary copies between paths
//! - `read_range` / `truncate`: one-shot helpers

use std::path::Path;

use crate::error::{FileError, Result};
use crate::handle::FileHandle;
use crate::storage::{LocalFsStorage, Storage};

/// Chunk size used when none is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Client over a generic storage backend.
pub struct Client<S: Storage> {
    storage: S,
}

impl<S: Storage> Client<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn open<P: AsRef<Path>>(&self, path: P, mode: &str) -> Result<FileHandle<S::Object>> {
        FileHandle::open(&self.storage, path, mode)
    }

    /// Opens `path`, runs `f` on the handle and closes it afterwards, whether
    /// `f` succeeded, failed or panicked. An error from `f` wins over an error
    /// from the close.
    pub fn with_open<P, T, E, F>(&self, path: P, mode: &str, f: F) -> std::result::Result<T, E>
    where
        P: AsRef<Path>,
        E: From<FileError>,
        F: FnOnce(&mut FileHandle<S::Object>) -> std::result::Result<T, E>,
    {
        let mut handle = self.open(path, mode)?;
        let out = f(&mut handle);
        let closed = handle.close();
        let value = out?;
        closed?;
        Ok(value)
    }

    /// Opens `path` for writing and closes it at once, leaving it empty.
    pub fn truncate<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.open(path, "w")?.close()
    }

    /// Reads up to `len` bytes starting at `offset`.
    pub fn read_range<P: AsRef<Path>>(&self, path: P, offset: u64, len: usize) -> Result<Vec<u8>> {
        self.with_open(path, "rb", |f| {
            f.seek(offset)?;
            f.read(len)
        })
    }

    /// Copies a text file line by line. Returns the number of lines copied.
    pub fn copy_lines<P, Q>(&self, src: P, dst: Q) -> Result<usize>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        self.with_open(src, "r", |rf| -> Result<usize> {
            self.with_open(&dst, "w", |wf| {
                let mut count = 0;
                for line in rf.lines() {
                    wf.write_str(&line?)?;
                    count += 1;
                }
                Ok(count)
            })
        })
    }

    /// Copies a file in fixed-size chunks. Returns the number of bytes copied.
    pub fn copy_chunked<P, Q>(&self, src: P, dst: Q, chunk_size: usize) -> Result<u64>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        if chunk_size == 0 {
            return Err(FileError::InvalidArgument(
                "chunk size must be at least 1".into(),
            ));
        }
        let (src, dst) = (src.as_ref(), dst.as_ref());
        let copied = self.with_open(src, "rb", |rf| -> Result<u64> {
            self.with_open(dst, "wb", |wf| {
                let mut copied = 0u64;
                loop {
                    let chunk = rf.read(chunk_size)?;
                    if chunk.is_empty() {
                        break;
                    }
                    copied += wf.write(&chunk)? as u64;
                }
                Ok(copied)
            })
        })?;
        tracing::debug!(
            "copied {} bytes from {} to {} in chunks of {}",
            copied,
            src.display(),
            dst.display(),
            chunk_size
        );
        Ok(copied)
    }
}

// ============== Convenience constructor (local directory backend) ==============

pub type LocalClient = Client<LocalFsStorage>;

impl LocalClient {
    pub fn new_local<P: AsRef<Path>>(root: P) -> Self {
        Client::new(LocalFsStorage::new(root))
    }
}
