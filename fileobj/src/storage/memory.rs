//! In-process backend: objects are byte vectors in a shared map.
//!
//! Clones of an [`InMemoryStorage`] share the same map, so a test can keep
//! one clone to inspect contents while handles write through another. Paths
//! can be marked as denied to exercise permission failures, and the number
//! of live objects is tracked so release on every exit path is observable.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{FileError, Result};
use crate::mode::{ModeFlags, OpenMode};
use crate::storage::{Storage, StorageObject};

#[derive(Default)]
struct Inner {
    files: HashMap<PathBuf, Vec<u8>>,
    denied: HashSet<PathBuf>,
    open_objects: usize,
}

#[derive(Clone, Default)]
pub struct InMemoryStorage {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves the map itself consistent.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replaces the content stored at `path`.
    pub fn insert(&self, path: impl Into<PathBuf>, data: impl Into<Vec<u8>>) {
        self.lock().files.insert(path.into(), data.into());
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.lock().files.get(path.as_ref()).cloned()
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.lock().files.contains_key(path.as_ref())
    }

    /// Makes every later open of `path` fail with `PermissionDenied`.
    pub fn deny(&self, path: impl Into<PathBuf>) {
        self.lock().denied.insert(path.into());
    }

    /// Number of objects opened and not yet dropped.
    pub fn open_objects(&self) -> usize {
        self.lock().open_objects
    }
}

impl Storage for InMemoryStorage {
    type Object = MemoryObject;

    fn open(&self, path: &Path, mode: OpenMode) -> Result<MemoryObject> {
        let flags = mode.flags();
        let mut guard = self.lock();
        let inner = &mut *guard;
        if inner.denied.contains(path) {
            return Err(FileError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        match inner.files.get_mut(path) {
            Some(data) => {
                if flags.contains(ModeFlags::TRUNCATE) {
                    data.clear();
                }
            }
            None if flags.contains(ModeFlags::CREATE) => {
                inner.files.insert(path.to_path_buf(), Vec::new());
            }
            None => {
                return Err(FileError::NotFound {
                    path: path.to_path_buf(),
                });
            }
        }
        inner.open_objects += 1;
        Ok(MemoryObject {
            storage: self.clone(),
            path: path.to_path_buf(),
        })
    }
}

pub struct MemoryObject {
    storage: InMemoryStorage,
    path: PathBuf,
}

impl MemoryObject {
    fn with_data<T>(&self, f: impl FnOnce(&mut Vec<u8>) -> T) -> io::Result<T> {
        let mut inner = self.storage.lock();
        let data = inner
            .files
            .get_mut(&self.path)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        Ok(f(data))
    }
}

impl StorageObject for MemoryObject {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.with_data(|data| {
            let len = data.len() as u64;
            if offset >= len {
                return 0;
            }
            let start = offset as usize;
            let n = buf.len().min(data.len() - start);
            buf[..n].copy_from_slice(&data[start..start + n]);
            n
        })
    }

    fn write_at(&mut self, offset: u64, payload: &[u8]) -> io::Result<()> {
        let too_large = || io::Error::new(io::ErrorKind::InvalidInput, "offset too large");
        let start = usize::try_from(offset).map_err(|_| too_large())?;
        let end = start
            .checked_add(payload.len())
            .filter(|&end| end <= isize::MAX as usize)
            .ok_or_else(too_large)?;
        self.with_data(|data| {
            if data.len() < end {
                data.resize(end, 0);
            }
            data[start..end].copy_from_slice(payload);
        })
    }

    fn len(&self) -> io::Result<u64> {
        self.with_data(|data| data.len() as u64)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for MemoryObject {
    fn drop(&mut self) {
        let mut inner = self.storage.lock();
        inner.open_objects = inner.open_objects.saturating_sub(1);
    }
}
