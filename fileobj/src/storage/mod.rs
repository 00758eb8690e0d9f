//! Storage backends (byte-addressable persistent objects)
//!
//! Submodules:
//! - `localfs`: objects are regular files below a root directory
//! - `memory`: objects live in a shared in-process map, used by tests
//!
//! A backend owns the open-time semantics of a mode: existence checks,
//! creation and truncation. Once an object is open, it only offers
//! positional reads and writes; cursors and mode checks belong to
//! [`FileHandle`](crate::handle::FileHandle).

pub mod localfs;
pub mod memory;

use std::io;
use std::path::Path;

use crate::error::Result;
use crate::mode::OpenMode;

pub use localfs::LocalFsStorage;
pub use memory::InMemoryStorage;

/// Opens named objects.
pub trait Storage {
    type Object: StorageObject;

    /// Opens `path` according to `mode`.
    ///
    /// Fails with `NotFound` when the mode requires an existing object and
    /// there is none, and with `PermissionDenied` when the backend refuses
    /// access. Truncating modes discard prior content before returning.
    fn open(&self, path: &Path, mode: OpenMode) -> Result<Self::Object>;
}

/// An open object with positional byte I/O.
pub trait StorageObject {
    /// Reads into `buf` starting at `offset`. Returns 0 at or past the end.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Writes all of `data` at `offset`, zero-filling any gap past the end.
    fn write_at(&mut self, offset: u64, data: &[u8]) -> io::Result<()>;

    /// Current length in bytes.
    fn len(&self) -> io::Result<u64>;

    fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Pushes pending data down to persistent storage.
    fn flush(&mut self) -> io::Result<()>;
}
