// Library crate for fileobj: mode-checked file handles over pluggable storage,
// re-exported for the CLI binary and for integration tests.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod handle;
pub mod mode;
pub mod storage;

pub use client::{Client, LocalClient};
pub use error::{FileError, Result};
pub use handle::{FileHandle, Lines};
pub use mode::{AccessMode, ModeFlags, OpenMode};
pub use storage::{InMemoryStorage, LocalFsStorage, Storage, StorageObject};
