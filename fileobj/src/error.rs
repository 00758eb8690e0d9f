use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FileError>;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("no such file: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("permission denied: {}", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("file not open for writing")]
    ReadOnly,

    #[error("file not open for reading")]
    WriteOnly,

    #[error("I/O operation on closed file")]
    Closed,

    #[error("invalid mode: {0:?}")]
    InvalidMode(String),

    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("invalid UTF-8 at byte offset {offset}")]
    InvalidUtf8 { offset: u64 },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl FileError {
    /// Translates a backend error for `path` into the typed open-time errors.
    pub fn from_io(err: io::Error, path: impl Into<PathBuf>) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => FileError::NotFound { path: path.into() },
            io::ErrorKind::PermissionDenied => FileError::PermissionDenied { path: path.into() },
            _ => FileError::Io(err),
        }
    }
}

impl From<FileError> for io::Error {
    fn from(err: FileError) -> Self {
        let kind = match err {
            FileError::Io(inner) => return inner,
            FileError::NotFound { .. } => io::ErrorKind::NotFound,
            FileError::PermissionDenied { .. } | FileError::ReadOnly | FileError::WriteOnly => {
                io::ErrorKind::PermissionDenied
            }
            FileError::Closed | FileError::Unsupported(_) => io::ErrorKind::Unsupported,
            FileError::InvalidMode(_) | FileError::InvalidArgument(_) => {
                io::ErrorKind::InvalidInput
            }
            FileError::InvalidUtf8 { .. } => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, err)
    }
}
