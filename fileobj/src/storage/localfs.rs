//! Local directory backend: each object is a regular file under `root`.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{FileError, Result};
use crate::mode::{ModeFlags, OpenMode};
use crate::storage::{Storage, StorageObject};

#[derive(Clone, Debug)]
pub struct LocalFsStorage {
    root: PathBuf,
}

impl LocalFsStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl Storage for LocalFsStorage {
    type Object = LocalFile;

    fn open(&self, path: &Path, mode: OpenMode) -> Result<LocalFile> {
        let flags = mode.flags();
        let full = self.path_for(path);
        let mut options = OpenOptions::new();
        options
            .read(flags.contains(ModeFlags::READ))
            .write(flags.contains(ModeFlags::WRITE) && !flags.contains(ModeFlags::APPEND))
            .append(flags.contains(ModeFlags::APPEND))
            .create(flags.contains(ModeFlags::CREATE))
            .truncate(flags.contains(ModeFlags::TRUNCATE));

        let file = options
            .open(&full)
            .map_err(|e| FileError::from_io(e, path))?;
        tracing::trace!("opened {} with {:?}", full.display(), flags);
        Ok(LocalFile {
            file,
            sync: flags.contains(ModeFlags::WRITE),
        })
    }
}

pub struct LocalFile {
    file: File,
    /// Only handles that can write have anything to sync.
    sync: bool,
}

impl StorageObject for LocalFile {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.file.seek(SeekFrom::Start(offset))?;
        let mut filled = 0;
        while filled < buf.len() {
            match self.file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    // O_APPEND files ignore the seek and land at the end, which is where the
    // handle asks for anyway.
    fn write_at(&mut self, offset: u64, data: &[u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(data)
    }

    fn len(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.sync {
            self.file.sync_data()?;
        }
        Ok(())
    }
}
