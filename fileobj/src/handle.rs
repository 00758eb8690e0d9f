//! File handles: a cursor and an enforced access mode over a storage object.
//!
//! A [`FileHandle`] captures its [`OpenMode`] at open time. The mode string
//! reported by [`FileHandle::mode`] can be reassigned afterwards, but that
//! only changes what is reported; reads and writes are always checked
//! against the captured mode.
//!
//! The cursor is a byte offset in both text and binary mode. Text reads
//! count decoded characters and advance the cursor by their encoded length.
//!
//! Dropping a handle closes it, so a handle bound to a scope is released on
//! every way out of that scope, unwinding included.

use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{FileError, Result};
use crate::mode::{ModeFlags, OpenMode};
use crate::storage::{Storage, StorageObject};

/// Bytes fetched per read while scanning for a newline.
const LINE_CHUNK: usize = 512;

/// Longest UTF-8 encoding of a single character.
const MAX_CHAR_LEN: usize = 4;

pub struct FileHandle<O: StorageObject> {
    name: PathBuf,
    open_mode: OpenMode,
    reported_mode: String,
    cursor: u64,
    object: Option<O>,
}

impl<O: StorageObject> FileHandle<O> {
    /// Opens `path` on `storage` with a mode token such as `"r"` or `"wb"`.
    pub fn open<S, P>(storage: &S, path: P, mode: &str) -> Result<Self>
    where
        S: Storage<Object = O>,
        P: AsRef<Path>,
    {
        Self::open_with(storage, path, mode.parse()?)
    }

    pub fn open_with<S, P>(storage: &S, path: P, mode: OpenMode) -> Result<Self>
    where
        S: Storage<Object = O>,
        P: AsRef<Path>,
    {
        let name = path.as_ref().to_path_buf();
        let object = storage.open(&name, mode)?;
        let cursor = if mode.flags().contains(ModeFlags::APPEND) {
            object.len()?
        } else {
            0
        };
        tracing::debug!("open {} mode={} cursor={}", name.display(), mode, cursor);
        Ok(Self {
            name,
            open_mode: mode,
            reported_mode: mode.to_string(),
            cursor,
            object: Some(object),
        })
    }

    pub fn name(&self) -> &Path {
        &self.name
    }

    /// The reported mode string. Starts as the canonical open token.
    pub fn mode(&self) -> &str {
        &self.reported_mode
    }

    /// Replaces the reported mode string. Access checks are unaffected.
    pub fn set_mode(&mut self, mode: impl Into<String>) {
        self.reported_mode = mode.into();
    }

    /// The mode captured at open and enforced on every operation.
    pub fn open_mode(&self) -> OpenMode {
        self.open_mode
    }

    pub fn closed(&self) -> bool {
        self.object.is_none()
    }

    pub fn tell(&self) -> Result<u64> {
        self.object.as_ref().ok_or(FileError::Closed)?;
        Ok(self.cursor)
    }

    /// Current length of the underlying object.
    pub fn size(&self) -> Result<u64> {
        let object = self.object.as_ref().ok_or(FileError::Closed)?;
        Ok(object.len()?)
    }

    /// Moves the cursor to an absolute byte offset. Offsets past the end are
    /// allowed: reads there return nothing and writes leave a zero-filled gap.
    pub fn seek(&mut self, offset: u64) -> Result<u64> {
        self.object.as_ref().ok_or(FileError::Closed)?;
        self.cursor = offset;
        Ok(offset)
    }

    fn readable(&mut self) -> Result<&mut O> {
        let object = self.object.as_mut().ok_or(FileError::Closed)?;
        if !self.open_mode.readable() {
            return Err(FileError::WriteOnly);
        }
        Ok(object)
    }

    fn writable(&mut self) -> Result<&mut O> {
        let object = self.object.as_mut().ok_or(FileError::Closed)?;
        if !self.open_mode.writable() {
            return Err(FileError::ReadOnly);
        }
        Ok(object)
    }

    fn text_only(&self, op: &'static str) -> Result<()> {
        if self.object.is_none() {
            return Err(FileError::Closed);
        }
        if self.open_mode.binary {
            return Err(FileError::Unsupported(op));
        }
        Ok(())
    }

    fn remaining(&mut self) -> Result<u64> {
        let cursor = self.cursor;
        let object = self.readable()?;
        Ok(object.len()?.saturating_sub(cursor))
    }

    /// Fills as much of `buf` as the data after the cursor allows.
    fn read_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        let offset = self.cursor;
        let object = self.readable()?;
        let mut filled = 0;
        while filled < buf.len() {
            let n = object.read_at(offset + filled as u64, &mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        self.cursor += filled as u64;
        tracing::trace!("read {} bytes at {} from {}", filled, offset, self.name.display());
        Ok(filled)
    }

    /// Reads up to `n` bytes. Fewer bytes, possibly none, come back when the
    /// end of data is reached first; that is not an error.
    pub fn read(&mut self, n: usize) -> Result<Vec<u8>> {
        let want = self.remaining()?.min(n as u64) as usize;
        let mut buf = vec![0u8; want];
        let got = self.read_into(&mut buf)?;
        buf.truncate(got);
        Ok(buf)
    }

    /// Reads up to `n` characters in text mode.
    pub fn read_text(&mut self, n: usize) -> Result<String> {
        self.text_only("read_text on a binary handle")?;
        let start = self.cursor;
        let want = self.remaining()?.min(n.saturating_mul(MAX_CHAR_LEN) as u64) as usize;
        let mut buf = vec![0u8; want];
        let got = self.read_into(&mut buf)?;
        buf.truncate(got);

        let text = match decode_chars(&buf, n) {
            Ok(text) => text,
            Err(valid) => {
                self.cursor = start;
                return Err(FileError::InvalidUtf8 {
                    offset: start + valid as u64,
                });
            }
        };
        self.cursor = start + text.len() as u64;
        Ok(text.to_string())
    }

    /// Reads through the next `\n` (inclusive), or to the end of data.
    /// Returns an empty vector at the end of data.
    pub fn read_line_bytes(&mut self) -> Result<Vec<u8>> {
        let mut offset = self.cursor;
        let object = self.readable()?;
        let mut line = Vec::new();
        let mut chunk = [0u8; LINE_CHUNK];
        loop {
            let n = object.read_at(offset, &mut chunk)?;
            if n == 0 {
                break;
            }
            if let Some(pos) = chunk[..n].iter().position(|&b| b == b'\n') {
                line.extend_from_slice(&chunk[..=pos]);
                offset += pos as u64 + 1;
                break;
            }
            line.extend_from_slice(&chunk[..n]);
            offset += n as u64;
        }
        self.cursor = offset;
        Ok(line)
    }

    /// Text-mode [`read_line_bytes`](Self::read_line_bytes). An empty string
    /// marks the end of data; every other line keeps its trailing `\n`
    /// except possibly the last.
    pub fn read_line(&mut self) -> Result<String> {
        self.text_only("read_line on a binary handle")?;
        let start = self.cursor;
        let bytes = self.read_line_bytes()?;
        String::from_utf8(bytes).map_err(|e| {
            self.cursor = start;
            FileError::InvalidUtf8 {
                offset: start + e.utf8_error().valid_up_to() as u64,
            }
        })
    }

    /// Lazily yields the remaining lines. The iterator consumes the handle's
    /// content: once exhausted, a second call yields nothing unless the
    /// cursor is moved back with [`seek`](Self::seek).
    pub fn lines(&mut self) -> Lines<'_, O> {
        Lines {
            handle: self,
            done: false,
        }
    }

    /// Collects the remaining lines.
    pub fn read_lines(&mut self) -> Result<Vec<String>> {
        self.lines().collect()
    }

    pub fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let remaining = usize::try_from(self.remaining()?)
            .map_err(|_| FileError::InvalidArgument("file too large to buffer".into()))?;
        self.read(remaining)
    }

    pub fn read_to_string(&mut self) -> Result<String> {
        self.text_only("read_to_string on a binary handle")?;
        let start = self.cursor;
        let bytes = self.read_to_end()?;
        String::from_utf8(bytes).map_err(|e| {
            self.cursor = start;
            FileError::InvalidUtf8 {
                offset: start + e.utf8_error().valid_up_to() as u64,
            }
        })
    }

    /// Writes `data` at the cursor, overwriting existing bytes and extending
    /// the object as needed. Append modes always write at the end of data.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        let append = self.open_mode.flags().contains(ModeFlags::APPEND);
        let cursor = self.cursor;
        let object = self.writable()?;
        let offset = if append { object.len()? } else { cursor };
        let end = offset.checked_add(data.len() as u64).ok_or_else(|| {
            FileError::InvalidArgument(format!("write of {} bytes at offset {offset}", data.len()))
        })?;
        object.write_at(offset, data)?;
        self.cursor = end;
        tracing::trace!("wrote {} bytes at {} to {}", data.len(), offset, self.name.display());
        Ok(data.len())
    }

    /// Text-mode write. Returns the number of characters written.
    pub fn write_str(&mut self, text: &str) -> Result<usize> {
        self.text_only("write_str on a binary handle")?;
        self.write(text.as_bytes())?;
        Ok(text.chars().count())
    }

    pub fn flush(&mut self) -> Result<()> {
        let object = self.object.as_mut().ok_or(FileError::Closed)?;
        Ok(object.flush()?)
    }

    /// Flushes and releases the storage object. Closing an already closed
    /// handle does nothing. The object is released even if the flush fails.
    pub fn close(&mut self) -> Result<()> {
        let Some(mut object) = self.object.take() else {
            return Ok(());
        };
        tracing::debug!("close {}", self.name.display());
        object.flush()?;
        Ok(())
    }
}

impl<O: StorageObject> Drop for FileHandle<O> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("failed to close {}: {e}", self.name.display());
        }
    }
}

/// Decodes at most `max_chars` characters from the front of `bytes`.
///
/// Returning fewer characters than asked for must mean the data ran out, so
/// any decode failure before `max_chars` characters are available is an
/// error carrying the length of the valid prefix. A character cut off at the
/// end of `bytes` only happens once `max_chars` characters already decoded.
fn decode_chars(bytes: &[u8], max_chars: usize) -> std::result::Result<&str, usize> {
    let (valid, complete) = match std::str::from_utf8(bytes) {
        Ok(text) => (text, true),
        Err(e) => (
            std::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
            false,
        ),
    };
    match valid.char_indices().nth(max_chars) {
        Some((idx, _)) => Ok(&valid[..idx]),
        None if complete || valid.chars().count() == max_chars => Ok(valid),
        None => Err(valid.len()),
    }
}

/// Iterator returned by [`FileHandle::lines`].
pub struct Lines<'a, O: StorageObject> {
    handle: &'a mut FileHandle<O>,
    done: bool,
}

impl<O: StorageObject> Iterator for Lines<'_, O> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.handle.read_line() {
            Ok(line) if line.is_empty() => {
                self.done = true;
                None
            }
            Ok(line) => Some(Ok(line)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<O: StorageObject> io::Read for FileHandle<O> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_into(buf)?)
    }
}

impl<O: StorageObject> io::Write for FileHandle<O> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(FileHandle::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(FileHandle::flush(self)?)
    }
}

impl<O: StorageObject> io::Seek for FileHandle<O> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.tell()?.checked_add_signed(delta),
            SeekFrom::End(delta) => self.size()?.checked_add_signed(delta),
        };
        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek to a negative offset")
        })?;
        Ok(FileHandle::seek(self, target)?)
    }
}
