//! Access modes accepted by [`open`](crate::handle::FileHandle::open).
//!
//! A mode is parsed from the classic tokens (`r`, `w`, `a`, `r+`, `w+`, `a+`,
//! with an optional `b` for binary) and resolved once into [`ModeFlags`].
//! The flags are what the storage backend and the handle enforce.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use crate::error::FileError;

bitflags! {
    /// Capabilities and open-time behavior derived from an access mode.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ModeFlags: u8 {
        /// The handle may be read from.
        const READ = 1;
        /// The handle may be written to.
        const WRITE = 1 << 1;
        /// Create the object if it does not exist.
        const CREATE = 1 << 2;
        /// Discard existing content at open time.
        const TRUNCATE = 1 << 3;
        /// Every write lands at the current end of data.
        const APPEND = 1 << 4;
        /// Opening fails when the object does not exist.
        const MUST_EXIST = 1 << 5;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessMode {
    /// `r`
    Read,
    /// `w`
    Write,
    /// `a`
    Append,
    /// `r+`
    ReadWrite,
    /// `w+`: read and write, truncating at open.
    WriteRead,
    /// `a+`: read anywhere, write at the end.
    AppendRead,
}

impl AccessMode {
    pub fn flags(self) -> ModeFlags {
        match self {
            AccessMode::Read => ModeFlags::READ | ModeFlags::MUST_EXIST,
            AccessMode::Write => ModeFlags::WRITE | ModeFlags::CREATE | ModeFlags::TRUNCATE,
            AccessMode::Append => ModeFlags::WRITE | ModeFlags::CREATE | ModeFlags::APPEND,
            AccessMode::ReadWrite => ModeFlags::READ | ModeFlags::WRITE | ModeFlags::MUST_EXIST,
            AccessMode::WriteRead => {
                ModeFlags::READ | ModeFlags::WRITE | ModeFlags::CREATE | ModeFlags::TRUNCATE
            }
            AccessMode::AppendRead => {
                ModeFlags::READ | ModeFlags::WRITE | ModeFlags::CREATE | ModeFlags::APPEND
            }
        }
    }

    fn token(self) -> &'static str {
        match self {
            AccessMode::Read => "r",
            AccessMode::Write => "w",
            AccessMode::Append => "a",
            AccessMode::ReadWrite => "r+",
            AccessMode::WriteRead => "w+",
            AccessMode::AppendRead => "a+",
        }
    }
}

/// An access mode plus the text/binary switch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenMode {
    pub access: AccessMode,
    pub binary: bool,
}

impl OpenMode {
    pub const fn text(access: AccessMode) -> Self {
        Self {
            access,
            binary: false,
        }
    }

    pub const fn binary(access: AccessMode) -> Self {
        Self {
            access,
            binary: true,
        }
    }

    pub fn flags(&self) -> ModeFlags {
        self.access.flags()
    }

    pub fn readable(&self) -> bool {
        self.flags().contains(ModeFlags::READ)
    }

    pub fn writable(&self) -> bool {
        self.flags().contains(ModeFlags::WRITE)
    }
}

impl FromStr for OpenMode {
    type Err = FileError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let invalid = || FileError::InvalidMode(token.to_string());
        let mut chars = token.chars();
        let base = chars.next().ok_or_else(invalid)?;

        let (mut plus, mut binary, mut text) = (false, false, false);
        for c in chars {
            let seen = match c {
                '+' => &mut plus,
                'b' => &mut binary,
                't' => &mut text,
                _ => return Err(invalid()),
            };
            if *seen {
                return Err(invalid());
            }
            *seen = true;
        }
        if binary && text {
            return Err(invalid());
        }

        let access = match (base, plus) {
            ('r', false) => AccessMode::Read,
            ('w', false) => AccessMode::Write,
            ('a', false) => AccessMode::Append,
            ('r', true) => AccessMode::ReadWrite,
            ('w', true) => AccessMode::WriteRead,
            ('a', true) => AccessMode::AppendRead,
            _ => return Err(invalid()),
        };
        Ok(OpenMode { access, binary })
    }
}

impl TryFrom<&str> for OpenMode {
    type Error = FileError;

    fn try_from(token: &str) -> Result<Self, Self::Error> {
        token.parse()
    }
}

impl From<AccessMode> for OpenMode {
    fn from(access: AccessMode) -> Self {
        OpenMode::text(access)
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = self.access.token();
        if !self.binary {
            return f.write_str(token);
        }
        // binary tokens read as "rb", "wb", "r+b"
        match token.strip_suffix('+') {
            Some(base) => write!(f, "{base}+b"),
            None => write!(f, "{token}b"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_tokens() {
        let cases = [
            ("r", AccessMode::Read, false),
            ("w", AccessMode::Write, false),
            ("a", AccessMode::Append, false),
            ("r+", AccessMode::ReadWrite, false),
            ("w+", AccessMode::WriteRead, false),
            ("a+", AccessMode::AppendRead, false),
            ("rb", AccessMode::Read, true),
            ("wb", AccessMode::Write, true),
            ("rb+", AccessMode::ReadWrite, true),
            ("r+b", AccessMode::ReadWrite, true),
            ("rt", AccessMode::Read, false),
        ];
        for (token, access, binary) in cases {
            let mode: OpenMode = token.parse().unwrap();
            assert_eq!(mode, OpenMode { access, binary }, "token {token}");
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for token in ["", "x", "rw", "r++", "rbb", "rbt", "+r", "R"] {
            assert!(
                matches!(token.parse::<OpenMode>(), Err(FileError::InvalidMode(_))),
                "token {token:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_flags_per_mode() {
        let r = AccessMode::Read.flags();
        assert!(r.contains(ModeFlags::READ | ModeFlags::MUST_EXIST));
        assert!(!r.contains(ModeFlags::WRITE));

        assert!(AccessMode::Write.flags().contains(ModeFlags::TRUNCATE));
        assert!(!AccessMode::Write.flags().contains(ModeFlags::READ));
        assert!(AccessMode::WriteRead.flags().contains(ModeFlags::READ | ModeFlags::TRUNCATE));
        assert!(AccessMode::AppendRead.flags().contains(ModeFlags::READ | ModeFlags::APPEND));
        assert!(!AccessMode::ReadWrite.flags().contains(ModeFlags::TRUNCATE));
        assert!(!AccessMode::ReadWrite.flags().contains(ModeFlags::CREATE));
    }

    #[test]
    fn test_display_is_canonical() {
        for token in ["r", "w", "a", "r+", "w+", "a+", "rb", "wb", "ab", "r+b", "w+b", "a+b"] {
            let mode: OpenMode = token.parse().unwrap();
            assert_eq!(mode.to_string(), token);
        }
        assert_eq!("rb+".parse::<OpenMode>().unwrap().to_string(), "r+b");
    }
}
