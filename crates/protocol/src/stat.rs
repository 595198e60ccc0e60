//! Encoded stat block carried inside attributes records.
//!
//! Sixteen space-separated base-64 integers in a fixed order. The first
//! thirteen are mandatory; `link_fi`, `flags` and `data_stream` may be
//! absent when decoding older records and then default to zero.

use crate::base64::{decode_i64, encode_i64};
use crate::error::ProtocolError;

const MANDATORY_FIELDS: usize = 13;

const S_IFMT: u32 = 0o170_000;
const S_IFSOCK: u32 = 0o140_000;
const S_IFLNK: u32 = 0o120_000;
const S_IFREG: u32 = 0o100_000;
const S_IFDIR: u32 = 0o040_000;
const S_IFIFO: u32 = 0o010_000;

/// Portable subset of `struct stat` plus the record bookkeeping fields.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StatRecord {
    /// Device holding the entry.
    pub dev: u64,
    /// Inode number.
    pub ino: u64,
    /// File type and permission bits.
    pub mode: u32,
    /// Hard link count.
    pub nlink: u64,
    /// Owner.
    pub uid: u32,
    /// Group.
    pub gid: u32,
    /// Device number for device nodes.
    pub rdev: u64,
    /// Size in bytes.
    pub size: i64,
    /// Preferred I/O block size.
    pub blksize: i64,
    /// Allocated 512-byte blocks.
    pub blocks: i64,
    /// Access time, seconds since the epoch.
    pub atime: i64,
    /// Modification time, seconds since the epoch.
    pub mtime: i64,
    /// Status change time, seconds since the epoch.
    pub ctime: i64,
    /// File index of the record holding the data of a hard-linked file.
    pub link_fi: u32,
    /// BSD user flags.
    pub flags: u32,
    /// Stream type that carries this file's content.
    pub data_stream: i32,
}

impl StatRecord {
    /// Captures the fields of a filesystem metadata snapshot.
    #[cfg(unix)]
    #[must_use]
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;

        Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
            mode: metadata.mode(),
            nlink: metadata.nlink(),
            uid: metadata.uid(),
            gid: metadata.gid(),
            rdev: metadata.rdev(),
            size: metadata.size() as i64,
            blksize: metadata.blksize() as i64,
            blocks: metadata.blocks() as i64,
            atime: metadata.atime(),
            mtime: metadata.mtime(),
            ctime: metadata.ctime(),
            link_fi: 0,
            flags: 0,
            data_stream: 0,
        }
    }

    /// Appends the encoded form to `out`.
    pub fn encode_into(&self, out: &mut String) {
        let fields = [
            self.dev as i64,
            self.ino as i64,
            i64::from(self.mode),
            self.nlink as i64,
            i64::from(self.uid),
            i64::from(self.gid),
            self.rdev as i64,
            self.size,
            self.blksize,
            self.blocks,
            self.atime,
            self.mtime,
            self.ctime,
            i64::from(self.link_fi),
            i64::from(self.flags),
            i64::from(self.data_stream),
        ];
        for (index, value) in fields.into_iter().enumerate() {
            if index > 0 {
                out.push(' ');
            }
            encode_i64(value, out);
        }
    }

    /// Returns the encoded form.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(96);
        self.encode_into(&mut out);
        out
    }

    /// Decodes an encoded stat block. Fields beyond the sixteenth are ignored.
    pub fn decode(encoded: &[u8]) -> Result<Self, ProtocolError> {
        let mut values = [0i64; 16];
        let mut found = 0;
        for field in encoded.split(|&byte| byte == b' ').take(values.len()) {
            values[found] = decode_i64(field)?;
            found += 1;
        }
        if encoded.is_empty() || found < MANDATORY_FIELDS {
            return Err(ProtocolError::MalformedStat {
                expected: MANDATORY_FIELDS,
                found: if encoded.is_empty() { 0 } else { found },
            });
        }

        Ok(Self {
            dev: values[0] as u64,
            ino: values[1] as u64,
            mode: values[2] as u32,
            nlink: values[3] as u64,
            uid: values[4] as u32,
            gid: values[5] as u32,
            rdev: values[6] as u64,
            size: values[7],
            blksize: values[8],
            blocks: values[9],
            atime: values[10],
            mtime: values[11],
            ctime: values[12],
            link_fi: values[13] as u32,
            flags: values[14] as u32,
            data_stream: values[15] as i32,
        })
    }

    /// Returns the `S_IFMT` bits of the mode.
    #[must_use]
    pub const fn format(&self) -> u32 {
        self.mode & S_IFMT
    }

    /// Returns the permission bits, including set-id and sticky bits.
    #[must_use]
    pub const fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }

    /// Reports whether the mode describes a regular file.
    #[must_use]
    pub const fn is_regular(&self) -> bool {
        self.format() == S_IFREG
    }

    /// Reports whether the mode describes a directory.
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        self.format() == S_IFDIR
    }

    /// Reports whether the mode describes a symbolic link.
    #[must_use]
    pub const fn is_symlink(&self) -> bool {
        self.format() == S_IFLNK
    }

    /// Reports whether the mode describes a socket.
    #[must_use]
    pub const fn is_socket(&self) -> bool {
        self.format() == S_IFSOCK
    }

    /// Reports whether the mode describes a named pipe.
    #[must_use]
    pub const fn is_fifo(&self) -> bool {
        self.format() == S_IFIFO
    }
}
