//! Job-wide and per-file options.
//!
//! Both structs follow the builder style: `const fn` setters consume and
//! return `self`, and accessors carry an `_enabled`/noun suffix so they do
//! not collide with the setters.

use std::path::{Path, PathBuf};
use std::time::Duration;

use checksums::ChecksumKind;
use compress::zlib::CompressionLevel;
use protocol::{DEFAULT_MAX_XATTR_STREAM, DataFamily};

/// Default number of bytes read per data block.
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// Smallest accepted block size.
pub const MIN_BLOCK_SIZE: usize = 512;

/// Largest accepted block size; a block plus its sparse prefix and zlib
/// framing must fit in one packet.
pub const MAX_BLOCK_SIZE: usize = 512 * 1024;

/// Backup level requested by the coordinator.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum JobLevel {
    /// Everything is saved; no change detection.
    #[default]
    Full,
    /// Changes since the previous backup of any level.
    Incremental,
    /// Changes since the previous full backup.
    Differential,
}

impl JobLevel {
    /// Returns the lowercase name of the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Incremental => "incremental",
            Self::Differential => "differential",
        }
    }

    /// Reports whether this is a full backup.
    #[must_use]
    pub const fn is_full(self) -> bool {
        matches!(self, Self::Full)
    }
}

/// Options applied to a single file entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FileOptions {
    sparse: bool,
    compression: Option<CompressionLevel>,
    checksum: ChecksumKind,
    acl: bool,
    xattr: bool,
    mtime_only: bool,
    no_atime: bool,
    strip_path: u32,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl FileOptions {
    /// Plain data, no compression, no checksum, no ACLs or xattrs.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sparse: false,
            compression: None,
            checksum: ChecksumKind::None,
            acl: false,
            xattr: false,
            mtime_only: false,
            no_atime: false,
            strip_path: 0,
        }
    }

    /// Enables elision of all-zero blocks.
    #[must_use]
    pub const fn sparse(mut self, enabled: bool) -> Self {
        self.sparse = enabled;
        self
    }

    /// Compresses every data block at `level`; `None` disables compression.
    #[must_use]
    pub const fn compression(mut self, level: Option<CompressionLevel>) -> Self {
        self.compression = level;
        self
    }

    /// Selects the signature sent after the file content.
    #[must_use]
    pub const fn checksum(mut self, kind: ChecksumKind) -> Self {
        self.checksum = kind;
        self
    }

    /// Enables ACL records.
    #[must_use]
    pub const fn acl(mut self, enabled: bool) -> Self {
        self.acl = enabled;
        self
    }

    /// Enables extended attribute records.
    #[must_use]
    pub const fn xattr(mut self, enabled: bool) -> Self {
        self.xattr = enabled;
        self
    }

    /// Ignores ctime when deciding whether a file changed.
    #[must_use]
    pub const fn mtime_only(mut self, enabled: bool) -> Self {
        self.mtime_only = enabled;
        self
    }

    /// Opens files without updating their access time where the OS allows it.
    #[must_use]
    pub const fn no_atime(mut self, enabled: bool) -> Self {
        self.no_atime = enabled;
        self
    }

    /// Drops this many leading path components from saved names.
    #[must_use]
    pub const fn strip_path(mut self, count: u32) -> Self {
        self.strip_path = count;
        self
    }

    /// Reports whether sparse elision is enabled.
    #[must_use]
    pub const fn sparse_enabled(&self) -> bool {
        self.sparse
    }

    /// Returns the compression level, if compression is enabled.
    #[must_use]
    pub const fn compression_level(&self) -> Option<CompressionLevel> {
        self.compression
    }

    /// Returns the requested signature kind.
    #[must_use]
    pub const fn checksum_kind(&self) -> ChecksumKind {
        self.checksum
    }

    /// Reports whether ACL records are requested.
    #[must_use]
    pub const fn acl_enabled(&self) -> bool {
        self.acl
    }

    /// Reports whether extended attribute records are requested.
    #[must_use]
    pub const fn xattr_enabled(&self) -> bool {
        self.xattr
    }

    /// Reports whether only mtime is compared.
    #[must_use]
    pub const fn mtime_only_enabled(&self) -> bool {
        self.mtime_only
    }

    /// Reports whether atime preservation is requested.
    #[must_use]
    pub const fn no_atime_enabled(&self) -> bool {
        self.no_atime
    }

    /// Returns the number of leading components to strip.
    #[must_use]
    pub const fn strip_count(&self) -> u32 {
        self.strip_path
    }

    /// Data family announced in the attributes record of files saved with
    /// these options.
    #[must_use]
    pub const fn data_family(&self) -> DataFamily {
        DataFamily::select(self.sparse, self.compression.is_some())
    }
}

/// Job-wide settings delivered at job start.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct JobConfig {
    level: JobLevel,
    accurate: bool,
    block_size: usize,
    max_xattr_size: usize,
    restore_location: Option<PathBuf>,
    heartbeat_interval: Option<Duration>,
    mtime_only: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl JobConfig {
    /// Full backup, accurate mode off, 64 KiB blocks, 1 MiB xattr ceiling.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            level: JobLevel::Full,
            accurate: false,
            block_size: DEFAULT_BLOCK_SIZE,
            max_xattr_size: DEFAULT_MAX_XATTR_STREAM,
            restore_location: None,
            heartbeat_interval: None,
            mtime_only: false,
        }
    }

    /// Sets the backup level.
    #[must_use]
    pub const fn level(mut self, level: JobLevel) -> Self {
        self.level = level;
        self
    }

    /// Enables accurate mode.
    #[must_use]
    pub const fn accurate(mut self, enabled: bool) -> Self {
        self.accurate = enabled;
        self
    }

    /// Sets the read block size, clamped to
    /// [`MIN_BLOCK_SIZE`]`..=`[`MAX_BLOCK_SIZE`].
    #[must_use]
    pub const fn block_size(mut self, size: usize) -> Self {
        self.block_size = if size < MIN_BLOCK_SIZE {
            MIN_BLOCK_SIZE
        } else if size > MAX_BLOCK_SIZE {
            MAX_BLOCK_SIZE
        } else {
            size
        };
        self
    }

    /// Sets the ceiling for one file's xattr blob.
    #[must_use]
    pub const fn max_xattr_size(mut self, size: usize) -> Self {
        self.max_xattr_size = size;
        self
    }

    /// Prefixes every restored path with `location`.
    #[must_use]
    #[doc(alias = "where")]
    pub fn restore_location<P: Into<PathBuf>>(mut self, location: Option<P>) -> Self {
        self.restore_location = location.map(Into::into);
        self
    }

    /// Sends a heartbeat on the coordinator connection at this interval.
    #[must_use]
    pub const fn heartbeat_interval(mut self, interval: Option<Duration>) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Ignores ctime for every file of the job.
    #[must_use]
    pub const fn mtime_only(mut self, enabled: bool) -> Self {
        self.mtime_only = enabled;
        self
    }

    /// Returns the backup level.
    #[must_use]
    pub const fn job_level(&self) -> JobLevel {
        self.level
    }

    /// Reports whether accurate mode was requested.
    #[must_use]
    pub const fn accurate_enabled(&self) -> bool {
        self.accurate
    }

    /// Reports whether this job builds a change-detection table: accurate
    /// mode on a level other than full.
    #[must_use]
    pub const fn uses_accurate_table(&self) -> bool {
        self.accurate && !self.level.is_full()
    }

    /// Returns the read block size.
    #[must_use]
    pub const fn block_len(&self) -> usize {
        self.block_size
    }

    /// Returns the xattr blob ceiling.
    #[must_use]
    pub const fn xattr_limit(&self) -> usize {
        self.max_xattr_size
    }

    /// Returns the restore location.
    #[must_use]
    pub fn restore_root(&self) -> Option<&Path> {
        self.restore_location.as_deref()
    }

    /// Returns the heartbeat interval.
    #[must_use]
    pub const fn heartbeat(&self) -> Option<Duration> {
        self.heartbeat_interval
    }

    /// Reports whether the job compares mtime only.
    #[must_use]
    pub const fn mtime_only_enabled(&self) -> bool {
        self.mtime_only
    }
}
