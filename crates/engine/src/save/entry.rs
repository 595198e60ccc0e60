use std::fs;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use protocol::{FileType, StatRecord};

/// One entry handed over by the filesystem walker.
///
/// The walker decides the classification; the save path only acts on it.
#[derive(Debug)]
pub struct FileEntry {
    file_type: FileType,
    path: PathBuf,
    stat: StatRecord,
    link: Vec<u8>,
    error: Option<io::Error>,
    top_level: Option<PathBuf>,
}

impl FileEntry {
    /// Creates an entry for `path` with the given classification.
    pub fn new(file_type: FileType, path: impl Into<PathBuf>, stat: StatRecord) -> Self {
        Self {
            file_type,
            path: path.into(),
            stat,
            link: Vec::new(),
            error: None,
            top_level: None,
        }
    }

    /// Sets the symlink target or the first saved name of a hard link.
    #[must_use]
    pub fn with_link(mut self, link: impl Into<Vec<u8>>) -> Self {
        self.link = link.into();
        self
    }

    /// Attaches the error that made the entry unsavable.
    #[must_use]
    pub fn with_error(mut self, error: io::Error) -> Self {
        self.error = Some(error);
        self
    }

    /// Sets the top-level directory of the walk, quoted when recursion stops.
    #[must_use]
    pub fn with_top_level(mut self, top: impl Into<PathBuf>) -> Self {
        self.top_level = Some(top.into());
        self
    }

    /// Classifies `path` from its own metadata, without following symlinks.
    ///
    /// Directories come back as [`FileType::DirectoryEnd`], device nodes
    /// and sockets as [`FileType::Special`]. Stat failures produce a
    /// [`FileType::NoStat`] entry carrying the error.
    pub fn classify(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let metadata = match fs::symlink_metadata(&path) {
            Ok(metadata) => metadata,
            Err(error) => {
                let file_type = if error.kind() == io::ErrorKind::PermissionDenied {
                    FileType::NoAccess
                } else {
                    FileType::NoStat
                };
                return Self::new(file_type, path, StatRecord::default()).with_error(error);
            }
        };
        let stat = StatRecord::from_metadata(&metadata);
        let kind = metadata.file_type();

        if kind.is_symlink() {
            return match fs::read_link(&path) {
                Ok(target) => Self::new(FileType::Symlink, path, stat)
                    .with_link(target.as_os_str().as_bytes()),
                Err(error) => Self::new(FileType::NoFollow, path, stat).with_error(error),
            };
        }
        let file_type = if kind.is_dir() {
            FileType::DirectoryEnd
        } else if kind.is_file() {
            if stat.size == 0 {
                FileType::RegularEmpty
            } else {
                FileType::Regular
            }
        } else if stat.is_fifo() {
            FileType::Fifo
        } else {
            FileType::Special
        };
        Self::new(file_type, path, stat)
    }

    /// Walker classification.
    pub const fn file_type(&self) -> FileType {
        self.file_type
    }

    /// Filesystem path used to open the entry.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Metadata captured by the walker.
    pub const fn stat(&self) -> &StatRecord {
        &self.stat
    }

    /// Symlink target or hard link name; empty otherwise.
    pub fn link(&self) -> &[u8] {
        &self.link
    }

    /// Error recorded by the walker, if any.
    pub const fn error(&self) -> Option<&io::Error> {
        self.error.as_ref()
    }

    pub(crate) fn top_level(&self) -> Option<&Path> {
        self.top_level.as_deref()
    }

    /// Path bytes as they appear in records, before strip-path.
    ///
    /// Directory ends and reparse points get a trailing separator.
    pub fn record_name(&self, file_type: FileType) -> Vec<u8> {
        let mut name = self.path.as_os_str().as_bytes().to_vec();
        if matches!(file_type, FileType::DirectoryEnd | FileType::Reparse)
            && name.last() != Some(&b'/')
        {
            name.push(b'/');
        }
        name
    }

    pub(crate) fn error_text(&self) -> String {
        self.error
            .as_ref()
            .map_or_else(|| "unknown error".to_owned(), ToString::to_string)
    }
}
