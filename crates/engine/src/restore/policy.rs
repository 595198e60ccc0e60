use std::ffi::OsStr;
use std::fs::{self, File};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use protocol::{AttributesRecord, FileType};

/// What a [`CreationPolicy`] did with an attributes record.
#[derive(Debug)]
pub enum CreateOutcome {
    /// Nothing was created; the file's remaining records are discarded.
    Skip,
    /// The object exists and has no content to extract.
    Created,
    /// The file was created and its data records go to this handle.
    Extract(File),
}

/// Decides how each restored entry is materialized on disk.
///
/// An `Err` is reported as a per-file error and the entry is skipped.
pub trait CreationPolicy {
    /// Creates the object described by `attrs` at `target`.
    fn create(&mut self, attrs: &AttributesRecord, target: &Path) -> io::Result<CreateOutcome>;
}

/// Restores into the local filesystem, always replacing existing entries.
///
/// Regular files, directories, symlinks and hard links are created, with
/// missing parent directories. Device nodes, fifos and deleted notices are
/// skipped.
#[derive(Clone, Debug, Default)]
pub struct LocalFilesystem {
    root: Option<PathBuf>,
}

impl LocalFilesystem {
    /// Restores below `root`, or at the saved paths when `None`.
    pub fn new(root: Option<&Path>) -> Self {
        Self {
            root: root.map(Path::to_path_buf),
        }
    }
}

impl CreationPolicy for LocalFilesystem {
    fn create(&mut self, attrs: &AttributesRecord, target: &Path) -> io::Result<CreateOutcome> {
        match attrs.file_type {
            FileType::Regular | FileType::RegularEmpty => {
                prepare(target)?;
                let file = File::create(target)?;
                if attrs.file_type == FileType::RegularEmpty {
                    return Ok(CreateOutcome::Created);
                }
                Ok(CreateOutcome::Extract(file))
            }
            FileType::DirectoryEnd => {
                if fs::symlink_metadata(target).is_ok_and(|meta| !meta.is_dir()) {
                    fs::remove_file(target)?;
                }
                fs::create_dir_all(target)?;
                Ok(CreateOutcome::Created)
            }
            FileType::Symlink => {
                prepare(target)?;
                symlink(OsStr::from_bytes(&attrs.link), target)?;
                Ok(CreateOutcome::Created)
            }
            FileType::LinkSaved => {
                prepare(target)?;
                fs::hard_link(target_path(self.root.as_deref(), &attrs.link), target)?;
                Ok(CreateOutcome::Created)
            }
            other => {
                logging::trace_restore!(
                    debug,
                    path = %target.display(),
                    kind = other.name(),
                    "entry type not restored"
                );
                Ok(CreateOutcome::Skip)
            }
        }
    }
}

/// Creates the parent of `target` and removes a non-directory in its place.
fn prepare(target: &Path) -> io::Result<()> {
    if let Some(parent) = target.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    match fs::symlink_metadata(target) {
        Ok(meta) if meta.is_dir() => fs::remove_dir(target),
        Ok(_) => fs::remove_file(target),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(error),
    }
}

/// Maps a saved path below the restore location.
pub(crate) fn target_path(root: Option<&Path>, name: &[u8]) -> PathBuf {
    let saved = Path::new(OsStr::from_bytes(name));
    match root {
        Some(root) => {
            let relative = saved.strip_prefix("/").unwrap_or(saved);
            root.join(relative)
        }
        None => saved.to_path_buf(),
    }
}
