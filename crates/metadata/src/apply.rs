//! Restore-side application of recorded attributes.
//!
//! Order matters: ownership first because `chown` may clear set-id bits,
//! then the mode, then the timestamps because every earlier step updates
//! the change time and some filesystems also touch the modification time.

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use filetime::{FileTime, set_file_times, set_symlink_file_times};
use protocol::StatRecord;
use rustix::fs::{AtFlags, CWD};

use crate::error::MetadataError;
use crate::ownership;

/// Compares the size of the restored file with the recorded one.
///
/// A recorded size of zero is never checked, since some entries (raw devices,
/// fifos) report no meaningful size.
pub fn verify_size(path: &Path, expected: i64) -> Result<(), MetadataError> {
    if expected <= 0 {
        return Ok(());
    }
    let actual = fs::symlink_metadata(path)
        .map_err(|error| MetadataError::new("stat restored file", path, error))?
        .len();
    if i64::try_from(actual).ok() == Some(expected) {
        return Ok(());
    }
    Err(MetadataError::new(
        "verify size of",
        path,
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("size mismatch: restored {actual} bytes, recorded {expected}"),
        ),
    ))
}

/// Applies ownership, mode and timestamps from `stat` to `path`.
///
/// Symlinks get `lchown` and timestamps but no mode. Ownership failures are
/// only reported when running as root, as an unprivileged restore cannot
/// give files away. All steps run even when one fails; the first failure is
/// returned.
pub fn apply_attributes(path: &Path, stat: &StatRecord) -> Result<(), MetadataError> {
    let is_symlink = stat.is_symlink();
    let mut first_error = None;

    let owner = ownership::uid_from_raw(stat.uid);
    let group = ownership::gid_from_raw(stat.gid);
    let at_flags = if is_symlink {
        AtFlags::SYMLINK_NOFOLLOW
    } else {
        AtFlags::empty()
    };
    if let Err(error) = rustix::fs::chownat(CWD, path, Some(owner), Some(group), at_flags)
        && ownership::running_as_root()
    {
        first_error.get_or_insert(MetadataError::new(
            "restore ownership",
            path,
            io::Error::from(error),
        ));
    }

    if !is_symlink
        && let Err(error) = fs::set_permissions(path, fs::Permissions::from_mode(stat.permissions()))
    {
        first_error.get_or_insert(MetadataError::new("restore permissions", path, error));
    }

    let accessed = FileTime::from_unix_time(stat.atime, 0);
    let modified = FileTime::from_unix_time(stat.mtime, 0);
    let result = if is_symlink {
        set_symlink_file_times(path, accessed, modified)
    } else {
        set_file_times(path, accessed, modified)
    };
    if let Err(error) = result {
        first_error.get_or_insert(MetadataError::new("restore timestamps", path, error));
    }

    first_error.map_or(Ok(()), Err)
}
