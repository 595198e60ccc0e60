use std::ffi::OsStr;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use protocol::{OsFamily, XattrBlobBuilder, parse_xattr_blob};

use super::{XattrBackend, XattrCapture};
use crate::error::{MetadataError, is_not_found, is_unsupported};
use crate::flags::{Capability, Direction, PerFilesystemFlags};
use crate::outcome::ApplyOutcome;

const ACL_ACCESS_NAME: &str = "system.posix_acl_access";
const ACL_DEFAULT_NAME: &str = "system.posix_acl_default";

/// Checks whether an xattr name is accessible at the current privilege level.
///
/// Without root privileges Linux only exposes the `user.*` namespace. Other
/// platforms do not split attributes by privilege.
#[cfg(target_os = "linux")]
fn is_xattr_permitted(name: &str) -> bool {
    fn is_root() -> bool {
        use std::sync::OnceLock;
        static IS_ROOT: OnceLock<bool> = OnceLock::new();
        *IS_ROOT.get_or_init(|| rustix::process::geteuid().is_root())
    }

    is_root() || name.starts_with("user.")
}

#[cfg(not(target_os = "linux"))]
fn is_xattr_permitted(_name: &str) -> bool {
    true
}

fn is_acl_name(name: &str) -> bool {
    name == ACL_ACCESS_NAME || name == ACL_DEFAULT_NAME
}

fn invalid_data(error: impl std::error::Error + Send + Sync + 'static) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, error)
}

/// Extended attributes through the `xattr` crate, symlinks not followed.
#[derive(Clone, Copy, Debug)]
pub struct UnixXattrBackend {
    os: Option<OsFamily>,
}

impl Default for UnixXattrBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl UnixXattrBackend {
    /// Creates the backend for the running platform.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            os: OsFamily::current(),
        }
    }
}

impl XattrBackend for UnixXattrBackend {
    fn os(&self) -> Option<OsFamily> {
        self.os
    }

    fn probe_and_build(
        &self,
        path: &Path,
        capture: XattrCapture,
        flags: &mut PerFilesystemFlags,
    ) -> Result<Option<Vec<u8>>, MetadataError> {
        let names = match xattr::list(path) {
            Ok(names) => names,
            Err(error) if is_unsupported(&error) => {
                flags.disable(Direction::Save, Capability::Xattr);
                return Ok(None);
            }
            Err(error) if is_not_found(&error) => return Ok(None),
            Err(error) => {
                return Err(MetadataError::new("list extended attributes", path, error));
            }
        };

        let mut builder = XattrBlobBuilder::new(capture.max_size());
        for name in names {
            let display = name.to_string_lossy();
            if !is_xattr_permitted(&display) {
                continue;
            }
            if capture.skips_acl_names() && is_acl_name(&display) {
                continue;
            }
            let value = match xattr::get(path, &name) {
                Ok(Some(value)) => value,
                // Removed between list and get.
                Ok(None) => continue,
                Err(error) => {
                    return Err(MetadataError::new("read extended attribute", path, error));
                }
            };
            builder.push(name.as_bytes(), &value).map_err(|error| {
                MetadataError::new("capture extended attributes", path, invalid_data(error))
            })?;
        }

        if builder.is_empty() {
            return Ok(None);
        }
        Ok(Some(builder.finish()))
    }

    fn parse_and_apply(
        &self,
        path: &Path,
        blob: &[u8],
        flags: &mut PerFilesystemFlags,
    ) -> Result<ApplyOutcome, MetadataError> {
        let mut applied = 0usize;
        let mut failures = Vec::new();

        for entry in parse_xattr_blob(blob) {
            let entry = entry.map_err(|error| {
                MetadataError::new("parse extended attributes", path, invalid_data(error))
            })?;
            match xattr::set(path, OsStr::from_bytes(entry.name), entry.value) {
                Ok(()) => applied += 1,
                Err(error) if is_unsupported(&error) => {
                    return Ok(ApplyOutcome::Unsupported {
                        first: flags.disable(Direction::Restore, Capability::Xattr),
                    });
                }
                Err(error) if is_not_found(&error) => return Ok(ApplyOutcome::Skipped),
                Err(error) => {
                    failures.push(MetadataError::new("write extended attribute", path, error));
                }
            }
        }

        Ok(if !failures.is_empty() {
            ApplyOutcome::Partial(failures)
        } else if applied == 0 {
            ApplyOutcome::Skipped
        } else {
            ApplyOutcome::Applied
        })
    }
}
