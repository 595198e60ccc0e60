//! Platform ACL backends.
//!
//! Each backend serializes the ACLs of a path into a portable text blob tagged
//! by flavor, and replays such blobs on restore. The backend for the running
//! platform is chosen once per job with [`native_acl_backend`].

use std::path::Path;

use protocol::{AclFlavor, OsFamily};

use crate::error::MetadataError;
use crate::flags::PerFilesystemFlags;
use crate::outcome::ApplyOutcome;

mod noop;
#[cfg(all(feature = "acl", any(target_os = "linux", target_os = "freebsd")))]
mod posix;
#[cfg(all(feature = "acl", target_os = "macos"))]
mod darwin;
mod text;

pub use noop::NoAclBackend;
#[cfg(all(feature = "acl", any(target_os = "linux", target_os = "freebsd")))]
pub use posix::PosixAclBackend;
#[cfg(all(feature = "acl", target_os = "macos"))]
pub use darwin::DarwinAclBackend;
pub use text::{
    AclPerms, AclTag, AclTextEntry, AclTextError, format_acl_text, is_trivial, parse_acl_text,
};

/// Capture and replay of native ACLs.
pub trait AclBackend: Send + Sync {
    /// Platform whose stream tags this backend produces.
    fn os(&self) -> Option<OsFamily>;

    /// Flavors this backend captures, in the order they are sent.
    fn flavors(&self) -> &[AclFlavor];

    /// Reports whether blobs of `flavor` can be applied here.
    fn supports(&self, flavor: AclFlavor) -> bool {
        self.flavors().contains(&flavor)
    }

    /// Reads the ACL of `flavor` from `path`.
    ///
    /// Returns `Ok(None)` when there is nothing to send: the path vanished,
    /// the access ACL is trivial, the default ACL is empty, or the filesystem
    /// has no ACL support (in which case the save capability in `flags` is
    /// switched off).
    fn probe_and_build(
        &self,
        path: &Path,
        flavor: AclFlavor,
        flags: &mut PerFilesystemFlags,
    ) -> Result<Option<Vec<u8>>, MetadataError>;

    /// Applies a blob previously produced by [`probe_and_build`](Self::probe_and_build).
    fn parse_and_apply(
        &self,
        path: &Path,
        flavor: AclFlavor,
        blob: &[u8],
        flags: &mut PerFilesystemFlags,
    ) -> Result<ApplyOutcome, MetadataError>;
}

/// Returns the ACL backend for the running platform.
#[must_use]
pub fn native_acl_backend() -> Box<dyn AclBackend> {
    #[cfg(all(feature = "acl", any(target_os = "linux", target_os = "freebsd")))]
    {
        Box::new(PosixAclBackend::new())
    }
    #[cfg(all(feature = "acl", target_os = "macos"))]
    {
        Box::new(DarwinAclBackend::new())
    }
    #[cfg(not(all(
        feature = "acl",
        any(target_os = "linux", target_os = "freebsd", target_os = "macos")
    )))]
    {
        Box::new(NoAclBackend)
    }
}

/// Decodes a blob as UTF-8 text, trimming the NUL terminator some writers append.
pub(crate) fn blob_text<'a>(path: &Path, blob: &'a [u8]) -> Result<&'a str, MetadataError> {
    let trimmed = blob.strip_suffix(&[0]).unwrap_or(blob);
    std::str::from_utf8(trimmed).map_err(|error| {
        MetadataError::new(
            "decode ACL",
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidData, error),
        )
    })
}
