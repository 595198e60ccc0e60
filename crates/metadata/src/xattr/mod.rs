//! Platform extended-attribute backends.

use std::path::Path;

use protocol::{DEFAULT_MAX_XATTR_STREAM, OsFamily};

use crate::error::MetadataError;
use crate::flags::PerFilesystemFlags;
use crate::outcome::ApplyOutcome;

mod stub;
#[cfg(all(feature = "xattr", unix))]
mod unix;

pub use stub::NoXattrBackend;
#[cfg(all(feature = "xattr", unix))]
pub use unix::UnixXattrBackend;

/// Options for capturing the attributes of one path.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct XattrCapture {
    limit: usize,
    skip_acl_names: bool,
}

impl Default for XattrCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl XattrCapture {
    /// Default ceiling, ACL attributes included.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            limit: DEFAULT_MAX_XATTR_STREAM,
            skip_acl_names: false,
        }
    }

    /// Sets the blob size ceiling.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Skips the attributes that mirror POSIX ACLs, for jobs that send
    /// ACLs as their own records.
    #[must_use]
    pub const fn skip_acl_names(mut self, skip: bool) -> Self {
        self.skip_acl_names = skip;
        self
    }

    /// Returns the blob size ceiling.
    #[must_use]
    pub const fn max_size(&self) -> usize {
        self.limit
    }

    /// Reports whether ACL mirror attributes are skipped.
    #[must_use]
    pub const fn skips_acl_names(&self) -> bool {
        self.skip_acl_names
    }
}

/// Capture and replay of extended attributes.
pub trait XattrBackend: Send + Sync {
    /// Platform whose stream tag this backend produces.
    fn os(&self) -> Option<OsFamily>;

    /// Builds the blob for `path` without following symlinks.
    ///
    /// Returns `Ok(None)` when the path has no attributes, vanished, or the
    /// filesystem has no xattr support (the save capability in `flags` is
    /// then switched off). Exceeding the ceiling is an error for this path.
    fn probe_and_build(
        &self,
        path: &Path,
        capture: XattrCapture,
        flags: &mut PerFilesystemFlags,
    ) -> Result<Option<Vec<u8>>, MetadataError>;

    /// Sets every attribute in `blob` on `path`.
    ///
    /// A corrupt blob is an error. Individual failures are collected in
    /// [`ApplyOutcome::Partial`] and do not stop the remaining attributes.
    fn parse_and_apply(
        &self,
        path: &Path,
        blob: &[u8],
        flags: &mut PerFilesystemFlags,
    ) -> Result<ApplyOutcome, MetadataError>;
}

/// Returns the xattr backend for the running platform.
#[must_use]
pub fn native_xattr_backend() -> Box<dyn XattrBackend> {
    #[cfg(all(feature = "xattr", unix))]
    {
        Box::new(UnixXattrBackend::new())
    }
    #[cfg(not(all(feature = "xattr", unix)))]
    {
        Box::new(NoXattrBackend)
    }
}
