//! Extended ACLs on macOS through `exacl`.
//!
//! The blob is `exacl`'s own text form, which keeps deny entries and
//! inheritance flags. It is only ever replayed on macOS.

use std::path::Path;

use exacl::AclEntry;
use protocol::{AclFlavor, OsFamily};

use super::{AclBackend, blob_text};
use crate::error::{MetadataError, is_not_found, is_unsupported};
use crate::flags::{Capability, Direction, PerFilesystemFlags};
use crate::outcome::ApplyOutcome;

const FLAVORS: [AclFlavor; 1] = [AclFlavor::Extended];

/// The macOS extended ACL.
#[derive(Clone, Copy, Debug, Default)]
pub struct DarwinAclBackend;

impl DarwinAclBackend {
    /// Creates the backend.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl AclBackend for DarwinAclBackend {
    fn os(&self) -> Option<OsFamily> {
        Some(OsFamily::Darwin)
    }

    fn flavors(&self) -> &[AclFlavor] {
        &FLAVORS
    }

    fn probe_and_build(
        &self,
        path: &Path,
        flavor: AclFlavor,
        flags: &mut PerFilesystemFlags,
    ) -> Result<Option<Vec<u8>>, MetadataError> {
        if flavor != AclFlavor::Extended {
            return Ok(None);
        }
        let entries = match exacl::getfacl(path, None) {
            Ok(entries) => entries,
            Err(error) if is_unsupported(&error) => {
                flags.disable(Direction::Save, Capability::Acl);
                return Ok(None);
            }
            Err(error) if is_not_found(&error) => return Ok(None),
            Err(error) => return Err(MetadataError::new("read ACL", path, error)),
        };
        if entries.is_empty() {
            return Ok(None);
        }
        exacl::to_string(&entries)
            .map(|text| Some(text.into_bytes()))
            .map_err(|error| MetadataError::new("encode ACL", path, error))
    }

    fn parse_and_apply(
        &self,
        path: &Path,
        flavor: AclFlavor,
        blob: &[u8],
        flags: &mut PerFilesystemFlags,
    ) -> Result<ApplyOutcome, MetadataError> {
        if flavor != AclFlavor::Extended {
            return Ok(ApplyOutcome::Skipped);
        }
        let text = blob_text(path, blob)?;
        let entries: Vec<AclEntry> =
            exacl::from_str(text).map_err(|error| MetadataError::new("parse ACL", path, error))?;

        match exacl::setfacl(&[path], &entries, None) {
            Ok(()) => Ok(ApplyOutcome::Applied),
            Err(error) if is_not_found(&error) => Ok(ApplyOutcome::Skipped),
            Err(error) if is_unsupported(&error) => Ok(ApplyOutcome::Unsupported {
                first: flags.disable(Direction::Restore, Capability::Acl),
            }),
            Err(error) => Err(MetadataError::new("apply ACL", path, error)),
        }
    }
}
