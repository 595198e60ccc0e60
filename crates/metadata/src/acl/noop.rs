use std::path::Path;

use protocol::{AclFlavor, OsFamily};

use super::AclBackend;
use crate::error::MetadataError;
use crate::flags::{Capability, Direction, PerFilesystemFlags};
use crate::outcome::ApplyOutcome;

/// Backend for builds or platforms without native ACL support.
///
/// It captures nothing and reports every restore as unsupported, once per
/// filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAclBackend;

impl AclBackend for NoAclBackend {
    fn os(&self) -> Option<OsFamily> {
        None
    }

    fn flavors(&self) -> &[AclFlavor] {
        &[]
    }

    fn probe_and_build(
        &self,
        _path: &Path,
        _flavor: AclFlavor,
        flags: &mut PerFilesystemFlags,
    ) -> Result<Option<Vec<u8>>, MetadataError> {
        flags.disable(Direction::Save, Capability::Acl);
        Ok(None)
    }

    fn parse_and_apply(
        &self,
        _path: &Path,
        _flavor: AclFlavor,
        _blob: &[u8],
        flags: &mut PerFilesystemFlags,
    ) -> Result<ApplyOutcome, MetadataError> {
        let first = flags.disable(Direction::Restore, Capability::Acl);
        Ok(ApplyOutcome::Unsupported { first })
    }
}
