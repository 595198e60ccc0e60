use std::path::Path;

use protocol::OsFamily;

use super::{XattrBackend, XattrCapture};
use crate::error::MetadataError;
use crate::flags::{Capability, Direction, PerFilesystemFlags};
use crate::outcome::ApplyOutcome;

/// Backend for builds or platforms without extended attribute support.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoXattrBackend;

impl XattrBackend for NoXattrBackend {
    fn os(&self) -> Option<OsFamily> {
        None
    }

    fn probe_and_build(
        &self,
        _path: &Path,
        _capture: XattrCapture,
        flags: &mut PerFilesystemFlags,
    ) -> Result<Option<Vec<u8>>, MetadataError> {
        flags.disable(Direction::Save, Capability::Xattr);
        Ok(None)
    }

    fn parse_and_apply(
        &self,
        _path: &Path,
        _blob: &[u8],
        flags: &mut PerFilesystemFlags,
    ) -> Result<ApplyOutcome, MetadataError> {
        let first = flags.disable(Direction::Restore, Capability::Xattr);
        Ok(ApplyOutcome::Unsupported { first })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switches_capabilities_off() {
        let mut flags = PerFilesystemFlags::new();
        let path = Path::new("/nonexistent");
        assert!(
            NoXattrBackend
                .probe_and_build(path, XattrCapture::new(), &mut flags)
                .expect("probe")
                .is_none()
        );
        assert!(!flags.is_enabled(Direction::Save, Capability::Xattr));
        assert!(matches!(
            NoXattrBackend.parse_and_apply(path, b"", &mut flags),
            Ok(ApplyOutcome::Unsupported { first: true })
        ));
    }
}
