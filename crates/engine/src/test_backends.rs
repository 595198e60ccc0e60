//! Scripted ACL and xattr backends for the save and restore tests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use metadata::{
    AclBackend, ApplyOutcome, Capability, Direction, MetadataError, PerFilesystemFlags,
    XattrBackend, XattrCapture,
};
use protocol::{AclFlavor, DEFAULT_MAX_XATTR_STREAM, OsFamily, XattrBlobBuilder};

/// Shared call counter.
#[derive(Clone, Debug, Default)]
pub(crate) struct Calls(Arc<AtomicUsize>);

impl Calls {
    fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// ACL backend on a filesystem that rejects ACLs in both directions.
#[derive(Debug, Default)]
pub(crate) struct UnsupportedAcl {
    pub(crate) captures: Calls,
    pub(crate) applies: Calls,
}

impl AclBackend for UnsupportedAcl {
    fn os(&self) -> Option<OsFamily> {
        OsFamily::current()
    }

    fn flavors(&self) -> &[AclFlavor] {
        &[AclFlavor::Access]
    }

    fn probe_and_build(
        &self,
        _path: &Path,
        _flavor: AclFlavor,
        flags: &mut PerFilesystemFlags,
    ) -> Result<Option<Vec<u8>>, MetadataError> {
        self.captures.hit();
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
        self.applies.hit();
        Ok(ApplyOutcome::Unsupported {
            first: flags.disable(Direction::Restore, Capability::Acl),
        })
    }
}

/// Xattr backend on a filesystem that rejects xattrs in both directions.
#[derive(Debug, Default)]
pub(crate) struct UnsupportedXattr {
    pub(crate) captures: Calls,
    pub(crate) applies: Calls,
}

impl XattrBackend for UnsupportedXattr {
    fn os(&self) -> Option<OsFamily> {
        OsFamily::current()
    }

    fn probe_and_build(
        &self,
        _path: &Path,
        _capture: XattrCapture,
        flags: &mut PerFilesystemFlags,
    ) -> Result<Option<Vec<u8>>, MetadataError> {
        self.captures.hit();
        flags.disable(Direction::Save, Capability::Xattr);
        Ok(None)
    }

    fn parse_and_apply(
        &self,
        _path: &Path,
        _blob: &[u8],
        flags: &mut PerFilesystemFlags,
    ) -> Result<ApplyOutcome, MetadataError> {
        self.applies.hit();
        Ok(ApplyOutcome::Unsupported {
            first: flags.disable(Direction::Restore, Capability::Xattr),
        })
    }
}

/// Xattr backend that captures a fixed blob and records every blob applied.
#[derive(Debug)]
pub(crate) struct FixedXattr {
    blob: Vec<u8>,
    pub(crate) applied: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl FixedXattr {
    pub(crate) fn new(blob: Vec<u8>) -> Self {
        Self {
            blob,
            applied: Arc::default(),
        }
    }
}

impl XattrBackend for FixedXattr {
    fn os(&self) -> Option<OsFamily> {
        OsFamily::current()
    }

    fn probe_and_build(
        &self,
        _path: &Path,
        _capture: XattrCapture,
        _flags: &mut PerFilesystemFlags,
    ) -> Result<Option<Vec<u8>>, MetadataError> {
        Ok(Some(self.blob.clone()))
    }

    fn parse_and_apply(
        &self,
        _path: &Path,
        blob: &[u8],
        _flags: &mut PerFilesystemFlags,
    ) -> Result<ApplyOutcome, MetadataError> {
        self.applied.lock().expect("lock").push(blob.to_vec());
        Ok(ApplyOutcome::Applied)
    }
}

/// A valid xattr blob just above the largest single packet, and still below
/// the default capture ceiling.
pub(crate) fn oversized_blob() -> Vec<u8> {
    let mut builder = XattrBlobBuilder::new(DEFAULT_MAX_XATTR_STREAM);
    for index in 0..16u8 {
        let name = format!("user.chunk{index:02}");
        let value = vec![b'a' + index; 63_000];
        builder.push(name.as_bytes(), &value).expect("below ceiling");
    }
    let blob = builder.finish();
    assert!(blob.len() > protocol::packet::MAX_PACKET_LEN);
    blob
}
