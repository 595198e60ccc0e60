//! POSIX.1e ACLs on Linux and FreeBSD through `exacl`.

use std::io;
use std::path::Path;

use exacl::{AclEntry, AclEntryKind, AclOption, Flag, Perm};
use protocol::{AclFlavor, OsFamily};

use super::text::{AclPerms, AclTag, AclTextEntry, format_acl_text, is_trivial, parse_acl_text};
use super::{AclBackend, blob_text};
use crate::error::{MetadataError, is_not_found, is_unsupported};
use crate::flags::{Capability, Direction, PerFilesystemFlags};
use crate::outcome::ApplyOutcome;

const FLAVORS: [AclFlavor; 2] = [AclFlavor::Access, AclFlavor::Default];

/// Access and default ACLs in the POSIX short text form.
#[derive(Clone, Copy, Debug)]
pub struct PosixAclBackend {
    os: OsFamily,
}

impl Default for PosixAclBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PosixAclBackend {
    /// Creates the backend for the running platform.
    #[must_use]
    pub const fn new() -> Self {
        let os = if cfg!(target_os = "freebsd") {
            OsFamily::FreeBsd
        } else {
            OsFamily::Linux
        };
        Self { os }
    }
}

const fn option_for(flavor: AclFlavor) -> Option<AclOption> {
    match flavor {
        AclFlavor::Access => Some(AclOption::ACCESS_ACL),
        AclFlavor::Default => Some(AclOption::DEFAULT_ACL),
        AclFlavor::DefaultDir | AclFlavor::Extended | AclFlavor::Nfs4 => None,
    }
}

fn to_text_entry(entry: &AclEntry) -> Option<AclTextEntry> {
    if !entry.allow {
        return None;
    }
    let tag = match (&entry.kind, entry.name.is_empty()) {
        (AclEntryKind::User, true) => AclTag::UserObj,
        (AclEntryKind::User, false) => AclTag::User,
        (AclEntryKind::Group, true) => AclTag::GroupObj,
        (AclEntryKind::Group, false) => AclTag::Group,
        (AclEntryKind::Mask, _) => AclTag::Mask,
        (AclEntryKind::Other, _) => AclTag::Other,
        _ => return None,
    };
    let mut bits = 0;
    if entry.perms.contains(Perm::READ) {
        bits |= AclPerms::READ.bits();
    }
    if entry.perms.contains(Perm::WRITE) {
        bits |= AclPerms::WRITE.bits();
    }
    if entry.perms.contains(Perm::EXECUTE) {
        bits |= AclPerms::EXECUTE.bits();
    }
    Some(AclTextEntry::new(tag, entry.name.clone(), AclPerms::from_bits(bits)))
}

fn to_exacl_entry(entry: &AclTextEntry) -> AclEntry {
    let kind = match entry.tag {
        AclTag::UserObj | AclTag::User => AclEntryKind::User,
        AclTag::GroupObj | AclTag::Group => AclEntryKind::Group,
        AclTag::Mask => AclEntryKind::Mask,
        AclTag::Other => AclEntryKind::Other,
    };
    let mut perms = Perm::empty();
    if entry.perms.contains(AclPerms::READ) {
        perms |= Perm::READ;
    }
    if entry.perms.contains(AclPerms::WRITE) {
        perms |= Perm::WRITE;
    }
    if entry.perms.contains(AclPerms::EXECUTE) {
        perms |= Perm::EXECUTE;
    }
    AclEntry {
        kind,
        name: entry.qualifier.clone(),
        perms,
        flags: Flag::empty(),
        allow: true,
    }
}

impl AclBackend for PosixAclBackend {
    fn os(&self) -> Option<OsFamily> {
        Some(self.os)
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
        let Some(option) = option_for(flavor) else {
            return Ok(None);
        };
        let entries = match exacl::getfacl(path, option) {
            Ok(entries) => entries,
            Err(error) if is_unsupported(&error) => {
                flags.disable(Direction::Save, Capability::Acl);
                return Ok(None);
            }
            Err(error) if is_not_found(&error) => return Ok(None),
            Err(error) => return Err(MetadataError::new("read ACL", path, error)),
        };

        let entries: Vec<AclTextEntry> = entries.iter().filter_map(to_text_entry).collect();
        // A default ACL is never implied by the mode bits.
        let nothing_to_send = match flavor {
            AclFlavor::Default => entries.is_empty(),
            _ => is_trivial(&entries),
        };
        if nothing_to_send {
            return Ok(None);
        }
        Ok(Some(format_acl_text(&entries).into_bytes()))
    }

    fn parse_and_apply(
        &self,
        path: &Path,
        flavor: AclFlavor,
        blob: &[u8],
        flags: &mut PerFilesystemFlags,
    ) -> Result<ApplyOutcome, MetadataError> {
        let Some(option) = option_for(flavor) else {
            return Ok(ApplyOutcome::Skipped);
        };
        let text = blob_text(path, blob)?;
        let entries = parse_acl_text(text).map_err(|error| {
            MetadataError::new(
                "parse ACL",
                path,
                io::Error::new(io::ErrorKind::InvalidData, error),
            )
        })?;
        let entries: Vec<AclEntry> = entries.iter().map(to_exacl_entry).collect();

        match exacl::setfacl(&[path], &entries, option) {
            Ok(()) => Ok(ApplyOutcome::Applied),
            Err(error) if is_not_found(&error) => Ok(ApplyOutcome::Skipped),
            Err(error) if is_unsupported(&error) => Ok(ApplyOutcome::Unsupported {
                first: flags.disable(Direction::Restore, Capability::Acl),
            }),
            Err(error) => Err(MetadataError::new("apply ACL", path, error)),
        }
    }
}
