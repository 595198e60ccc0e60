//! Per-filesystem capability flags.
//!
//! Native ACL and xattr handling is switched off for the rest of a filesystem
//! once it reports the operation as unsupported, and switched back on when
//! the job moves to another device. Probing therefore happens at most once
//! per filesystem per job.

/// Which half of a job a capability applies to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Direction {
    /// Capturing metadata during a backup.
    Save,
    /// Applying metadata during a restore.
    Restore,
}

/// A native metadata capability.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Capability {
    /// Access control lists.
    Acl,
    /// Extended attributes.
    Xattr,
}

/// Capability state for the filesystem currently being processed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PerFilesystemFlags {
    current_device: Option<u64>,
    save_native_acl: bool,
    save_native_xattr: bool,
    restore_native_acl: bool,
    restore_native_xattr: bool,
}

impl Default for PerFilesystemFlags {
    fn default() -> Self {
        Self::new()
    }
}

impl PerFilesystemFlags {
    /// Creates flags with every capability enabled and no device seen yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current_device: None,
            save_native_acl: true,
            save_native_xattr: true,
            restore_native_acl: true,
            restore_native_xattr: true,
        }
    }

    /// Records the device of the entry about to be processed.
    ///
    /// Returns `true` when the device differs from the previous one, in which
    /// case every capability is enabled again.
    pub fn observe_device(&mut self, device: u64) -> bool {
        if self.current_device == Some(device) {
            return false;
        }
        *self = Self::new();
        self.current_device = Some(device);
        true
    }

    /// Device of the most recently observed entry.
    #[must_use]
    pub const fn current_device(&self) -> Option<u64> {
        self.current_device
    }

    /// Reports whether `capability` is still enabled for `direction`.
    #[must_use]
    pub const fn is_enabled(&self, direction: Direction, capability: Capability) -> bool {
        match (direction, capability) {
            (Direction::Save, Capability::Acl) => self.save_native_acl,
            (Direction::Save, Capability::Xattr) => self.save_native_xattr,
            (Direction::Restore, Capability::Acl) => self.restore_native_acl,
            (Direction::Restore, Capability::Xattr) => self.restore_native_xattr,
        }
    }

    /// Switches `capability` off for `direction`.
    ///
    /// Returns `true` if it was enabled before the call, so callers can warn
    /// exactly once per filesystem.
    pub fn disable(&mut self, direction: Direction, capability: Capability) -> bool {
        let slot = match (direction, capability) {
            (Direction::Save, Capability::Acl) => &mut self.save_native_acl,
            (Direction::Save, Capability::Xattr) => &mut self.save_native_xattr,
            (Direction::Restore, Capability::Acl) => &mut self.restore_native_acl,
            (Direction::Restore, Capability::Xattr) => &mut self.restore_native_xattr,
        };
        std::mem::replace(slot, false)
    }
}
