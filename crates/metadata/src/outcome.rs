use crate::error::MetadataError;

/// Result of replaying an ACL or xattr blob onto a path.
#[derive(Debug)]
pub enum ApplyOutcome {
    /// Everything in the blob was applied.
    Applied,
    /// Some entries could not be applied; the rest were.
    Partial(Vec<MetadataError>),
    /// The target vanished or the blob had nothing to apply.
    Skipped,
    /// The filesystem does not support the operation.
    ///
    /// `first` is `true` when this call switched the capability off, which is
    /// when callers report it.
    Unsupported {
        /// Whether this is the first report on this filesystem.
        first: bool,
    },
}

impl ApplyOutcome {
    /// Reports whether the blob was applied completely.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}
