//! Common error types for the engine crate.
//!
//! Only conditions that end a job surface as [`EngineError`]. Per-file
//! failures are reported as job messages and counted, and the job moves on.

use std::io;

use protocol::ProtocolError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that terminate a backup or restore job.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The connection to a peer failed.
    #[error("network error: {0}")]
    Io(#[from] io::Error),
    /// The peer sent something that violates the record protocol.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// The change-detection table could not be allocated.
    #[error("cannot allocate accurate table for {entries} entries")]
    TableAllocation {
        /// Requested capacity.
        entries: usize,
    },
    /// A restore record disagreed with its header about the file index.
    #[error("record header file index {header} not equal record index {record}")]
    FileIndexMismatch {
        /// Index carried by the `rechdr` header.
        header: u32,
        /// Index carried by the attributes record.
        record: u32,
    },
    /// A restore payload did not have the length announced by its header.
    #[error("actual data size {actual} not same as header {expected}")]
    PayloadSizeMismatch {
        /// Length announced by the header.
        expected: u64,
        /// Length of the packet that followed.
        actual: usize,
    },
    /// The per-job error ceiling was exceeded.
    #[error("too many errors ({0})")]
    TooManyErrors(u64),
    /// Any other condition reported as fatal to the coordinator.
    #[error("{0}")]
    Fatal(String),
    /// The job was canceled.
    #[error("job canceled")]
    Canceled,
}

impl EngineError {
    /// Builds a [`EngineError::Fatal`] from a message.
    #[must_use]
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal(message.into())
    }

    /// Reports whether the error represents a cancellation rather than a failure.
    #[must_use]
    pub const fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}
