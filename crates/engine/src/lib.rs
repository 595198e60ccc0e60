#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Data movement of the file daemon.
//!
//! - [`accurate`]: the previous backup's file list, used to skip unchanged
//!   files and to report deletions at the end of an incremental job.
//! - [`SaveSession`]: turns [`FileEntry`] values produced by [`TreeWalk`]
//!   into attribute, data, ACL, xattr and signature records.
//! - [`RestoreSession`]: replays records relayed by the storage agent onto
//!   the local filesystem through a [`CreationPolicy`].
//! - [`JobContext`]: counters, job messages, cancellation and the
//!   per-filesystem capability flags shared by both directions.
//! - [`HeartbeatMonitor`]: keeps the coordinator connection alive while a
//!   long file is being read.
//!
//! Per-file problems never fail a job; they become job messages and are
//! counted. Only [`EngineError`] values end it.

pub mod accurate;
mod config;
mod error;
mod heartbeat;
mod job;
#[cfg(unix)]
mod restore;
#[cfg(unix)]
mod save;
mod strip;
#[cfg(all(test, unix))]
mod test_backends;
#[cfg(unix)]
mod walk;

pub use accurate::{
    AccurateTable, FileStateEntry, NoPluginOwnership, PluginOwnership, ingest_accurate_list,
};
pub use config::{
    DEFAULT_BLOCK_SIZE, FileOptions, JobConfig, JobLevel, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE,
};
pub use error::{EngineError, EngineResult};
pub use heartbeat::{HeartbeatMonitor, SharedWriter};
pub use job::{CancelHandle, JobContext, JobCounters, JobStatus, MAX_JOB_ERRORS};
#[cfg(unix)]
pub use restore::{
    CreateOutcome, CreationPolicy, LocalFilesystem, RestoreSession, RestoreState,
    RestoreSummary,
};
#[cfg(unix)]
pub use save::{Backends, FileEntry, SaveOutcome, SaveSession};
pub use strip::{strip_components, strip_names};
#[cfg(unix)]
pub use walk::TreeWalk;
