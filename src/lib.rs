#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Backup and restore data movement of a file daemon.
//!
//! A backup walks the filesystem and sends each file to the storage agent as
//! a sequence of records: attributes, content, ACLs, extended attributes and
//! a signature. A restore reads the same records back and recreates the
//! files. In accurate incremental jobs the previous backup's file list is
//! used to skip unchanged files and to report deleted ones.
//!
//! The workspace crates are re-exported as modules; the job-level API of
//! [`engine`] is also available at the crate root.
//!
//! ```no_run
//! use filed::{Backends, FileOptions, JobConfig, JobContext, RestoreSession, SaveSession};
//!
//! # fn main() -> filed::EngineResult<()> {
//! let job = JobContext::new(JobConfig::new(), std::io::stderr());
//! let mut save = SaveSession::new(job, Vec::new(), Backends::native());
//! save.save_tree("/etc".as_ref(), &FileOptions::new().acl(true).xattr(true))?;
//! save.finish_backup()?;
//!
//! let config = JobConfig::new().restore_location(Some("/tmp/restore"));
//! let mut restore = RestoreSession::new(JobContext::new(config, std::io::stderr()), Backends::native());
//! # let relayed: &[u8] = &[];
//! let summary = restore.run(relayed)?;
//! println!("{} files restored", summary.files);
//! # Ok(())
//! # }
//! ```

/// Digest computation over file content.
pub use checksums;
/// Per-block zlib compression.
pub use compress;
/// Change detection, save path and restore path.
pub use engine;
/// Job messages and tracing setup.
pub use logging;
/// ACL and extended attribute backends, attribute application.
pub use metadata;
/// Packet framing, stream types and record codecs.
pub use protocol;

pub use engine::{
    AccurateTable, CancelHandle, EngineError, EngineResult, FileOptions, JobConfig, JobContext,
    JobCounters, JobLevel, JobStatus,
};
#[cfg(unix)]
pub use engine::{
    Backends, CreateOutcome, CreationPolicy, FileEntry, LocalFilesystem, RestoreSession,
    RestoreSummary, SaveOutcome, SaveSession, TreeWalk,
};
