//! Save path: turns walker entries into records for the storage agent.
//!
//! Every saved entry produces, in order, an attributes record, an optional
//! data record, ACL and xattr records, and a signature record. Each record
//! is a header packet `"<file_index> <stream> 0"`, payload packets and an
//! end-of-data signal. Entries the walker could not handle become job
//! messages instead.
//!
//! # Examples
//!
//! ```no_run
//! use engine::{Backends, FileEntry, FileOptions, JobConfig, JobContext, SaveSession};
//!
//! # fn main() -> engine::EngineResult<()> {
//! let job = JobContext::new(JobConfig::new(), std::io::stderr());
//! let mut session = SaveSession::new(job, Vec::new(), Backends::native());
//! session.save_file(&FileEntry::classify("/etc/hosts"), &FileOptions::new())?;
//! session.finish_backup()?;
//! # Ok(())
//! # }
//! ```

mod data;
mod entry;
mod streams;

use std::fmt;
use std::io::Write;
use std::path::Path;

use checksums::{ChecksumKind, ChecksumState};
use logging::MessageKind;
use metadata::{
    AclBackend, NoAclBackend, NoXattrBackend, XattrBackend, native_acl_backend,
    native_xattr_backend,
};
use protocol::packet::{PacketWriter, Signal};
use protocol::{AttributesRecord, FileType, StatRecord, StreamType};

pub use entry::FileEntry;

use self::data::{Buffers, DataParams, open_for_read, send_data};
use self::streams::{send_acls, send_record, send_signature, send_xattrs};
use crate::accurate::{AccurateTable, FileStateEntry, NoPluginOwnership, PluginOwnership};
use crate::config::FileOptions;
use crate::error::{EngineError, EngineResult};
use crate::heartbeat::{HeartbeatMonitor, SharedWriter};
use crate::job::{CancelHandle, JobContext, JobCounters, JobStatus};
use crate::strip::strip_names;
use crate::walk::TreeWalk;

/// ACL and xattr backends used by a job.
pub struct Backends {
    acl: Box<dyn AclBackend>,
    xattr: Box<dyn XattrBackend>,
}

impl Backends {
    /// Uses the given backends.
    pub fn new(acl: Box<dyn AclBackend>, xattr: Box<dyn XattrBackend>) -> Self {
        Self { acl, xattr }
    }

    /// Backends of the running platform.
    #[must_use]
    pub fn native() -> Self {
        Self::new(native_acl_backend(), native_xattr_backend())
    }

    /// Backends that never capture or apply anything.
    #[must_use]
    pub fn none() -> Self {
        Self::new(Box::new(NoAclBackend), Box::new(NoXattrBackend))
    }

    /// ACL backend.
    pub fn acl(&self) -> &dyn AclBackend {
        self.acl.as_ref()
    }

    /// Xattr backend.
    pub fn xattr(&self) -> &dyn XattrBackend {
        self.xattr.as_ref()
    }
}

impl fmt::Debug for Backends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backends")
            .field("acl_flavors", &self.acl.flavors())
            .field("acl_os", &self.acl.os())
            .field("xattr_os", &self.xattr.os())
            .finish()
    }
}

/// What [`SaveSession::save_file`] did with an entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SaveOutcome {
    /// Records were sent under this file index.
    Sent(u32),
    /// A job message was reported instead of records.
    NotSent,
    /// Nothing was reported or sent.
    Ignored,
}

/// One backup job's connection to the storage agent.
pub struct SaveSession<W: Write, M> {
    job: JobContext<M>,
    out: PacketWriter<W>,
    backends: Backends,
    accurate: Option<AccurateTable>,
    plugin: Box<dyn PluginOwnership + Send>,
    heartbeat: Option<HeartbeatMonitor>,
    buffers: Buffers,
}

impl<W: Write, M> fmt::Debug for SaveSession<W, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaveSession")
            .field("counters", &self.job.counters())
            .field("status", &self.job.status())
            .field("backends", &self.backends)
            .field("accurate_entries", &self.accurate.as_ref().map(AccurateTable::len))
            .field("heartbeat", &self.heartbeat.is_some())
            .finish_non_exhaustive()
    }
}

impl<W: Write, M: Write> SaveSession<W, M> {
    /// Starts a session sending records on `connection`.
    pub fn new(job: JobContext<M>, connection: W, backends: Backends) -> Self {
        Self {
            job,
            out: PacketWriter::new(connection),
            backends,
            accurate: None,
            plugin: Box::new(NoPluginOwnership),
            heartbeat: None,
            buffers: Buffers::default(),
        }
    }

    /// Installs the previous backup's file list.
    ///
    /// The table is dropped unless the job is an accurate incremental or
    /// differential.
    #[must_use]
    pub fn with_accurate_table(mut self, table: AccurateTable) -> Self {
        if self.job.config().uses_accurate_table() {
            self.accurate = Some(table);
        } else {
            logging::trace_accurate!(
                debug,
                level = self.job.config().job_level().as_str(),
                "accurate table not used for this job"
            );
        }
        self
    }

    /// Lets `plugin` claim paths so they are never reported deleted.
    #[must_use]
    pub fn with_plugin_ownership(mut self, plugin: impl PluginOwnership + Send + 'static) -> Self {
        self.plugin = Box::new(plugin);
        self
    }

    /// Starts the keep-alive monitor on `coordinator` when the job has a
    /// heartbeat interval. Returns whether a monitor runs.
    pub fn start_heartbeat<C>(&mut self, coordinator: SharedWriter<C>) -> EngineResult<bool>
    where
        C: Write + Send + 'static,
    {
        let Some(interval) = self.job.config().heartbeat() else {
            return Ok(false);
        };
        if self.heartbeat.is_none() {
            let monitor =
                HeartbeatMonitor::start(coordinator, interval, self.job.last_fname_handle())?;
            self.heartbeat = Some(monitor);
        }
        Ok(true)
    }

    /// Job state.
    pub const fn job(&self) -> &JobContext<M> {
        &self.job
    }

    /// Snapshot of the job counters.
    pub const fn counters(&self) -> JobCounters {
        self.job.counters()
    }

    /// Handle that cancels this job.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.job.cancel_handle()
    }

    /// Saves one entry.
    ///
    /// Per-file problems are reported as job messages and do not fail the
    /// call. An error means the job cannot continue: the connection failed,
    /// too many errors accumulated, or the job was canceled.
    pub fn save_file(&mut self, entry: &FileEntry, options: &FileOptions) -> EngineResult<SaveOutcome> {
        let result = self.save_entry(entry, options);
        if let Err(error) = &result {
            self.fail(error);
        }
        result
    }

    /// Walks `root` and saves every entry below it, the root included.
    ///
    /// Returns the number of entries that produced records.
    pub fn save_tree(&mut self, root: &Path, options: &FileOptions) -> EngineResult<u64> {
        let mut sent = 0;
        for entry in TreeWalk::new(root) {
            if let SaveOutcome::Sent(_) = self.save_file(&entry, options)? {
                sent += 1;
            }
        }
        Ok(sent)
    }

    /// Ends the backup.
    ///
    /// Sends a deleted notice for every path of the accurate table the walk
    /// never visited, stops the keep-alive monitor and sends the final
    /// end-of-data signal. A canceled job sends no deleted notices. Returns
    /// the number of deleted notices.
    pub fn finish_backup(&mut self) -> EngineResult<u64> {
        let result = self.finish_inner();
        if let Some(mut monitor) = self.heartbeat.take() {
            monitor.stop();
        }
        if let Err(error) = &result {
            self.fail(error);
        }
        let status = self.job.conclude(&result);
        logging::trace_save!(
            info,
            status = status.as_str(),
            files = self.job.counters().files,
            errors = self.job.counters().errors,
            bytes = self.job.counters().job_bytes,
            "backup finished"
        );
        result
    }

    /// Terminal status recorded by [`finish_backup`](Self::finish_backup).
    pub const fn status(&self) -> JobStatus {
        self.job.status()
    }

    /// Consumes the session, returning the job state and the connection.
    pub fn into_parts(mut self) -> (JobContext<M>, W) {
        if let Some(mut monitor) = self.heartbeat.take() {
            monitor.stop();
        }
        (self.job, self.out.into_inner())
    }

    fn fail(&mut self, error: &EngineError) {
        match error {
            EngineError::Canceled | EngineError::TooManyErrors(_) => {}
            other => self.job.report_fatal(other),
        }
    }

    fn finish_inner(&mut self) -> EngineResult<u64> {
        let deleted = match self.accurate.take() {
            Some(table) if !self.job.is_canceled() => {
                let job = &mut self.job;
                let out = &mut self.out;
                table.drain_deleted(self.plugin.as_ref(), |path, entry| {
                    send_deleted(job, out, path, entry)
                })?
            }
            Some(table) => {
                logging::trace_accurate!(debug, unseen = table.unseen(), "job canceled; table dropped");
                0
            }
            None => 0,
        };
        self.out.signal(Signal::EndOfData)?;
        self.out.flush()?;
        self.job.flush_messages()?;
        Ok(deleted)
    }

    fn save_entry(&mut self, entry: &FileEntry, options: &FileOptions) -> EngineResult<SaveOutcome> {
        self.job.check_canceled()?;

        let Some(file_type) = self.classify(entry)? else {
            return Ok(SaveOutcome::NotSent);
        };
        if file_type == FileType::DirectoryBegin {
            return Ok(SaveOutcome::Ignored);
        }
        let shown = entry.path().display().to_string();
        if file_type == FileType::Special && entry.stat().is_socket() {
            logging::trace_save!(debug, path = %shown, "socket skipped");
            return Ok(SaveOutcome::Ignored);
        }

        let (name, link) = strip_names(
            file_type,
            &entry.record_name(file_type),
            entry.link(),
            options.strip_count(),
        );

        if let Some(table) = self.accurate.as_mut() {
            let mtime_only = options.mtime_only_enabled() || self.job.config().mtime_only_enabled();
            if !table.check_changed(&name, entry.stat(), mtime_only) {
                self.job
                    .report(MessageKind::Skipped, format!("Unchanged file skipped: {shown}"))?;
                return Ok(SaveOutcome::NotSent);
            }
        }

        self.job.flags_mut().observe_device(entry.stat().dev);

        let family = options.data_family();
        let stat = StatRecord {
            data_stream: family.stream().as_i32(),
            ..*entry.stat()
        };
        let file_index = self.job.next_file_index();
        self.job.set_last_fname(&name);
        let record = AttributesRecord {
            file_index,
            file_type,
            name,
            stat,
            link,
            extra: Vec::new(),
        };
        send_record(
            &mut self.out,
            file_index,
            StreamType::UnixAttributes,
            &record.encode(),
        )?;
        logging::trace_save!(
            debug,
            file_index,
            path = %shown,
            kind = file_type.name(),
            "attributes sent"
        );

        let mut checksum = (file_type.has_file_data()
            && options.checksum_kind() != ChecksumKind::None)
            .then(|| ChecksumState::new(options.checksum_kind()));

        if reads_content(file_type, &stat) {
            let mut file = match open_for_read(entry.path(), options.no_atime_enabled()) {
                Ok(file) => file,
                Err(error) => {
                    self.job.report_error(
                        MessageKind::NotSaved,
                        format!("Cannot open \"{shown}\": ERR={error}."),
                    )?;
                    return Ok(SaveOutcome::Sent(file_index));
                }
            };
            let params = DataParams {
                file_index,
                file_type,
                family,
                level: options.compression_level(),
                size: stat.size,
                name: &shown,
            };
            send_data(
                &mut self.job,
                &mut self.out,
                &mut file,
                &params,
                checksum.as_mut(),
                &mut self.buffers,
            )?;
        }

        if options.acl_enabled() && file_type != FileType::Symlink {
            send_acls(
                &mut self.job,
                &mut self.out,
                self.backends.acl(),
                entry.path(),
                file_index,
                stat.is_dir(),
            )?;
        }
        if options.xattr_enabled() {
            send_xattrs(
                &mut self.job,
                &mut self.out,
                self.backends.xattr(),
                entry.path(),
                file_index,
                options.acl_enabled(),
            )?;
        }

        if let Some(signature) = checksum.and_then(ChecksumState::finalize) {
            send_signature(&mut self.out, file_index, &signature)?;
        }
        Ok(SaveOutcome::Sent(file_index))
    }

    /// Reports unsavable entries and resolves the type entries are saved as.
    ///
    /// Returns `None` when the entry was reported and must not be sent.
    fn classify(&mut self, entry: &FileEntry) -> EngineResult<Option<FileType>> {
        let shown = entry.path().display();
        let top = entry
            .top_level()
            .map_or_else(String::new, |top| top.display().to_string());
        let not_saved = |what: &str| format!("{what} \"{shown}\": ERR={}", entry.error_text());

        let file_type = entry.file_type();
        match file_type {
            FileType::NoAccess => {
                self.job
                    .report_error(MessageKind::NotSaved, not_saved("Could not access"))?;
            }
            FileType::NoFollow => {
                self.job
                    .report_error(MessageKind::NotSaved, not_saved("Could not follow link"))?;
            }
            FileType::NoStat => {
                self.job
                    .report_error(MessageKind::NotSaved, not_saved("Could not stat"))?;
            }
            FileType::NoOpen => {
                self.job
                    .report_error(MessageKind::NotSaved, not_saved("Could not open directory"))?;
            }
            FileType::NoChange | FileType::DirNoChange => {
                self.job
                    .report(MessageKind::Skipped, format!("Unchanged file skipped: {shown}"))?;
            }
            FileType::IsArchive => {
                self.job
                    .report(MessageKind::Skipped, format!("Archive file not saved: {shown}"))?;
            }
            FileType::NoRecurse => {
                self.job.report(
                    MessageKind::Info,
                    format!("Recursion turned off. Will not descend from {top} into {shown}"),
                )?;
                return Ok(Some(FileType::DirectoryEnd));
            }
            FileType::NoFsChange => {
                self.job.report(
                    MessageKind::Info,
                    format!(
                        "{shown} is a different filesystem. Will not descend from {top} into it."
                    ),
                )?;
                return Ok(Some(FileType::DirectoryEnd));
            }
            FileType::InvalidFs => {
                self.job.report(
                    MessageKind::Info,
                    format!("Disallowed filesystem. Will not descend from {top} into {shown}"),
                )?;
                return Ok(Some(FileType::DirectoryEnd));
            }
            FileType::InvalidDriveType => {
                self.job.report(
                    MessageKind::Info,
                    format!("Disallowed drive type. Will not descend into {shown}"),
                )?;
                return Ok(Some(file_type));
            }
            FileType::Plugin | FileType::Deleted => {
                self.job.report_error(
                    MessageKind::NotSaved,
                    format!(
                        "Unknown file type {}; not saved: {shown}",
                        file_type.as_u32()
                    ),
                )?;
            }
            FileType::LinkSaved
            | FileType::RegularEmpty
            | FileType::Regular
            | FileType::Symlink
            | FileType::DirectoryEnd
            | FileType::Special
            | FileType::Raw
            | FileType::Fifo
            | FileType::DirectoryBegin
            | FileType::Reparse => return Ok(Some(file_type)),
        }
        Ok(None)
    }
}

/// Content is read for non-empty regular files, raw devices, fifos and
/// reparse points.
const fn reads_content(file_type: FileType, stat: &StatRecord) -> bool {
    match file_type {
        FileType::Regular => stat.size > 0,
        FileType::Raw | FileType::Fifo | FileType::Reparse => true,
        _ => false,
    }
}

fn send_deleted<W: Write, M: Write>(
    job: &mut JobContext<M>,
    out: &mut PacketWriter<W>,
    path: &[u8],
    entry: FileStateEntry,
) -> EngineResult<()> {
    let file_index = job.next_file_index();
    job.set_last_fname(path);
    let record = AttributesRecord {
        file_index,
        file_type: FileType::Deleted,
        name: path.to_vec(),
        stat: StatRecord {
            mtime: entry.mtime(),
            ctime: entry.ctime(),
            ..StatRecord::default()
        },
        link: Vec::new(),
        extra: Vec::new(),
    };
    send_record(out, file_index, StreamType::UnixAttributes, &record.encode())
}

#[cfg(test)]
mod tests;
