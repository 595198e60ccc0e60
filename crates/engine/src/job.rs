//! Per-job state shared by the save and restore paths.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use logging::{MessageKind, MessageSink};
use metadata::PerFilesystemFlags;

use crate::config::JobConfig;
use crate::error::{EngineError, EngineResult};

/// Number of counted errors after which a job turns fatal.
pub const MAX_JOB_ERRORS: u64 = 1000;

/// Terminal and in-progress job states.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum JobStatus {
    /// The job is still processing entries.
    #[default]
    Running,
    /// The job completed; non-fatal errors may have been reported.
    Terminated,
    /// The job stopped on a fatal error.
    ErrorTerminated,
    /// The job was canceled.
    Canceled,
}

impl JobStatus {
    /// Returns the name used in job reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Terminated => "OK",
            Self::ErrorTerminated => "Error",
            Self::Canceled => "Canceled",
        }
    }
}

/// Running totals of a job.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct JobCounters {
    /// Files sent or restored; doubles as the last file index on save.
    pub files: u32,
    /// Per-file errors reported so far.
    pub errors: u64,
    /// Bytes read from the filesystem.
    pub read_bytes: u64,
    /// Bytes sent to the storage agent, or written on restore.
    pub job_bytes: u64,
}

/// Cloneable cancellation flag.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Creates a flag that is not set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Reports whether cancellation was requested.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// State owned by one backup or restore job.
///
/// Job messages are written through the embedded [`MessageSink`]; a failure
/// to write them is treated like any other connection failure.
#[derive(Debug)]
pub struct JobContext<M> {
    config: JobConfig,
    counters: JobCounters,
    status: JobStatus,
    cancel: CancelHandle,
    last_fname: Arc<Mutex<String>>,
    flags: PerFilesystemFlags,
    messages: MessageSink<M>,
}

impl<M> JobContext<M> {
    /// Creates the context for a job whose messages go to `messages`.
    pub fn new(config: JobConfig, messages: M) -> Self {
        Self {
            config,
            counters: JobCounters::default(),
            status: JobStatus::Running,
            cancel: CancelHandle::new(),
            last_fname: Arc::new(Mutex::new(String::new())),
            flags: PerFilesystemFlags::new(),
            messages: MessageSink::new(messages),
        }
    }

    /// Replaces the cancellation flag with one shared with a controller.
    #[must_use]
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the job configuration.
    pub const fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Returns a snapshot of the counters.
    pub const fn counters(&self) -> JobCounters {
        self.counters
    }

    /// Returns the job status.
    pub const fn status(&self) -> JobStatus {
        self.status
    }

    /// Returns a handle that cancels this job.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Reports whether the job was canceled.
    pub fn is_canceled(&self) -> bool {
        self.cancel.is_canceled()
    }

    /// Returns the shared slot holding the last processed file name.
    pub fn last_fname_handle(&self) -> Arc<Mutex<String>> {
        Arc::clone(&self.last_fname)
    }

    /// Returns the last processed file name.
    pub fn last_fname(&self) -> String {
        self.last_fname
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the per-filesystem capability flags.
    pub fn flags_mut(&mut self) -> &mut PerFilesystemFlags {
        &mut self.flags
    }

    /// Returns the message sink.
    pub const fn messages(&self) -> &MessageSink<M> {
        &self.messages
    }

    /// Consumes the context and returns the message writer.
    pub fn into_messages(self) -> M {
        self.messages.into_inner()
    }

    pub(crate) fn set_last_fname(&self, name: &[u8]) {
        let mut slot = self.last_fname.lock().unwrap_or_else(PoisonError::into_inner);
        slot.clear();
        slot.push_str(&String::from_utf8_lossy(name));
    }

    pub(crate) fn next_file_index(&mut self) -> u32 {
        self.counters.files += 1;
        self.counters.files
    }

    pub(crate) fn count_file(&mut self) {
        self.counters.files += 1;
    }

    pub(crate) fn add_read_bytes(&mut self, bytes: usize) {
        self.counters.read_bytes += bytes as u64;
    }

    pub(crate) fn add_job_bytes(&mut self, bytes: usize) {
        self.counters.job_bytes += bytes as u64;
    }

    /// Fails with [`EngineError::Canceled`] once cancellation was requested.
    pub(crate) fn check_canceled(&mut self) -> EngineResult<()> {
        if self.cancel.is_canceled() {
            self.status = JobStatus::Canceled;
            return Err(EngineError::Canceled);
        }
        Ok(())
    }

    /// Records the terminal status for `result` and returns it.
    pub fn conclude<T>(&mut self, result: &EngineResult<T>) -> JobStatus {
        self.status = match result {
            Ok(_) if self.status == JobStatus::Running => JobStatus::Terminated,
            Ok(_) => self.status,
            Err(EngineError::Canceled) => JobStatus::Canceled,
            Err(_) => JobStatus::ErrorTerminated,
        };
        self.status
    }
}

impl<M: Write> JobContext<M> {
    /// Sends a job message without touching the error counter.
    pub(crate) fn report(&mut self, kind: MessageKind, text: impl Into<String>) -> EngineResult<()> {
        self.messages.emit(kind, text).map_err(message_channel_error)
    }

    /// Sends a job message and counts it as a per-file error.
    ///
    /// Once more than [`MAX_JOB_ERRORS`] errors were counted the job turns
    /// fatal.
    pub(crate) fn report_error(
        &mut self,
        kind: MessageKind,
        text: impl Into<String>,
    ) -> EngineResult<()> {
        self.report(kind, text)?;
        self.count_error()
    }

    pub(crate) fn count_error(&mut self) -> EngineResult<()> {
        self.counters.errors += 1;
        if self.counters.errors > MAX_JOB_ERRORS {
            self.report(MessageKind::Fatal, "Too many errors.")?;
            self.status = JobStatus::ErrorTerminated;
            return Err(EngineError::TooManyErrors(self.counters.errors));
        }
        Ok(())
    }

    /// Sends a fatal job message and marks the job failed.
    pub(crate) fn report_fatal(&mut self, error: &EngineError) {
        self.status = JobStatus::ErrorTerminated;
        if let Err(write_error) = self.messages.emit(MessageKind::Fatal, error.to_string()) {
            logging::trace_wire!(warn, %write_error, "cannot deliver fatal job message");
        }
    }

    /// Flushes pending job messages.
    pub fn flush_messages(&mut self) -> EngineResult<()> {
        self.messages.flush().map_err(message_channel_error)
    }
}

fn message_channel_error(error: io::Error) -> EngineError {
    EngineError::Io(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> JobContext<Vec<u8>> {
        JobContext::new(JobConfig::new(), Vec::new())
    }

    #[test]
    fn file_indexes_start_at_one() {
        let mut job = context();
        assert_eq!(job.next_file_index(), 1);
        assert_eq!(job.next_file_index(), 2);
        assert_eq!(job.counters().files, 2);
    }

    #[test]
    fn last_fname_is_shared() {
        let job = context();
        let handle = job.last_fname_handle();
        job.set_last_fname(b"/etc/passwd");
        assert_eq!(handle.lock().expect("lock").as_str(), "/etc/passwd");
        assert_eq!(job.last_fname(), "/etc/passwd");
    }

    #[test]
    fn cancellation_is_observed_through_clones() {
        let mut job = context();
        let cancel = job.cancel_handle();
        assert!(job.check_canceled().is_ok());
        cancel.cancel();
        assert!(job.is_canceled());
        assert!(matches!(job.check_canceled(), Err(EngineError::Canceled)));
        assert_eq!(job.status(), JobStatus::Canceled);
    }

    #[test]
    fn reports_are_rendered_and_counted() {
        let mut job = context();
        job.report(MessageKind::Skipped, "Unchanged file skipped: /a")
            .expect("report");
        job.report_error(MessageKind::NotSaved, "Could not stat \"/b\"")
            .expect("report");
        assert_eq!(job.counters().errors, 1);
        assert_eq!(job.messages().counts().get(MessageKind::NotSaved), 1);
        let text = String::from_utf8(job.into_messages()).expect("utf8");
        assert!(text.contains("Unchanged file skipped: /a"));
        assert!(text.contains("Could not stat \"/b\""));
    }

    #[test]
    fn error_ceiling_turns_fatal() {
        let mut job = context();
        for _ in 0..MAX_JOB_ERRORS {
            job.count_error().expect("below ceiling");
        }
        let err = job.count_error().expect_err("ceiling");
        assert!(matches!(err, EngineError::TooManyErrors(1001)));
        assert_eq!(job.status(), JobStatus::ErrorTerminated);
    }

    #[test]
    fn conclude_maps_results_to_status() {
        let mut job = context();
        assert_eq!(job.conclude(&Ok::<(), EngineError>(())), JobStatus::Terminated);

        let mut job = context();
        assert_eq!(
            job.conclude(&Err::<(), _>(EngineError::Canceled)),
            JobStatus::Canceled
        );

        let mut job = context();
        assert_eq!(
            job.conclude(&Err::<(), _>(EngineError::fatal("lost connection"))),
            JobStatus::ErrorTerminated
        );
    }
}
