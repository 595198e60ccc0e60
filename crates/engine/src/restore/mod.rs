//! Restore path: replays records relayed by the storage agent.
//!
//! Each record arrives as a `rechdr` header packet followed by exactly one
//! payload packet. An attributes record opens a file entry; data, ACL and
//! xattr records that follow with the same file index belong to it. The
//! entry is finished, with its size checked and its attributes applied,
//! when the next attributes record or the end of the stream arrives.
//!
//! ACL and xattr records of a file whose content is still being extracted
//! are held back and applied after its attributes, so changing the mode
//! afterwards cannot clobber them. A blob larger than one packet arrives as
//! consecutive records with the same file index and stream; they are joined
//! before the blob is used.

mod policy;
#[cfg(test)]
mod tests;

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::unix::fs::MetadataExt;
use std::path::{Display, Path, PathBuf};

use compress::zlib::BlockDecompressor;
use logging::MessageKind;
use metadata::{
    ApplyOutcome, Capability, Direction, MetadataError, apply_attributes, verify_size,
};
use protocol::packet::{PacketKind, PacketReader, Signal};
use protocol::{
    AclFlavor, AclStream, AttributesRecord, DataFamily, FileType, OsFamily, ProtocolError,
    StatRecord, StoredRecordHeader, StreamClass, StreamType, split_sparse_payload,
};

pub use policy::{CreateOutcome, CreationPolicy, LocalFilesystem};

use self::policy::target_path;
use crate::config::MAX_BLOCK_SIZE;
use crate::error::{EngineError, EngineResult};
use crate::job::{CancelHandle, JobContext, JobStatus};
use crate::save::Backends;

/// Where the restore state machine stands.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RestoreState {
    /// No record received yet.
    Idle,
    /// Waiting for the next attributes record; content records of a file
    /// that is not being extracted are discarded.
    ExpectingAttributes,
    /// Extracting content of the given family into the open file.
    ExpectingData(DataFamily),
    /// The stream ended.
    Done,
}

/// End-of-job totals of a restore.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RestoreSummary {
    /// Entries created.
    pub files: u32,
    /// Content bytes written.
    pub bytes: u64,
    /// Per-file errors.
    pub errors: u64,
    /// Files skipped because their data stream cannot be extracted here.
    pub non_support_data: u64,
    /// Attribute streams that cannot be applied here.
    pub non_support_attr: u64,
    /// ACL records from another platform or of an unsupported flavor.
    pub non_support_acl: u64,
    /// Xattr records from another platform.
    pub non_support_xattr: u64,
    /// Records that arrived out of order and were discarded.
    pub protocol_warnings: u64,
    /// Terminal job status.
    pub status: JobStatus,
}

/// Metadata record held back until its file is closed.
#[derive(Debug)]
enum Delayed {
    Acl(AclFlavor, Vec<u8>),
    Xattr(Vec<u8>),
}

/// ACL or xattr blob collected from consecutive records.
#[derive(Debug)]
struct Fragments {
    header: StoredRecordHeader,
    stream: StreamType,
    payload: Vec<u8>,
}

#[derive(Debug)]
struct Output {
    file: File,
    family: DataFamily,
    position: u64,
}

/// The entry opened by the most recent attributes record.
#[derive(Debug)]
struct CurrentFile {
    file_index: u32,
    file_type: FileType,
    target: PathBuf,
    stat: StatRecord,
    /// Whether the entry exists on disk, so metadata may be applied to it.
    restored: bool,
    output: Option<Output>,
    delayed: Vec<Delayed>,
}

impl CurrentFile {
    fn display(&self) -> Display<'_> {
        self.target.display()
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Ignored {
    data: u64,
    attr: u64,
    acl: u64,
    xattr: u64,
    protocol: u64,
    program_streams: bool,
}

/// One restore job reading records from the storage agent.
#[derive(Debug)]
pub struct RestoreSession<M, P = LocalFilesystem> {
    job: JobContext<M>,
    backends: Backends,
    policy: P,
    state: RestoreState,
    current: Option<CurrentFile>,
    fragments: Option<Fragments>,
    inflater: BlockDecompressor,
    ignored: Ignored,
}

impl<M: Write> RestoreSession<M, LocalFilesystem> {
    /// Restores into the local filesystem below the job's restore location.
    pub fn new(job: JobContext<M>, backends: Backends) -> Self {
        let policy = LocalFilesystem::new(job.config().restore_root());
        Self::with_policy(job, backends, policy)
    }
}

impl<M: Write, P: CreationPolicy> RestoreSession<M, P> {
    /// Restores through a caller-supplied creation policy.
    pub fn with_policy(job: JobContext<M>, backends: Backends, policy: P) -> Self {
        Self {
            job,
            backends,
            policy,
            state: RestoreState::Idle,
            current: None,
            fragments: None,
            inflater: BlockDecompressor::new(MAX_BLOCK_SIZE),
            ignored: Ignored::default(),
        }
    }

    /// Current state of the record state machine.
    pub const fn state(&self) -> RestoreState {
        self.state
    }

    /// Job state.
    pub const fn job(&self) -> &JobContext<M> {
        &self.job
    }

    /// Handle that cancels this job.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.job.cancel_handle()
    }

    /// Consumes the session and returns the job state.
    pub fn into_job(self) -> JobContext<M> {
        self.job
    }

    /// Totals so far.
    pub fn summary(&self) -> RestoreSummary {
        let counters = self.job.counters();
        RestoreSummary {
            files: counters.files,
            bytes: counters.job_bytes,
            errors: counters.errors,
            non_support_data: self.ignored.data,
            non_support_attr: self.ignored.attr,
            non_support_acl: self.ignored.acl,
            non_support_xattr: self.ignored.xattr,
            protocol_warnings: self.ignored.protocol,
            status: self.job.status(),
        }
    }

    /// Reads records from `connection` until the storage agent ends the
    /// stream, then finishes the last file and reports the summary.
    ///
    /// Per-file problems are job messages. An error means the job failed:
    /// the connection broke, a header was malformed or disagreed with its
    /// payload, too many errors accumulated, or the job was canceled.
    pub fn run<R: Read>(&mut self, connection: R) -> EngineResult<RestoreSummary> {
        let mut reader = PacketReader::new(connection);
        let result = self
            .receive(&mut reader)
            .and_then(|()| self.end_of_stream());
        if let Err(error) = &result {
            self.current = None;
            self.fragments = None;
            match error {
                EngineError::Canceled | EngineError::TooManyErrors(_) => {}
                other => self.job.report_fatal(other),
            }
        }
        let status = self.job.conclude(&result);
        let summary = self.summary();
        logging::trace_restore!(
            info,
            status = status.as_str(),
            files = summary.files,
            bytes = summary.bytes,
            errors = summary.errors,
            "restore finished"
        );
        result.map(|()| summary)
    }

    fn receive<R: Read>(&mut self, reader: &mut PacketReader<R>) -> EngineResult<()> {
        loop {
            self.job.check_canceled()?;
            let header = match reader.recv()? {
                None | Some(PacketKind::Signal(Signal::EndOfData)) => return Ok(()),
                Some(PacketKind::Signal(Signal::Heartbeat)) => continue,
                Some(PacketKind::Signal(other)) => {
                    return Err(EngineError::fatal(format!(
                        "Unexpected signal {other} from storage agent"
                    )));
                }
                Some(PacketKind::Data(_)) => StoredRecordHeader::parse(reader.payload())?,
            };
            match reader.recv()? {
                Some(PacketKind::Data(len)) if len as u64 == header.size => {}
                Some(PacketKind::Data(len)) => {
                    return Err(EngineError::PayloadSizeMismatch {
                        expected: header.size,
                        actual: len,
                    });
                }
                Some(PacketKind::Signal(_)) | None => {
                    return Err(EngineError::fatal(format!(
                        "Data record error: no payload for file index {}",
                        header.file_index
                    )));
                }
            }
            self.handle_record(&header, reader.payload())?;
        }
    }

    fn handle_record(&mut self, header: &StoredRecordHeader, payload: &[u8]) -> EngineResult<()> {
        logging::trace_wire!(
            trace,
            file_index = header.file_index,
            stream = header.stream,
            size = header.size,
            "record received"
        );
        if let Some(pending) = self.fragments.as_mut() {
            if pending.header.file_index == header.file_index
                && pending.header.stream == header.stream
            {
                pending.payload.extend_from_slice(payload);
                return Ok(());
            }
        }
        self.flush_fragments()?;
        let Some(stream) = StreamType::from_i32(header.stream) else {
            self.close_current()?;
            return self.job.report(
                MessageKind::Warning,
                format!("Unknown stream={} ignored. This shouldn't happen!", header.stream),
            );
        };
        match stream.class() {
            StreamClass::Attributes => self.attributes_record(header, payload),
            StreamClass::Data(family) => self.data_record(header, stream, family, payload),
            StreamClass::UnsupportedData => {
                logging::trace_restore!(debug, file_index = header.file_index, %stream, "content discarded");
                Ok(())
            }
            StreamClass::Md5Digest | StreamClass::Sha1Digest | StreamClass::OtherDigest => Ok(()),
            StreamClass::Acl(_) | StreamClass::Xattr(_) => {
                self.fragments = Some(Fragments {
                    header: *header,
                    stream,
                    payload: payload.to_vec(),
                });
                Ok(())
            }
            StreamClass::ProgramNames | StreamClass::ProgramData => {
                if self.ignored.program_streams {
                    return Ok(());
                }
                self.ignored.program_streams = true;
                self.job
                    .report(MessageKind::Info, "Got Program Name or Data Stream. Ignored.")
            }
            StreamClass::UnsupportedAttributes => {
                self.ignored.attr += 1;
                Ok(())
            }
        }
    }

    fn attributes_record(&mut self, header: &StoredRecordHeader, payload: &[u8]) -> EngineResult<()> {
        self.close_current()?;
        self.state = RestoreState::ExpectingAttributes;

        let attrs = AttributesRecord::decode(payload)?;
        if attrs.file_index != header.file_index {
            return Err(EngineError::FileIndexMismatch {
                header: header.file_index,
                record: attrs.file_index,
            });
        }
        let target = target_path(self.job.config().restore_root(), &attrs.name);
        let mut current = CurrentFile {
            file_index: attrs.file_index,
            file_type: attrs.file_type,
            target,
            stat: attrs.stat,
            restored: false,
            output: None,
            delayed: Vec::new(),
        };

        let data_stream = attrs.data_stream();
        let family = match StreamType::from_i32(data_stream).map(StreamType::class) {
            _ if data_stream == 0 => DataFamily::Plain,
            Some(StreamClass::Data(family)) => family,
            _ => {
                self.ignored.data += 1;
                if self.ignored.data == 1 {
                    let name = StreamType::from_i32(data_stream).map_or("UNKNOWN", StreamType::name);
                    self.job.report(
                        MessageKind::Error,
                        format!("{name} stream not supported on this Client."),
                    )?;
                }
                self.current = Some(current);
                return Ok(());
            }
        };

        self.job.set_last_fname(&attrs.name);
        let outcome = match self.policy.create(&attrs, &current.target) {
            Ok(outcome) => outcome,
            Err(error) => {
                let text = format!("Could not create \"{}\": ERR={error}", current.display());
                self.current = Some(current);
                return self.job.report_error(MessageKind::Error, text);
            }
        };
        match outcome {
            CreateOutcome::Skip => {}
            CreateOutcome::Created => {
                self.job.count_file();
                current.restored = true;
                self.observe_target(&current);
                let result = apply_attributes(&current.target, &current.stat);
                self.report_metadata_error(result)?;
            }
            CreateOutcome::Extract(file) => {
                self.job.count_file();
                current.restored = true;
                self.observe_target(&current);
                current.output = Some(Output {
                    file,
                    family,
                    position: 0,
                });
                self.state = RestoreState::ExpectingData(family);
            }
        }
        logging::trace_restore!(
            debug,
            file_index = current.file_index,
            path = %current.display(),
            kind = current.file_type.name(),
            restored = current.restored,
            "attributes received"
        );
        self.current = Some(current);
        Ok(())
    }

    fn data_record(
        &mut self,
        header: &StoredRecordHeader,
        stream: StreamType,
        family: DataFamily,
        payload: &[u8],
    ) -> EngineResult<()> {
        let belongs = self
            .current
            .as_ref()
            .is_some_and(|current| current.file_index == header.file_index);
        match self.state {
            RestoreState::ExpectingData(expected) if belongs && expected == family => {
                self.extract(payload)
            }
            RestoreState::ExpectingAttributes if belongs => Ok(()),
            _ => {
                self.ignored.protocol += 1;
                if let Some(current) = self.current.as_mut() {
                    current.output = None;
                    current.delayed.clear();
                }
                self.state = RestoreState::ExpectingAttributes;
                self.job.report(
                    MessageKind::Warning,
                    format!(
                        "Unexpected {stream} record for file index {} ignored; waiting for the next attributes record.",
                        header.file_index
                    ),
                )
            }
        }
    }

    fn extract(&mut self, payload: &[u8]) -> EngineResult<()> {
        let Some(current) = self.current.as_mut() else {
            return Ok(());
        };
        let Some(output) = current.output.as_mut() else {
            return Ok(());
        };
        match write_block(output, &mut self.inflater, payload) {
            Ok(written) => {
                self.job.add_job_bytes(written);
                Ok(())
            }
            Err(failure) => {
                let text = failure.describe(&current.display().to_string());
                current.output = None;
                current.delayed.clear();
                self.state = RestoreState::ExpectingAttributes;
                self.job.report_error(MessageKind::Error, text)
            }
        }
    }

    /// Hands a completed ACL or xattr blob to its file.
    fn flush_fragments(&mut self) -> EngineResult<()> {
        let Some(Fragments {
            header,
            stream,
            payload,
        }) = self.fragments.take()
        else {
            return Ok(());
        };
        match stream.class() {
            StreamClass::Acl(acl) => {
                let Some(flavor) = self.acl_flavor(&header, stream, acl)? else {
                    return Ok(());
                };
                self.metadata_record(&header, Delayed::Acl(flavor, payload))
            }
            StreamClass::Xattr(os) => {
                if !self.xattr_accepted(&header, stream, os)? {
                    return Ok(());
                }
                self.metadata_record(&header, Delayed::Xattr(payload))
            }
            _ => Ok(()),
        }
    }

    /// Checks that an ACL record can be replayed here and returns the local
    /// flavor to apply it as.
    fn acl_flavor(
        &mut self,
        header: &StoredRecordHeader,
        stream: StreamType,
        acl: AclStream,
    ) -> EngineResult<Option<AclFlavor>> {
        if !acl.is_native_to(OsFamily::current()) {
            self.ignored.acl += 1;
            let path = self.record_path(header);
            self.job.report(
                MessageKind::Warning,
                format!("Can't restore ACLs of {path} - incompatible acl stream encountered - {stream}"),
            )?;
            return Ok(None);
        }
        if !self.backends.acl().supports(acl.flavor) {
            self.ignored.acl += 1;
            logging::trace_acl!(debug, %stream, "acl flavor not supported by this client");
            return Ok(None);
        }
        Ok(Some(acl.flavor))
    }

    fn xattr_accepted(
        &mut self,
        header: &StoredRecordHeader,
        stream: StreamType,
        os: OsFamily,
    ) -> EngineResult<bool> {
        if Some(os) != OsFamily::current() {
            self.ignored.xattr += 1;
            let path = self.record_path(header);
            self.job.report(
                MessageKind::Warning,
                format!(
                    "Can't restore Extended Attributes of {path} - incompatible xattr stream encountered - {stream}"
                ),
            )?;
            return Ok(false);
        }
        if self.backends.xattr().os() != Some(os) {
            self.ignored.xattr += 1;
            logging::trace_xattr!(debug, %stream, "xattr restore not supported by this client");
            return Ok(false);
        }
        Ok(true)
    }

    fn record_path(&self, header: &StoredRecordHeader) -> String {
        self.current
            .as_ref()
            .filter(|current| current.file_index == header.file_index)
            .map_or_else(
                || format!("file index {}", header.file_index),
                |current| current.display().to_string(),
            )
    }

    /// Applies an ACL or xattr record now, or holds it back while the file's
    /// content is still being written.
    fn metadata_record(&mut self, header: &StoredRecordHeader, record: Delayed) -> EngineResult<()> {
        let Some(current) = self
            .current
            .as_mut()
            .filter(|current| current.file_index == header.file_index && current.restored)
        else {
            logging::trace_restore!(debug, file_index = header.file_index, "metadata of unrestored file discarded");
            return Ok(());
        };
        if current.output.is_some() {
            current.delayed.push(record);
            return Ok(());
        }
        let target = current.target.clone();
        self.apply_metadata(&target, record)
    }

    fn apply_metadata(&mut self, target: &Path, record: Delayed) -> EngineResult<()> {
        match record {
            Delayed::Acl(flavor, blob) => {
                if !self.job.flags_mut().is_enabled(Direction::Restore, Capability::Acl) {
                    return Ok(());
                }
                let result =
                    self.backends
                        .acl()
                        .parse_and_apply(target, flavor, &blob, self.job.flags_mut());
                self.settle("ACL", target, result)
            }
            Delayed::Xattr(blob) => {
                if !self.job.flags_mut().is_enabled(Direction::Restore, Capability::Xattr) {
                    return Ok(());
                }
                let result = self
                    .backends
                    .xattr()
                    .parse_and_apply(target, &blob, self.job.flags_mut());
                self.settle("Extended attribute", target, result)
            }
        }
    }

    fn settle(
        &mut self,
        what: &str,
        target: &Path,
        result: Result<ApplyOutcome, MetadataError>,
    ) -> EngineResult<()> {
        match result {
            Ok(ApplyOutcome::Applied | ApplyOutcome::Skipped) => Ok(()),
            Ok(ApplyOutcome::Partial(errors)) => {
                for error in errors {
                    self.job.report_error(MessageKind::Error, error.to_string())?;
                }
                Ok(())
            }
            Ok(ApplyOutcome::Unsupported { first: true }) => self.job.report(
                MessageKind::Warning,
                format!(
                    "{what} support not enabled on the filesystem of \"{}\"; not restored",
                    target.display()
                ),
            ),
            Ok(ApplyOutcome::Unsupported { first: false }) => Ok(()),
            Err(error) => self.job.report_error(MessageKind::Error, error.to_string()),
        }
    }

    fn report_metadata_error(&mut self, result: Result<(), MetadataError>) -> EngineResult<()> {
        match result {
            Ok(()) => Ok(()),
            Err(error) => self.job.report_error(MessageKind::Error, error.to_string()),
        }
    }

    fn observe_target(&mut self, current: &CurrentFile) {
        if let Ok(meta) = fs::symlink_metadata(&current.target) {
            self.job.flags_mut().observe_device(meta.dev());
        }
    }

    /// Finishes the current entry: closes an extracted file, checks its size,
    /// applies its attributes and then the metadata held back for it.
    fn close_current(&mut self) -> EngineResult<()> {
        let Some(mut current) = self.current.take() else {
            return Ok(());
        };
        let Some(output) = current.output.take() else {
            return Ok(());
        };
        drop(output);
        let size = verify_size(&current.target, current.stat.size);
        self.report_metadata_error(size)?;
        let attributes = apply_attributes(&current.target, &current.stat);
        self.report_metadata_error(attributes)?;
        for record in std::mem::take(&mut current.delayed) {
            self.apply_metadata(&current.target, record)?;
        }
        Ok(())
    }

    fn end_of_stream(&mut self) -> EngineResult<()> {
        self.flush_fragments()?;
        self.close_current()?;
        self.state = RestoreState::Done;
        let ignored = self.ignored;
        if ignored.data > 0 || ignored.attr > 0 {
            self.job.report(
                MessageKind::Warning,
                format!(
                    "{} non-supported data streams and {} non-supported attrib streams ignored.",
                    ignored.data, ignored.attr
                ),
            )?;
        }
        if ignored.acl > 0 {
            self.job.report(
                MessageKind::Info,
                format!("{} non-supported acl streams ignored.", ignored.acl),
            )?;
        }
        if ignored.xattr > 0 {
            self.job.report(
                MessageKind::Info,
                format!("{} non-supported xattr streams ignored.", ignored.xattr),
            )?;
        }
        if ignored.protocol > 0 {
            self.job.report(
                MessageKind::Warning,
                format!("{} out-of-order records ignored.", ignored.protocol),
            )?;
        }
        self.job.flush_messages()
    }
}

/// Why a content block could not be written.
#[derive(Debug)]
enum BlockFailure {
    Corrupt(ProtocolError),
    Seek(u64, io::Error),
    Inflate(io::Error),
    Write(io::Error),
}

impl BlockFailure {
    fn describe(&self, path: &str) -> String {
        match self {
            Self::Corrupt(error) => format!("Data record error on {path}: ERR={error}"),
            Self::Seek(offset, error) => format!("Seek to {offset} error on {path}: ERR={error}"),
            Self::Inflate(error) => format!("Uncompression error on file {path}. ERR={error}"),
            Self::Write(error) => format!("Write error on {path}: ERR={error}"),
        }
    }
}

/// Writes one content block and returns the number of bytes written.
fn write_block(
    output: &mut Output,
    inflater: &mut BlockDecompressor,
    payload: &[u8],
) -> Result<usize, BlockFailure> {
    let (offset, data) = if output.family.is_sparse() {
        split_sparse_payload(payload).map_err(BlockFailure::Corrupt)?
    } else {
        (output.position, payload)
    };
    if offset != output.position {
        output
            .file
            .seek(SeekFrom::Start(offset))
            .map_err(|error| BlockFailure::Seek(offset, error))?;
    }
    let data = if output.family.is_compressed() {
        inflater.decompress(data).map_err(BlockFailure::Inflate)?
    } else {
        data
    };
    output.file.write_all(data).map_err(BlockFailure::Write)?;
    output.position = offset + data.len() as u64;
    Ok(data.len())
}
