#![deny(unsafe_code)]

//! Helpers shared by the workspace's tests.
//!
//! - capability probes that let filesystem-dependent tests skip cleanly;
//! - [`StorageRelay`], which turns what the save path sends into what a
//!   storage agent would send back on restore;
//! - small builders for scratch trees and sparse files.

use std::fs::{self, File};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;

use protocol::packet::{PacketKind, PacketReader, PacketWriter, Signal};
use protocol::{RecordHeader, StoredRecordHeader};
use tempfile::TempDir;

/// Reports whether `path` accepts `user.*` extended attributes.
#[cfg(unix)]
#[must_use]
pub fn xattrs_supported(path: &Path) -> bool {
    let name = "user.test_support";
    match xattr::set(path, name, b"probe") {
        Ok(()) => {
            let _ = xattr::remove(path, name);
            true
        }
        Err(_) => false,
    }
}

/// Reports whether `path` accepts `user.*` extended attributes.
#[cfg(not(unix))]
#[must_use]
pub fn xattrs_supported(_path: &Path) -> bool {
    false
}

/// Reports whether POSIX access ACLs can be read and written on `path`.
#[cfg(any(target_os = "linux", target_os = "freebsd"))]
#[must_use]
pub fn acls_supported(path: &Path) -> bool {
    use exacl::AclOption;

    exacl::getfacl(path, AclOption::ACCESS_ACL)
        .and_then(|entries| exacl::setfacl(&[path], &entries, AclOption::ACCESS_ACL))
        .is_ok()
}

/// Reports whether POSIX access ACLs can be read and written on `path`.
#[cfg(not(any(target_os = "linux", target_os = "freebsd")))]
#[must_use]
pub fn acls_supported(_path: &Path) -> bool {
    false
}

/// Creates a temporary directory holding `files`, given as relative path and
/// contents. Parent directories are created as needed.
pub fn scratch_tree(files: &[(&str, &[u8])]) -> io::Result<TempDir> {
    let dir = tempfile::tempdir()?;
    for (relative, contents) in files {
        let path = dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
    }
    Ok(dir)
}

/// Writes a file of `len` bytes that is zero except for `extents`.
///
/// Only the extents are written, so the file is sparse on filesystems that
/// support holes.
pub fn write_sparse_file(path: &Path, len: u64, extents: &[(u64, &[u8])]) -> io::Result<()> {
    let mut file = File::create(path)?;
    for (offset, data) in extents {
        file.seek(SeekFrom::Start(*offset))?;
        file.write_all(data)?;
    }
    file.set_len(len)?;
    file.sync_all()
}

/// One record as sent by the save path: its header and payload packets.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SavedRecord {
    /// Parsed `"<file_index> <stream> <info>"` header.
    pub header: RecordHeader,
    /// Payload packets in order.
    pub payloads: Vec<Vec<u8>>,
}

impl SavedRecord {
    /// Concatenation of all payload packets.
    #[must_use]
    pub fn joined(&self) -> Vec<u8> {
        self.payloads.concat()
    }
}

/// Splits a save-direction packet stream into records.
///
/// Each record is a header packet, payload packets, and an end-of-data
/// signal. An end-of-data signal where a header is expected ends the job;
/// anything after it is ignored.
pub fn split_records(wire: &[u8]) -> io::Result<Vec<SavedRecord>> {
    let mut reader = PacketReader::new(wire);
    let mut records = Vec::new();
    loop {
        let header = match reader.recv()? {
            None | Some(PacketKind::Signal(Signal::EndOfData)) => return Ok(records),
            Some(PacketKind::Signal(other)) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("unexpected signal {other} between records"),
                ));
            }
            Some(PacketKind::Data(_)) => RecordHeader::parse(reader.payload())?,
        };
        let mut payloads = Vec::new();
        loop {
            match reader.recv()? {
                Some(PacketKind::Data(_)) => payloads.push(reader.take_payload()),
                Some(PacketKind::Signal(Signal::EndOfData)) => break,
                Some(PacketKind::Signal(Signal::Heartbeat)) => {}
                Some(PacketKind::Signal(other)) => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("unexpected signal {other} inside a record"),
                    ));
                }
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "stream ended inside a record",
                    ));
                }
            }
        }
        records.push(SavedRecord { header, payloads });
    }
}

/// In-memory stand-in for the storage agent.
///
/// It re-frames each payload packet of a saved job as a `rechdr` header
/// followed by the payload, the way records come back during a restore.
#[derive(Clone, Copy, Debug)]
pub struct StorageRelay {
    vol_session_id: u32,
    vol_session_time: u32,
}

impl Default for StorageRelay {
    fn default() -> Self {
        Self::new(1, 1_700_000_000)
    }
}

impl StorageRelay {
    /// Creates a relay that stamps records with the given volume session.
    #[must_use]
    pub const fn new(vol_session_id: u32, vol_session_time: u32) -> Self {
        Self {
            vol_session_id,
            vol_session_time,
        }
    }

    /// Converts a save-direction packet stream into a restore-direction one,
    /// terminated by an end-of-data signal.
    pub fn relay(&self, saved: &[u8]) -> io::Result<Vec<u8>> {
        let records = split_records(saved)?;
        self.replay(&records)
    }

    /// Frames `records` in restore direction.
    pub fn replay(&self, records: &[SavedRecord]) -> io::Result<Vec<u8>> {
        let mut writer = PacketWriter::new(Vec::new());
        for record in records {
            for payload in &record.payloads {
                let header = StoredRecordHeader {
                    vol_session_id: self.vol_session_id,
                    vol_session_time: self.vol_session_time,
                    file_index: record.header.file_index,
                    stream: record.header.stream,
                    size: payload.len() as u64,
                };
                writer.send(header.encode().as_bytes())?;
                writer.send(payload)?;
            }
        }
        writer.signal(Signal::EndOfData)?;
        Ok(writer.into_inner())
    }
}
