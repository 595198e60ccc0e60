//! Metadata records that follow a file's content.

use std::io::Write;
use std::path::Path;

use checksums::{ChecksumKind, Signature};
use logging::MessageKind;
use metadata::{AclBackend, Capability, Direction, XattrBackend, XattrCapture};
use protocol::packet::{MAX_PACKET_LEN, PacketWriter, Signal};
use protocol::{RecordHeader, StreamType};

use crate::error::EngineResult;
use crate::job::JobContext;

/// Sends one complete record: header, payload, end-of-data.
///
/// Payloads longer than [`MAX_PACKET_LEN`] go out as several packets; the
/// receiver sees one record per packet and joins them again.
pub(super) fn send_record<W: Write>(
    out: &mut PacketWriter<W>,
    file_index: u32,
    stream: StreamType,
    payload: &[u8],
) -> EngineResult<()> {
    let header = RecordHeader::new(file_index, stream.as_i32());
    out.send(header.encode().as_bytes())?;
    if payload.is_empty() {
        out.send(payload)?;
    }
    for chunk in payload.chunks(MAX_PACKET_LEN) {
        out.send(chunk)?;
    }
    out.signal(Signal::EndOfData)?;
    Ok(())
}

/// Sends one record per non-trivial ACL flavor of `path`.
///
/// Directory-only flavors are probed for directories alone. Probe failures
/// are per-file errors; a filesystem without ACL support switches the
/// capability off and the loop ends quietly.
pub(super) fn send_acls<W: Write, M: Write>(
    job: &mut JobContext<M>,
    out: &mut PacketWriter<W>,
    backend: &dyn AclBackend,
    path: &Path,
    file_index: u32,
    is_directory: bool,
) -> EngineResult<()> {
    let Some(os) = backend.os() else {
        return Ok(());
    };
    for &flavor in backend.flavors() {
        if !job.flags_mut().is_enabled(Direction::Save, Capability::Acl) {
            break;
        }
        if flavor.is_directory_only() && !is_directory {
            continue;
        }
        let Some(stream) = StreamType::acl(os, flavor) else {
            continue;
        };
        match backend.probe_and_build(path, flavor, job.flags_mut()) {
            Ok(Some(blob)) => {
                logging::trace_acl!(
                    debug,
                    path = %path.display(),
                    flavor = flavor.name(),
                    len = blob.len(),
                    "sending ACL"
                );
                send_record(out, file_index, stream, &blob)?;
            }
            Ok(None) => {}
            Err(error) => job.report_error(MessageKind::Error, error.to_string())?,
        }
    }
    Ok(())
}

/// Sends the xattr record of `path`, if it has any attributes.
///
/// `skip_acl_names` leaves out the attributes that mirror ACLs already sent
/// as their own records.
pub(super) fn send_xattrs<W: Write, M: Write>(
    job: &mut JobContext<M>,
    out: &mut PacketWriter<W>,
    backend: &dyn XattrBackend,
    path: &Path,
    file_index: u32,
    skip_acl_names: bool,
) -> EngineResult<()> {
    if !job.flags_mut().is_enabled(Direction::Save, Capability::Xattr) {
        return Ok(());
    }
    let Some(stream) = backend.os().and_then(StreamType::xattr) else {
        return Ok(());
    };
    let capture = XattrCapture::new()
        .limit(job.config().xattr_limit())
        .skip_acl_names(skip_acl_names);
    match backend.probe_and_build(path, capture, job.flags_mut()) {
        Ok(Some(blob)) => {
            logging::trace_xattr!(debug, path = %path.display(), len = blob.len(), "sending xattrs");
            send_record(out, file_index, stream, &blob)
        }
        Ok(None) => Ok(()),
        Err(error) => job.report_error(MessageKind::Error, error.to_string()),
    }
}

/// Sends the signature record.
pub(super) fn send_signature<W: Write>(
    out: &mut PacketWriter<W>,
    file_index: u32,
    signature: &Signature,
) -> EngineResult<()> {
    let stream = match signature.kind() {
        ChecksumKind::Sha1 => StreamType::Sha1Digest,
        ChecksumKind::Md5 | ChecksumKind::None => StreamType::Md5Digest,
    };
    send_record(out, file_index, stream, signature.as_bytes())
}
