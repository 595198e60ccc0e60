//! Content streaming for one file.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use checksums::ChecksumState;
use compress::zlib::{BlockCompressor, CompressionLevel};
use logging::MessageKind;
use protocol::packet::{PacketWriter, Signal};
use protocol::{DataFamily, FileType, RecordHeader, push_sparse_offset};

use crate::error::{EngineError, EngineResult};
use crate::job::JobContext;

/// Reusable buffers of the save path.
#[derive(Debug, Default)]
pub(super) struct Buffers {
    read: Vec<u8>,
    record: Vec<u8>,
}

/// What [`send_data`] needs to know about the file being streamed.
#[derive(Clone, Copy, Debug)]
pub(super) struct DataParams<'a> {
    pub(super) file_index: u32,
    pub(super) file_type: FileType,
    pub(super) family: DataFamily,
    pub(super) level: Option<CompressionLevel>,
    pub(super) size: i64,
    pub(super) name: &'a str,
}

/// Streams the content of `file` as one data record.
///
/// Read errors end the record early and are reported as per-file errors;
/// the end-of-data signal is sent regardless. Send failures are fatal.
pub(super) fn send_data<R, W, M>(
    job: &mut JobContext<M>,
    out: &mut PacketWriter<W>,
    file: &mut R,
    params: &DataParams<'_>,
    mut checksum: Option<&mut ChecksumState>,
    buffers: &mut Buffers,
) -> EngineResult<()>
where
    R: Read,
    W: Write,
    M: Write,
{
    let family = params.family;
    let header = RecordHeader::new(params.file_index, family.stream().as_i32());
    out.send(header.encode().as_bytes())?;

    let block = job.config().block_len();
    buffers.read.resize(block, 0);
    let mut compressor = params
        .level
        .filter(|_| family.is_compressed())
        .map(BlockCompressor::new);
    let size = u64::try_from(params.size).unwrap_or(0);
    let unsized_stream = matches!(params.file_type, FileType::Raw | FileType::Fifo) && size == 0;
    let mut offset = 0u64;
    let mut blocks_sent = 0u64;
    let mut holes = 0u64;

    loop {
        job.check_canceled()?;
        let len = match read_block(file, &mut buffers.read[..block]) {
            Ok(0) => break,
            Ok(len) => len,
            Err(error) => {
                job.report_error(
                    MessageKind::Error,
                    format!("Read error on file {}. ERR={error}", params.name),
                )?;
                break;
            }
        };
        job.add_read_bytes(len);
        let data = &buffers.read[..len];
        if let Some(state) = checksum.as_mut() {
            state.update(data);
        }

        if family.is_sparse()
            && ((len == block && offset + (len as u64) < size) || unsized_stream)
            && is_zero_block(data)
        {
            offset += len as u64;
            holes += 1;
            continue;
        }

        buffers.record.clear();
        if family.is_sparse() {
            push_sparse_offset(&mut buffers.record, offset);
        }
        match compressor.as_mut() {
            Some(compressor) => {
                let compressed = compressor.compress(data).map_err(|error| {
                    EngineError::fatal(format!("Compression error on file {}: {error}", params.name))
                })?;
                buffers.record.extend_from_slice(compressed);
            }
            None => buffers.record.extend_from_slice(data),
        }
        out.send(&buffers.record)?;
        job.add_job_bytes(buffers.record.len());
        offset += len as u64;
        blocks_sent += 1;
    }

    out.signal(Signal::EndOfData)?;
    logging::trace_save!(
        debug,
        file = params.name,
        stream = family.stream().name(),
        blocks_sent,
        holes,
        "data sent"
    );
    Ok(())
}

/// Fills `buf` as far as the source allows; a short count means end of file.
fn read_block<R: Read>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => {
                if filled > 0 {
                    return Ok(filled);
                }
                return Err(error);
            }
        }
    }
    Ok(filled)
}

fn is_zero_block(data: &[u8]) -> bool {
    let words = data.chunks_exact(16);
    let tail = words.remainder();
    words
        .map(|word| word.iter().fold(0u8, |acc, &byte| acc | byte))
        .all(|folded| folded == 0)
        && tail.iter().all(|&byte| byte == 0)
}

/// Opens `path` for reading, with `O_NOATIME` when asked and permitted.
pub(super) fn open_for_read(path: &Path, no_atime: bool) -> io::Result<fs::File> {
    if no_atime && let Some(file) = try_open_noatime(path)? {
        return Ok(file);
    }
    fs::File::open(path)
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn try_open_noatime(path: &Path) -> io::Result<Option<fs::File>> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut options = fs::OpenOptions::new();
    options.read(true).custom_flags(libc::O_NOATIME);
    match options.open(path) {
        Ok(file) => Ok(Some(file)),
        Err(error) if error.raw_os_error() == Some(libc::EPERM) => {
            logging::trace_save!(trace, path = %path.display(), "O_NOATIME refused");
            Ok(None)
        }
        Err(error) => Err(error),
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn try_open_noatime(_path: &Path) -> io::Result<Option<fs::File>> {
    Ok(None)
}
