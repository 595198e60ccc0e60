use std::collections::TryReserveError;
use std::io::{self, Read};

use super::MAX_PACKET_LEN;
use crate::error::ProtocolError;

pub(super) fn ensure_packet_length(len: usize) -> io::Result<i32> {
    if len > MAX_PACKET_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            ProtocolError::OversizedPacket {
                len,
                max: MAX_PACKET_LEN,
            },
        ));
    }

    // MAX_PACKET_LEN fits an i32, so the conversion cannot truncate.
    Ok(len as i32)
}

pub(super) fn truncated_prefix_error(actual: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("packet length prefix truncated: expected 4 bytes but received {actual}"),
    )
}

pub(super) fn truncated_payload_error(expected: usize, actual: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("packet payload truncated: expected {expected} bytes but received {actual}"),
    )
}

/// Reads the four-byte prefix. `Ok(None)` means the stream ended cleanly
/// before the first byte.
pub(super) fn read_prefix<R: Read + ?Sized>(reader: &mut R) -> io::Result<Option<[u8; 4]>> {
    let mut prefix = [0u8; 4];
    let mut read_total = 0;
    while read_total < prefix.len() {
        match reader.read(&mut prefix[read_total..]) {
            Ok(0) if read_total == 0 => return Ok(None),
            Ok(0) => return Err(truncated_prefix_error(read_total)),
            Ok(bytes_read) => read_total += bytes_read,
            Err(ref err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(Some(prefix))
}

pub(super) fn read_payload_into<R: Read + ?Sized>(
    reader: &mut R,
    buffer: &mut Vec<u8>,
    len: usize,
) -> io::Result<()> {
    buffer.clear();

    if len == 0 {
        return Ok(());
    }

    if buffer.capacity() < len {
        buffer
            .try_reserve_exact(len)
            .map_err(map_allocation_error)?;
    }
    buffer.resize(len, 0);

    let mut read_total = 0;
    while read_total < len {
        match reader.read(&mut buffer[read_total..]) {
            Ok(0) => {
                buffer.truncate(read_total);
                return Err(truncated_payload_error(len, read_total));
            }
            Ok(bytes_read) => read_total += bytes_read,
            Err(ref err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                buffer.truncate(read_total);
                if err.kind() == io::ErrorKind::UnexpectedEof {
                    return Err(truncated_payload_error(len, read_total));
                }
                return Err(err);
            }
        }
    }

    Ok(())
}

pub(super) fn map_allocation_error(err: TryReserveError) -> io::Error {
    io::Error::new(io::ErrorKind::OutOfMemory, err)
}
