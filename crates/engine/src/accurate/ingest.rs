use std::io::{self, Read, Write};

use memchr::memchr;
use protocol::packet::{PacketKind, PacketReader, Signal, send_packet};
use protocol::{BAD_ACCURATE_REPLY, StatRecord, parse_accurate_command};

use super::AccurateTable;
use crate::error::{EngineError, EngineResult};

/// Builds the change-detection table from the coordinator's file list.
///
/// `command` is the already received `accurate files=<N>` line. Each
/// following packet carries `<path>\0<encoded stat>`; the list ends with an
/// end-of-data signal. A malformed command is answered with
/// [`BAD_ACCURATE_REPLY`] on `reply` and fails the ingestion. Entries
/// without a separator or with an undecodable stat are skipped.
pub fn ingest_accurate_list<R, W>(
    command: &[u8],
    reader: &mut PacketReader<R>,
    reply: &mut W,
) -> EngineResult<AccurateTable>
where
    R: Read,
    W: Write + ?Sized,
{
    let expected = match parse_accurate_command(command) {
        Ok(count) => count,
        Err(error) => {
            send_packet(reply, BAD_ACCURATE_REPLY.as_bytes())?;
            reply.flush()?;
            return Err(error.into());
        }
    };

    let capacity = usize::try_from(expected).unwrap_or(usize::MAX);
    let mut table = AccurateTable::init(capacity)?;
    let mut skipped = 0u64;

    loop {
        match reader.recv()? {
            Some(PacketKind::Data(_)) => {
                if !add_entry(&mut table, reader.payload()) {
                    skipped += 1;
                }
            }
            Some(PacketKind::Signal(Signal::EndOfData)) => break,
            Some(PacketKind::Signal(Signal::Heartbeat | Signal::HeartbeatResponse)) => {}
            Some(PacketKind::Signal(signal)) => {
                logging::trace_accurate!(warn, signal = signal.name(), "file list ended by signal");
                break;
            }
            None => {
                return Err(EngineError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed while receiving the accurate file list",
                )));
            }
        }
    }

    logging::trace_accurate!(
        info,
        expected,
        loaded = table.len(),
        skipped,
        "accurate file list received"
    );
    Ok(table)
}

fn add_entry(table: &mut AccurateTable, payload: &[u8]) -> bool {
    let Some(separator) = memchr(0, payload) else {
        return false;
    };
    let (path, rest) = (&payload[..separator], &payload[separator + 1..]);
    if rest.is_empty() {
        return false;
    }
    let encoded = match memchr(0, rest) {
        Some(end) => &rest[..end],
        None => rest,
    };
    match StatRecord::decode(encoded) {
        Ok(stat) => {
            table.insert(path, stat.mtime, stat.ctime);
            true
        }
        Err(error) => {
            logging::trace_accurate!(
                debug,
                path = %String::from_utf8_lossy(path),
                %error,
                "ignoring entry with undecodable stat"
            );
            false
        }
    }
}
