use std::io::{self, Read, Write};

use super::helpers::{ensure_packet_length, read_payload_into, read_prefix};
use super::{MAX_PACKET_LEN, Packet, PacketKind, Signal};
use crate::error::ProtocolError;

/// Sends one data packet: a big-endian length prefix followed by `payload`.
///
/// Payloads longer than [`MAX_PACKET_LEN`] are rejected with
/// [`io::ErrorKind::InvalidInput`] before anything is written.
pub fn send_packet<W: Write + ?Sized>(writer: &mut W, payload: &[u8]) -> io::Result<()> {
    let len = ensure_packet_length(payload.len())?;
    writer.write_all(&len.to_be_bytes())?;
    if !payload.is_empty() {
        writer.write_all(payload)?;
    }
    Ok(())
}

/// Sends a signal as a bare negative length prefix.
pub fn send_signal<W: Write + ?Sized>(writer: &mut W, signal: Signal) -> io::Result<()> {
    writer.write_all(&signal.as_i32().to_be_bytes())
}

/// Receives the next packet into a caller-provided buffer.
///
/// Returns `Ok(None)` when the stream ends cleanly before a length prefix.
/// For data packets the buffer holds exactly the payload; for signals it is
/// left empty. Oversized lengths and unknown signals surface as
/// [`io::ErrorKind::InvalidData`].
pub fn recv_packet_into<R: Read + ?Sized>(
    reader: &mut R,
    buffer: &mut Vec<u8>,
) -> io::Result<Option<PacketKind>> {
    let Some(prefix) = read_prefix(reader)? else {
        buffer.clear();
        return Ok(None);
    };

    let raw = i32::from_be_bytes(prefix);
    if raw < 0 {
        buffer.clear();
        return match Signal::from_i32(raw) {
            Some(signal) => Ok(Some(PacketKind::Signal(signal))),
            None => Err(ProtocolError::UnknownSignal(raw).into()),
        };
    }

    let len = raw as usize;
    if len > MAX_PACKET_LEN {
        return Err(ProtocolError::OversizedPacket {
            len,
            max: MAX_PACKET_LEN,
        }
        .into());
    }

    read_payload_into(reader, buffer, len)?;
    Ok(Some(PacketKind::Data(len)))
}

/// Receives the next packet as an owned [`Packet`].
pub fn recv_packet<R: Read + ?Sized>(reader: &mut R) -> io::Result<Option<Packet>> {
    let mut buffer = Vec::new();
    Ok(recv_packet_into(reader, &mut buffer)?.map(|kind| match kind {
        PacketKind::Data(_) => Packet::Data(buffer),
        PacketKind::Signal(signal) => Packet::Signal(signal),
    }))
}

/// Writes packets to an underlying byte sink and tracks how much was sent.
#[derive(Debug)]
pub struct PacketWriter<W> {
    inner: W,
    packets: u64,
    bytes: u64,
}

impl<W: Write> PacketWriter<W> {
    /// Wraps `inner`.
    #[must_use]
    pub const fn new(inner: W) -> Self {
        Self {
            inner,
            packets: 0,
            bytes: 0,
        }
    }

    /// Sends one data packet.
    pub fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        send_packet(&mut self.inner, payload)?;
        self.packets += 1;
        self.bytes += payload.len() as u64;
        Ok(())
    }

    /// Sends a signal.
    pub fn signal(&mut self, signal: Signal) -> io::Result<()> {
        send_signal(&mut self.inner, signal)?;
        self.packets += 1;
        Ok(())
    }

    /// Flushes the underlying sink.
    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    /// Number of packets (data and signals) written so far.
    #[must_use]
    pub const fn packets_sent(&self) -> u64 {
        self.packets
    }

    /// Number of payload bytes written so far, excluding length prefixes.
    #[must_use]
    pub const fn bytes_sent(&self) -> u64 {
        self.bytes
    }

    /// Returns a shared reference to the underlying sink.
    #[must_use]
    pub const fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Returns a mutable reference to the underlying sink.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Consumes the writer and returns the underlying sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Reads packets from an underlying byte source into a reused buffer.
#[derive(Debug)]
pub struct PacketReader<R> {
    inner: R,
    buffer: Vec<u8>,
}

impl<R: Read> PacketReader<R> {
    /// Wraps `inner`.
    #[must_use]
    pub const fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }

    /// Receives the next packet; see [`recv_packet_into`].
    ///
    /// The payload of a data packet stays available through
    /// [`payload`](Self::payload) until the next call.
    pub fn recv(&mut self) -> io::Result<Option<PacketKind>> {
        recv_packet_into(&mut self.inner, &mut self.buffer)
    }

    /// Payload of the most recent data packet.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.buffer
    }

    /// Moves the most recent payload out, leaving the internal buffer empty.
    pub fn take_payload(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    /// Returns a mutable reference to the underlying source.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consumes the reader and returns the underlying source.
    pub fn into_inner(self) -> R {
        self.inner
    }
}
