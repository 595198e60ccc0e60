//! Length-prefixed packet framing.
//!
//! Each packet is a four-byte big-endian signed length followed by that many
//! payload bytes. A negative length is a [`Signal`] with no payload, a zero
//! length is an empty message, and lengths above [`MAX_PACKET_LEN`] are
//! rejected in both directions.

mod helpers;
mod io;
mod signal;

pub use io::{
    PacketReader, PacketWriter, recv_packet, recv_packet_into, send_packet, send_signal,
};
pub use signal::{ParseSignalError, Signal};

/// Largest payload a single packet may carry.
pub const MAX_PACKET_LEN: usize = 1_000_000;

/// Size of the length prefix preceding every packet.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Classification of a received packet whose payload lives in a caller buffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PacketKind {
    /// A data packet of the given length.
    Data(usize),
    /// A signal.
    Signal(Signal),
}

impl PacketKind {
    /// Returns the signal, if this packet is one.
    #[must_use]
    pub const fn signal(self) -> Option<Signal> {
        match self {
            Self::Signal(signal) => Some(signal),
            Self::Data(_) => None,
        }
    }
}

/// An owned packet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Packet {
    /// Payload bytes.
    Data(Vec<u8>),
    /// A signal.
    Signal(Signal),
}

impl Packet {
    /// Writes the packet to `writer`.
    pub fn write_to<W: std::io::Write + ?Sized>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            Self::Data(payload) => send_packet(writer, payload),
            Self::Signal(signal) => send_signal(writer, *signal),
        }
    }
}
