use std::io;

use thiserror::Error;

/// Errors raised while decoding packets and records from the data stream.
///
/// Every variant describes malformed or unexpected input. Conversions into
/// [`io::Error`] map them to [`io::ErrorKind::InvalidData`] so the framing
/// helpers can keep returning [`io::Result`].
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ProtocolError {
    /// A length prefix announced more bytes than a single packet may carry.
    #[error("packet length {len} exceeds maximum {max}")]
    OversizedPacket {
        /// Announced payload length.
        len: usize,
        /// Largest accepted payload length.
        max: usize,
    },
    /// A negative length prefix did not name a known signal.
    #[error("unknown packet signal {0}")]
    UnknownSignal(i32),
    /// A save-direction record header could not be parsed.
    #[error("malformed record header: \"{input}\"")]
    MalformedRecordHeader {
        /// The header text, lossily decoded.
        input: String,
    },
    /// A restore-direction `rechdr` header could not be parsed.
    #[error("malformed stored record header: \"{input}\"")]
    MalformedStoredHeader {
        /// The header text, lossily decoded.
        input: String,
    },
    /// An attributes record was missing one of its mandatory fields.
    #[error("malformed attributes record: missing {field}")]
    MalformedAttributes {
        /// Name of the first field that could not be located.
        field: &'static str,
    },
    /// The type field of an attributes record named no known file type.
    #[error("attributes record carries unknown file type {0}")]
    UnknownFileType(u32),
    /// An encoded stat block did not contain all mandatory fields.
    #[error("malformed encoded stat: expected {expected} fields, found {found}")]
    MalformedStat {
        /// Number of mandatory fields.
        expected: usize,
        /// Number of fields present.
        found: usize,
    },
    /// A base-64 integer contained a character outside the alphabet.
    #[error("invalid base-64 digit {0:#04x}")]
    InvalidBase64Digit(u8),
    /// A sparse data payload was shorter than its offset prefix.
    #[error("sparse payload of {len} bytes is shorter than the {prefix} byte offset prefix")]
    TruncatedSparsePrefix {
        /// Payload length.
        len: usize,
        /// Required prefix length.
        prefix: usize,
    },
    /// The `accurate` command could not be parsed.
    #[error("malformed accurate command: \"{input}\"")]
    MalformedAccurateCommand {
        /// The command text, lossily decoded.
        input: String,
    },
}

impl ProtocolError {
    pub(crate) fn record_header(input: &[u8]) -> Self {
        Self::MalformedRecordHeader {
            input: String::from_utf8_lossy(input).into_owned(),
        }
    }

    pub(crate) fn stored_header(input: &[u8]) -> Self {
        Self::MalformedStoredHeader {
            input: String::from_utf8_lossy(input).into_owned(),
        }
    }

    pub(crate) fn accurate_command(input: &[u8]) -> Self {
        Self::MalformedAccurateCommand {
            input: String::from_utf8_lossy(input).into_owned(),
        }
    }
}

impl From<ProtocolError> for io::Error {
    fn from(err: ProtocolError) -> Self {
        io::Error::new(io::ErrorKind::InvalidData, err)
    }
}
