//! Attributes record codec.
//!
//! Layout: `"<file_index> <type> <name>\0<encoded_stat>\0<link>\0<extra>\0"`.
//! When the type field carries [`AR_DATA_STREAM`], one more base-64 field
//! with the data stream id follows the `extra` terminator and overrides the
//! value embedded in the stat block.

use memchr::memchr;

use crate::base64::{decode_i64, encode_i64};
use crate::error::ProtocolError;
use crate::file_type::{AR_DATA_STREAM, FT_MASK, FileType};
use crate::stat::StatRecord;

/// Decoded attributes record; always the first record of a file entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttributesRecord {
    /// One-based index of the file within the job.
    pub file_index: u32,
    /// Entry classification.
    pub file_type: FileType,
    /// Path as saved. Directories carry a trailing separator.
    pub name: Vec<u8>,
    /// Stat block, including the data stream id.
    pub stat: StatRecord,
    /// Symlink target or first saved name of a hard link; empty otherwise.
    pub link: Vec<u8>,
    /// Platform-specific extra attributes; empty on Unix.
    pub extra: Vec<u8>,
}

impl AttributesRecord {
    /// Stream id that carries this file's content.
    #[must_use]
    pub const fn data_stream(&self) -> i32 {
        self.stat.data_stream
    }

    /// Serializes the record into `out`, replacing its contents.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.clear();
        out.extend_from_slice(format!("{} {} ", self.file_index, self.file_type.as_u32()).as_bytes());
        out.extend_from_slice(&self.name);
        out.push(0);

        let mut text = String::with_capacity(96);
        self.stat.encode_into(&mut text);
        out.extend_from_slice(text.as_bytes());
        out.push(0);
        out.extend_from_slice(&self.link);
        out.push(0);
        out.extend_from_slice(&self.extra);
        out.push(0);
    }

    /// Serializes the record into a new buffer.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.name.len() + self.link.len() + 128);
        self.encode_into(&mut out);
        out
    }

    /// Serializes the record with an explicit trailing data stream field.
    ///
    /// Writers that predate the data stream in the stat block used this
    /// form; it is kept so both layouts can be produced in tests and tools.
    #[must_use]
    pub fn encode_with_data_stream_field(&self) -> Vec<u8> {
        let mut out = format!(
            "{} {} ",
            self.file_index,
            self.file_type.as_u32() | AR_DATA_STREAM
        )
        .into_bytes();
        out.extend_from_slice(&self.name);
        out.push(0);

        let mut text = String::with_capacity(96);
        StatRecord {
            data_stream: 0,
            ..self.stat
        }
        .encode_into(&mut text);
        out.extend_from_slice(text.as_bytes());
        out.push(0);
        out.extend_from_slice(&self.link);
        out.push(0);
        out.extend_from_slice(&self.extra);
        out.push(0);

        text.clear();
        encode_i64(i64::from(self.stat.data_stream), &mut text);
        out.extend_from_slice(text.as_bytes());
        out.push(0);
        out
    }

    /// Parses an attributes record payload.
    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        let (file_index, rest) = split_at_byte(payload, b' ', "file index")?;
        let (type_field, rest) = split_at_byte(rest, b' ', "type")?;

        let file_index = parse_decimal(file_index, "file index")?;
        let type_field = parse_decimal(type_field, "type")?;
        let file_type = FileType::from_u32(type_field & FT_MASK)
            .ok_or(ProtocolError::UnknownFileType(type_field & FT_MASK))?;

        let (name, rest) = split_at_byte(rest, 0, "name")?;
        let (encoded_stat, rest) = split_at_byte(rest, 0, "attributes")?;
        let mut stat = StatRecord::decode(encoded_stat)?;
        let (link, rest) = split_at_byte(rest, 0, "link")?;
        let (extra, rest) = match memchr(0, rest) {
            Some(end) => (&rest[..end], &rest[end + 1..]),
            None => (rest, &rest[rest.len()..]),
        };

        if type_field & AR_DATA_STREAM != 0 {
            let field = match memchr(0, rest) {
                Some(end) => &rest[..end],
                None => rest,
            };
            stat.data_stream = decode_i64(field)? as i32;
        }

        Ok(Self {
            file_index,
            file_type,
            name: name.to_vec(),
            stat,
            link: link.to_vec(),
            extra: extra.to_vec(),
        })
    }
}

fn split_at_byte<'a>(
    input: &'a [u8],
    delimiter: u8,
    field: &'static str,
) -> Result<(&'a [u8], &'a [u8]), ProtocolError> {
    memchr(delimiter, input)
        .map(|end| (&input[..end], &input[end + 1..]))
        .ok_or(ProtocolError::MalformedAttributes { field })
}

fn parse_decimal(field: &[u8], name: &'static str) -> Result<u32, ProtocolError> {
    std::str::from_utf8(field)
        .ok()
        .and_then(|text| text.parse::<u32>().ok())
        .ok_or(ProtocolError::MalformedAttributes { field: name })
}
