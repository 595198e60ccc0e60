//! Record headers and the sparse offset prefix.
//!
//! On the save path every record opens with a header packet
//! `"<file_index> <stream> <info>"`. Records relayed back by the storage
//! agent open with `"rechdr <sid> <stime> <file_index> <stream> <size>"`
//! followed by exactly one data packet of `size` bytes.

use crate::error::ProtocolError;

/// Width of the big-endian file offset at the start of every sparse payload.
pub const SPARSE_OFFSET_LEN: usize = 8;

const STORED_HEADER_TAG: &str = "rechdr";

/// Header sent before the payload packets of a record on the save path.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RecordHeader {
    /// File index the record belongs to.
    pub file_index: u32,
    /// Numeric stream type.
    pub stream: i32,
    /// Stream-specific information; always `0` for the streams defined here.
    pub info: i64,
}

impl RecordHeader {
    /// Creates a header with `info` set to zero.
    #[must_use]
    pub const fn new(file_index: u32, stream: i32) -> Self {
        Self {
            file_index,
            stream,
            info: 0,
        }
    }

    /// Returns the header text.
    #[must_use]
    pub fn encode(&self) -> String {
        format!("{} {} {}", self.file_index, self.stream, self.info)
    }

    /// Parses a header packet.
    pub fn parse(input: &[u8]) -> Result<Self, ProtocolError> {
        let text = std::str::from_utf8(input).map_err(|_| ProtocolError::record_header(input))?;
        let mut fields = text.split_ascii_whitespace();
        let mut next = || fields.next().ok_or_else(|| ProtocolError::record_header(input));
        let file_index = next()?
            .parse()
            .map_err(|_| ProtocolError::record_header(input))?;
        let stream = next()?
            .parse()
            .map_err(|_| ProtocolError::record_header(input))?;
        let info = next()?
            .parse()
            .map_err(|_| ProtocolError::record_header(input))?;
        Ok(Self {
            file_index,
            stream,
            info,
        })
    }
}

/// Header of a record as stored on a volume and relayed during restore.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StoredRecordHeader {
    /// Volume session id.
    pub vol_session_id: u32,
    /// Volume session time.
    pub vol_session_time: u32,
    /// File index the record belongs to.
    pub file_index: u32,
    /// Numeric stream type.
    pub stream: i32,
    /// Exact length of the following data packet.
    pub size: u64,
}

impl StoredRecordHeader {
    /// Returns the header text.
    #[must_use]
    pub fn encode(&self) -> String {
        format!(
            "{STORED_HEADER_TAG} {} {} {} {} {}",
            self.vol_session_id, self.vol_session_time, self.file_index, self.stream, self.size
        )
    }

    /// Parses a `rechdr` packet. Any trailing text after the fifth number is
    /// ignored.
    pub fn parse(input: &[u8]) -> Result<Self, ProtocolError> {
        let malformed = || ProtocolError::stored_header(input);
        let text = std::str::from_utf8(input).map_err(|_| malformed())?;
        let mut fields = text.split_ascii_whitespace();
        if fields.next() != Some(STORED_HEADER_TAG) {
            return Err(malformed());
        }
        let mut numbers = [0i64; 5];
        for slot in &mut numbers {
            *slot = fields
                .next()
                .and_then(|field| field.parse::<i64>().ok())
                .ok_or_else(malformed)?;
        }
        let [sid, stime, file_index, stream, size] = numbers;
        Ok(Self {
            vol_session_id: u32::try_from(sid).map_err(|_| malformed())?,
            vol_session_time: u32::try_from(stime).map_err(|_| malformed())?,
            file_index: u32::try_from(file_index).map_err(|_| malformed())?,
            stream: i32::try_from(stream).map_err(|_| malformed())?,
            size: u64::try_from(size).map_err(|_| malformed())?,
        })
    }
}

/// Appends the sparse offset prefix for `offset` to `out`.
pub fn push_sparse_offset(out: &mut Vec<u8>, offset: u64) {
    out.extend_from_slice(&offset.to_be_bytes());
}

/// Splits a sparse payload into its file offset and data.
pub fn split_sparse_payload(payload: &[u8]) -> Result<(u64, &[u8]), ProtocolError> {
    let Some((prefix, data)) = payload.split_first_chunk::<SPARSE_OFFSET_LEN>() else {
        return Err(ProtocolError::TruncatedSparsePrefix {
            len: payload.len(),
            prefix: SPARSE_OFFSET_LEN,
        });
    };
    Ok((u64::from_be_bytes(*prefix), data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_header_text() {
        let header = RecordHeader::new(12, 1008);
        assert_eq!(header.encode(), "12 1008 0");
        assert_eq!(RecordHeader::parse(b"12 1008 0"), Ok(header));
    }

    #[test]
    fn save_header_rejects_garbage() {
        assert!(RecordHeader::parse(b"12 x 0").is_err());
        assert!(RecordHeader::parse(b"12 3").is_err());
    }

    #[test]
    fn stored_header_round_trips() {
        let header = StoredRecordHeader {
            vol_session_id: 3,
            vol_session_time: 1_699_999_999,
            file_index: 42,
            stream: 6,
            size: 65_544,
        };
        assert_eq!(header.encode(), "rechdr 3 1699999999 42 6 65544");
        assert_eq!(
            StoredRecordHeader::parse(header.encode().as_bytes()),
            Ok(header)
        );
    }

    #[test]
    fn stored_header_requires_tag_and_five_numbers() {
        assert_eq!(
            StoredRecordHeader::parse(b"rechdr 1 2 3 4"),
            Err(ProtocolError::stored_header(b"rechdr 1 2 3 4"))
        );
        assert!(StoredRecordHeader::parse(b"header 1 2 3 4 5").is_err());
        assert!(StoredRecordHeader::parse(b"rechdr 1 2 3 4 -5").is_err());
    }

    #[test]
    fn sparse_prefix_is_big_endian() {
        let mut payload = Vec::new();
        push_sparse_offset(&mut payload, 0x0102_0304_0506_0708);
        payload.extend_from_slice(b"data");
        assert_eq!(&payload[..8], &[1, 2, 3, 4, 5, 6, 7, 8]);

        let (offset, data) = split_sparse_payload(&payload).expect("split");
        assert_eq!(offset, 0x0102_0304_0506_0708);
        assert_eq!(data, b"data");
    }

    #[test]
    fn short_sparse_payload_is_rejected() {
        assert_eq!(
            split_sparse_payload(&[0; 7]),
            Err(ProtocolError::TruncatedSparsePrefix { len: 7, prefix: 8 })
        );
    }
}
