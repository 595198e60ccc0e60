//! Portable extended-attribute blob.
//!
//! A blob is a sequence of tuples terminated by the end of the buffer:
//!
//! ```text
//! magic: u32 = 0x5C5884
//! name_len: u32
//! name: [u8; name_len]      (no terminator)
//! value_len: u32
//! value: [u8; value_len]
//! ```
//!
//! All integers are big-endian.

use thiserror::Error;

/// Marker at the start of every tuple.
pub const XATTR_MAGIC: u32 = 0x5C5884;

/// Default ceiling for a serialized blob.
pub const DEFAULT_MAX_XATTR_STREAM: usize = 1024 * 1024;

const U32_LEN: usize = 4;

/// Errors raised while building or parsing an xattr blob.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum XattrBlobError {
    /// The serialized size reached the configured ceiling.
    #[error("xattr stream of {size} bytes reaches the {limit} byte limit")]
    TooLarge {
        /// Size the blob would have after the rejected tuple.
        size: usize,
        /// Configured ceiling.
        limit: usize,
    },
    /// A name or value did not fit the 32-bit length field.
    #[error("xattr {field} of {len} bytes does not fit a 32-bit length")]
    FieldTooLong {
        /// Which field overflowed.
        field: &'static str,
        /// Its length.
        len: usize,
    },
    /// A tuple did not start with [`XATTR_MAGIC`].
    #[error("illegal xattr stream, magic {found:#x} at offset {offset} does not match {XATTR_MAGIC:#x}")]
    BadMagic {
        /// Offset of the tuple within the blob.
        offset: usize,
        /// The value found instead.
        found: u32,
    },
    /// The blob ended in the middle of a tuple.
    #[error("xattr stream truncated at offset {offset}: {needed} bytes needed, {available} available")]
    Truncated {
        /// Offset where the missing field starts.
        offset: usize,
        /// Bytes needed for that field.
        needed: usize,
        /// Bytes left in the blob.
        available: usize,
    },
}

/// Accumulates tuples while enforcing the size ceiling.
#[derive(Clone, Debug)]
pub struct XattrBlobBuilder {
    buffer: Vec<u8>,
    limit: usize,
    count: usize,
}

impl XattrBlobBuilder {
    /// Creates a builder whose blobs must stay strictly below `limit` bytes.
    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self {
            buffer: Vec::new(),
            limit,
            count: 0,
        }
    }

    /// Appends one tuple.
    ///
    /// Fails without modifying the blob when the serialized size would reach
    /// the ceiling.
    pub fn push(&mut self, name: &[u8], value: &[u8]) -> Result<(), XattrBlobError> {
        let name_len = u32::try_from(name.len()).map_err(|_| XattrBlobError::FieldTooLong {
            field: "name",
            len: name.len(),
        })?;
        let value_len = u32::try_from(value.len()).map_err(|_| XattrBlobError::FieldTooLong {
            field: "value",
            len: value.len(),
        })?;

        let size = self.buffer.len() + 3 * U32_LEN + name.len() + value.len();
        if size >= self.limit {
            return Err(XattrBlobError::TooLarge {
                size,
                limit: self.limit,
            });
        }

        self.buffer.reserve(size - self.buffer.len());
        self.buffer.extend_from_slice(&XATTR_MAGIC.to_be_bytes());
        self.buffer.extend_from_slice(&name_len.to_be_bytes());
        self.buffer.extend_from_slice(name);
        self.buffer.extend_from_slice(&value_len.to_be_bytes());
        self.buffer.extend_from_slice(value);
        self.count += 1;
        Ok(())
    }

    /// Number of tuples added.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Serialized size so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Reports whether no tuple was added.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the serialized blob.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }
}

/// One decoded tuple borrowing from the blob.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct XattrEntry<'a> {
    /// Attribute name, including its namespace prefix.
    pub name: &'a [u8],
    /// Attribute value.
    pub value: &'a [u8],
}

/// Iterator over the tuples of a blob. It yields one error and then stops
/// when the blob is corrupt.
#[derive(Clone, Debug)]
pub struct XattrTuples<'a> {
    blob: &'a [u8],
    offset: usize,
    failed: bool,
}

/// Iterates over the tuples of `blob`.
#[must_use]
pub const fn parse_xattr_blob(blob: &[u8]) -> XattrTuples<'_> {
    XattrTuples {
        blob,
        offset: 0,
        failed: false,
    }
}

impl<'a> XattrTuples<'a> {
    fn take(&mut self, needed: usize) -> Result<&'a [u8], XattrBlobError> {
        let available = self.blob.len() - self.offset;
        if available < needed {
            return Err(XattrBlobError::Truncated {
                offset: self.offset,
                needed,
                available,
            });
        }
        let bytes = &self.blob[self.offset..self.offset + needed];
        self.offset += needed;
        Ok(bytes)
    }

    fn take_u32(&mut self) -> Result<u32, XattrBlobError> {
        let bytes = self.take(U32_LEN)?;
        let mut word = [0u8; U32_LEN];
        word.copy_from_slice(bytes);
        Ok(u32::from_be_bytes(word))
    }

    fn next_entry(&mut self) -> Result<XattrEntry<'a>, XattrBlobError> {
        let start = self.offset;
        let magic = self.take_u32()?;
        if magic != XATTR_MAGIC {
            return Err(XattrBlobError::BadMagic {
                offset: start,
                found: magic,
            });
        }
        let name_len = self.take_u32()? as usize;
        let name = self.take(name_len)?;
        let value_len = self.take_u32()? as usize;
        let value = self.take(value_len)?;
        Ok(XattrEntry { name, value })
    }
}

impl<'a> Iterator for XattrTuples<'a> {
    type Item = Result<XattrEntry<'a>, XattrBlobError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.blob.len() {
            return None;
        }
        let entry = self.next_entry();
        self.failed = entry.is_err();
        Some(entry)
    }
}
