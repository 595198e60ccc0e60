//! # Overview
//!
//! Zlib helpers for data records. [`BlockCompressor`] produces one complete
//! zlib stream per block and [`BlockDecompressor`] reverses it, each reusing
//! a single output buffer across the blocks of a file.
//!
//! # Examples
//!
//! ```
//! use compress::zlib::{CompressionLevel, compress_to_vec, decompress_to_vec};
//!
//! let data = b"highly compressible payload";
//! let compressed = compress_to_vec(data, CompressionLevel::Best).unwrap();
//! let decoded = decompress_to_vec(&compressed).unwrap();
//! assert_eq!(decoded, data);
//! ```

use std::{
    fmt,
    io::{self, Read, Write},
    num::NonZeroU8,
};

use flate2::{Compression, read::ZlibDecoder, write::ZlibEncoder};

/// Compression levels recognised by the zlib encoder.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompressionLevel {
    /// Favour speed over compression ratio.
    Fast,
    /// Use zlib's default balance between speed and ratio.
    Default,
    /// Favour the best possible compression ratio.
    Best,
    /// Use an explicit zlib compression level in the range `1..=9`.
    Precise(NonZeroU8),
}

impl CompressionLevel {
    /// Creates a [`CompressionLevel::Precise`] value from a numeric level.
    ///
    /// Per-file options carry the level as `1..=9`; `0` means compression is
    /// disabled and is rejected here along with anything above `9`.
    pub fn from_numeric(level: u32) -> Result<Self, CompressionLevelError> {
        if !(1..=9).contains(&level) {
            return Err(CompressionLevelError::new(level));
        }
        match NonZeroU8::new(level as u8) {
            Some(precise) => Ok(Self::Precise(precise)),
            None => Err(CompressionLevelError::new(level)),
        }
    }

    /// Constructs a [`CompressionLevel::Precise`] variant from the provided zlib level.
    #[must_use]
    pub const fn precise(level: NonZeroU8) -> Self {
        Self::Precise(level)
    }

    /// Returns the numeric zlib level.
    #[must_use]
    pub fn numeric(self) -> u32 {
        Compression::from(self).level()
    }
}

impl From<CompressionLevel> for Compression {
    fn from(level: CompressionLevel) -> Self {
        match level {
            CompressionLevel::Fast => Self::fast(),
            CompressionLevel::Default => Self::default(),
            CompressionLevel::Best => Self::best(),
            CompressionLevel::Precise(value) => Self::new(u32::from(value.get())),
        }
    }
}

/// Error returned when a requested compression level falls outside the
/// permissible zlib range.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CompressionLevelError {
    level: u32,
}

impl CompressionLevelError {
    const fn new(level: u32) -> Self {
        Self { level }
    }

    /// Returns the invalid compression level that triggered the error.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }
}

impl fmt::Display for CompressionLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "compression level {} is outside the supported range 1-9",
            self.level
        )
    }
}

impl std::error::Error for CompressionLevelError {}

/// Compresses blocks independently, reusing one output buffer.
#[derive(Debug)]
pub struct BlockCompressor {
    level: CompressionLevel,
    buffer: Vec<u8>,
}

impl BlockCompressor {
    /// Creates a compressor for `level`.
    #[must_use]
    pub fn new(level: CompressionLevel) -> Self {
        Self {
            level,
            buffer: Vec::new(),
        }
    }

    /// Returns the configured level.
    #[must_use]
    pub const fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Compresses `block` into a complete zlib stream.
    ///
    /// The returned slice borrows the internal buffer and stays valid until
    /// the next call.
    pub fn compress(&mut self, block: &[u8]) -> io::Result<&[u8]> {
        let mut buffer = std::mem::take(&mut self.buffer);
        buffer.clear();
        let mut encoder = ZlibEncoder::new(buffer, self.level.into());
        encoder.write_all(block)?;
        self.buffer = encoder.finish()?;
        Ok(&self.buffer)
    }
}

/// Inflates blocks produced by [`BlockCompressor`], bounded by a maximum
/// output size per block.
#[derive(Debug)]
pub struct BlockDecompressor {
    limit: usize,
    buffer: Vec<u8>,
}

impl BlockDecompressor {
    /// Creates a decompressor that rejects blocks inflating past `limit` bytes.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            buffer: Vec::new(),
        }
    }

    /// Returns the per-block output ceiling.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Inflates one complete zlib stream.
    pub fn decompress(&mut self, block: &[u8]) -> io::Result<&[u8]> {
        self.buffer.clear();
        let bound = self.limit as u64 + 1;
        ZlibDecoder::new(block)
            .take(bound)
            .read_to_end(&mut self.buffer)?;
        if self.buffer.len() > self.limit {
            return Err(oversized_block_error(self.limit));
        }
        Ok(&self.buffer)
    }
}

fn oversized_block_error(limit: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("compressed block inflates beyond {limit} bytes"),
    )
}

/// Compresses `input` into a new [`Vec`].
pub fn compress_to_vec(input: &[u8], level: CompressionLevel) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), level.into());
    encoder.write_all(input)?;
    encoder.finish()
}

/// Decompresses `input` into a new [`Vec`].
pub fn decompress_to_vec(input: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(input);
    let mut output = Vec::new();
    io::copy(&mut decoder, &mut output)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helper_functions_round_trip() {
        let payload = b"highly compressible payload";
        let compressed = compress_to_vec(payload, CompressionLevel::Best).expect("compress");
        let decoded = decompress_to_vec(&compressed).expect("decompress");
        assert_eq!(decoded, payload);
    }

    #[test]
    fn block_compressor_emits_independent_streams() {
        let mut compressor = BlockCompressor::new(CompressionLevel::Default);
        let first = compressor.compress(b"first block").expect("first").to_vec();
        let second = compressor.compress(b"second block").expect("second").to_vec();

        assert_eq!(decompress_to_vec(&first).expect("inflate first"), b"first block");
        assert_eq!(
            decompress_to_vec(&second).expect("inflate second"),
            b"second block"
        );
    }

    #[test]
    fn block_decompressor_enforces_limit() {
        let block = vec![0u8; 4096];
        let compressed = compress_to_vec(&block, CompressionLevel::Fast).expect("compress");

        let mut bounded = BlockDecompressor::new(1024);
        let error = bounded.decompress(&compressed).expect_err("over limit");
        assert_eq!(error.kind(), io::ErrorKind::InvalidData);

        let mut roomy = BlockDecompressor::new(4096);
        assert_eq!(roomy.decompress(&compressed).expect("inflate"), block.as_slice());
    }

    #[test]
    fn block_decompressor_rejects_garbage() {
        let mut decompressor = BlockDecompressor::new(1024);
        assert!(decompressor.decompress(b"not a zlib stream").is_err());
    }

    #[test]
    fn empty_block_round_trips() {
        let mut compressor = BlockCompressor::new(CompressionLevel::Default);
        let compressed = compressor.compress(&[]).expect("compress").to_vec();
        assert!(!compressed.is_empty());
        let mut decompressor = BlockDecompressor::new(16);
        assert!(decompressor.decompress(&compressed).expect("inflate").is_empty());
    }

    #[test]
    fn numeric_level_constructor_accepts_valid_range() {
        for level in 1..=9 {
            let precise = CompressionLevel::from_numeric(level).expect("valid level");
            assert_eq!(precise.numeric(), level);
        }
    }

    #[test]
    fn numeric_level_constructor_rejects_out_of_range() {
        let err = CompressionLevel::from_numeric(10).expect_err("level above 9 rejected");
        assert_eq!(err.level(), 10);
        let err = CompressionLevel::from_numeric(0).expect_err("level zero rejected");
        assert_eq!(
            err.to_string(),
            "compression level 0 is outside the supported range 1-9"
        );
    }
}
