#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! Per-block zlib compression for file data records. Every block read by the
//! save path is compressed as a complete, independent zlib stream so the
//! restore path can inflate each record on its own without any state carried
//! between records.
//!
//! # Design
//!
//! The [`zlib`] module exposes [`BlockCompressor`](zlib::BlockCompressor) and
//! [`BlockDecompressor`](zlib::BlockDecompressor), thin wrappers around
//! [`flate2`](https://docs.rs/flate2) that keep one output buffer alive for
//! the duration of a file. The one-shot helpers
//! [`compress_to_vec`](zlib::compress_to_vec) and
//! [`decompress_to_vec`](zlib::decompress_to_vec) remain available for tests
//! and tooling.
//!
//! # Invariants
//!
//! - Each compressed block carries the zlib header and trailer; no dictionary
//!   or window state leaks into the next block.
//! - Decompression is bounded: a block that inflates beyond the configured
//!   limit is rejected instead of growing the buffer without end.
//!
//! # Errors
//!
//! All operations return [`std::io::Result`]. Corrupt input surfaces as the
//! error reported by flate2; an oversized block surfaces as
//! [`std::io::ErrorKind::InvalidData`].
//!
//! # Examples
//!
//! ```
//! use compress::zlib::{BlockCompressor, BlockDecompressor, CompressionLevel};
//!
//! # fn main() -> std::io::Result<()> {
//! let mut compressor = BlockCompressor::new(CompressionLevel::Default);
//! let mut decompressor = BlockDecompressor::new(64 * 1024);
//!
//! let block = b"block of file content ".repeat(32);
//! let compressed = compressor.compress(&block)?.to_vec();
//! assert!(compressed.len() < block.len());
//! assert_eq!(decompressor.decompress(&compressed)?, block.as_slice());
//! # Ok(())
//! # }
//! ```

pub mod zlib;
