#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! File signature digests computed while the save path streams file content.
//! A job selects one [`ChecksumKind`] per file; the resulting
//! [`ChecksumState`] is fed every block read from disk and finalised into a
//! [`Signature`] that travels as its own record after the file's data, ACL,
//! and xattr records.
//!
//! # Design
//!
//! The [`strong`] module wraps the RustCrypto MD5 and SHA-1 implementations
//! behind the [`StrongDigest`](strong::StrongDigest) trait. [`ChecksumState`]
//! dispatches to one of them, or to nothing at all for
//! [`ChecksumKind::None`], so callers never branch on the algorithm.
//!
//! # Invariants
//!
//! - MD5 signatures are always 16 bytes, SHA-1 signatures always 20 bytes.
//! - [`ChecksumKind::None`] turns `update` and `finalize` into no-ops and never
//!   yields a signature.
//! - The algorithm cannot change once a state has been created.
//!
//! # Examples
//!
//! ```
//! use checksums::{ChecksumKind, ChecksumState};
//!
//! let mut state = ChecksumState::new(ChecksumKind::Md5);
//! state.update(b"file ");
//! state.update(b"content");
//! let signature = state.finalize().expect("md5 yields a signature");
//! assert_eq!(signature.as_bytes().len(), 16);
//! ```

mod state;
pub mod strong;

pub use state::{ChecksumKind, ChecksumState, ParseChecksumKindError, Signature};
