#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Filesystem metadata that travels beside file content.
//!
//! - [`acl`]: the [`AclBackend`] trait and its platform implementations,
//!   with the POSIX short text codec used as the portable blob format.
//! - [`xattr`]: the [`XattrBackend`] trait over the portable tuple blob.
//! - [`PerFilesystemFlags`]: which native capabilities still work on the
//!   filesystem being processed.
//! - [`apply_attributes`] and [`verify_size`]: restore-side ownership, mode,
//!   timestamp and size handling.
//!
//! Native ACLs need the `acl` feature and extended attributes the `xattr`
//! feature. Without them the no-op backends are selected, which capture
//! nothing and report restores as unsupported.

pub mod acl;
#[cfg(unix)]
mod apply;
mod error;
mod flags;
mod outcome;
#[cfg(unix)]
mod ownership;
pub mod xattr;

pub use self::acl::{AclBackend, NoAclBackend, native_acl_backend};
#[cfg(unix)]
pub use apply::{apply_attributes, verify_size};
pub use error::MetadataError;
pub use flags::{Capability, Direction, PerFilesystemFlags};
pub use outcome::ApplyOutcome;
pub use self::xattr::{NoXattrBackend, XattrBackend, XattrCapture, native_xattr_backend};
