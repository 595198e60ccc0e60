#![deny(unsafe_code)]
#![deny(missing_docs)]

//! Job messages and verbosity control for the file daemon.
//!
//! Two channels are covered here. Job messages ([`JobMessage`]) are the
//! per-file and per-job reports destined for the coordinator, written through
//! a [`MessageSink`] which also counts them by [`MessageKind`]. Diagnostic
//! output goes through `tracing`, one target per [`Subsystem`], with levels
//! chosen by a [`VerbosityConfig`].
//!
//! # Features
//!
//! - `tracing`: installs a `tracing-subscriber` stack via `init_tracing` and
//!   exports the `trace_*!` macros.
//! - `serde`: serialization of [`VerbosityConfig`], [`MessageKind`] and
//!   [`Subsystem`].
//!
//! # Examples
//!
//! ```
//! use logging::{JobMessage, MessageKind, MessageSink, VerbosityConfig};
//!
//! let mut sink = MessageSink::new(Vec::new());
//! sink.write(&JobMessage::new(MessageKind::NotSaved, "/var/run/x.sock: socket"))
//!     .unwrap();
//! assert_eq!(sink.counts().get(MessageKind::NotSaved), 1);
//!
//! let mut config = VerbosityConfig::from_verbose_level(1);
//! config.apply_flag("xattr2").unwrap();
//! assert!(config.directives().contains("filed::xattr=debug"));
//! ```

mod config;
mod levels;
mod message;
mod sink;

#[cfg(feature = "tracing")]
mod tracing_bridge;
#[cfg(feature = "tracing")]
mod tracing_macros;

pub use config::VerbosityConfig;
pub use levels::{MessageCounts, MessageKind, ParseMessageKindError, Subsystem};
pub use message::JobMessage;
pub use sink::MessageSink;

#[cfg(feature = "tracing")]
pub use tracing_bridge::{build_filter, init_tracing};
