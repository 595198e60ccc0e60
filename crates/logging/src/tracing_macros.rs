//! Convenience macros that emit `tracing` events under the subsystem targets.
//!
//! Each macro accepts the same arguments as [`tracing::event!`] without the
//! level: the first token selects the level.
//!
//! ```rust,ignore
//! logging::trace_save!(debug, path = %name, "sending data");
//! logging::trace_acl!(warn, "acl backend unavailable");
//! ```

/// Emits an event under `filed::save`.
#[macro_export]
macro_rules! trace_save {
    ($level:ident, $($arg:tt)*) => {
        ::tracing::$level!(target: "filed::save", $($arg)*)
    };
}

/// Emits an event under `filed::restore`.
#[macro_export]
macro_rules! trace_restore {
    ($level:ident, $($arg:tt)*) => {
        ::tracing::$level!(target: "filed::restore", $($arg)*)
    };
}

/// Emits an event under `filed::accurate`.
#[macro_export]
macro_rules! trace_accurate {
    ($level:ident, $($arg:tt)*) => {
        ::tracing::$level!(target: "filed::accurate", $($arg)*)
    };
}

/// Emits an event under `filed::acl`.
#[macro_export]
macro_rules! trace_acl {
    ($level:ident, $($arg:tt)*) => {
        ::tracing::$level!(target: "filed::acl", $($arg)*)
    };
}

/// Emits an event under `filed::xattr`.
#[macro_export]
macro_rules! trace_xattr {
    ($level:ident, $($arg:tt)*) => {
        ::tracing::$level!(target: "filed::xattr", $($arg)*)
    };
}

/// Emits an event under `filed::wire`.
#[macro_export]
macro_rules! trace_wire {
    ($level:ident, $($arg:tt)*) => {
        ::tracing::$level!(target: "filed::wire", $($arg)*)
    };
}

/// Emits an event under `filed::heartbeat`.
#[macro_export]
macro_rules! trace_heartbeat {
    ($level:ident, $($arg:tt)*) => {
        ::tracing::$level!(target: "filed::heartbeat", $($arg)*)
    };
}
