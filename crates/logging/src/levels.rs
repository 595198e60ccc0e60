//! Job message kinds and tracing subsystems.

use ::core::fmt;
use ::core::str::FromStr;

/// Category of a job message reported to the coordinator.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MessageKind {
    /// Informational message.
    Info,
    /// Something unexpected that did not affect the saved data.
    Warning,
    /// A per-file failure; the job continues.
    Error,
    /// A failure that terminates the job.
    Fatal,
    /// An entry could not be saved.
    NotSaved,
    /// An entry was skipped on purpose.
    Skipped,
    /// An entry was saved.
    Saved,
    /// An entry was restored.
    Restored,
}

impl MessageKind {
    /// All kinds in declaration order.
    pub const ALL: [MessageKind; 8] = [
        MessageKind::Info,
        MessageKind::Warning,
        MessageKind::Error,
        MessageKind::Fatal,
        MessageKind::NotSaved,
        MessageKind::Skipped,
        MessageKind::Saved,
        MessageKind::Restored,
    ];

    /// Label written in front of the message text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Fatal => "fatal",
            Self::NotSaved => "not saved",
            Self::Skipped => "skipped",
            Self::Saved => "saved",
            Self::Restored => "restored",
        }
    }

    /// Reports whether the kind describes a failure.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Error | Self::Fatal | Self::NotSaved)
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a message kind label is not recognised.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseMessageKindError {
    label: String,
}

impl ParseMessageKindError {
    /// Returns the label that failed to parse.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for ParseMessageKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown message kind: \"{}\"", self.label)
    }
}

impl std::error::Error for ParseMessageKindError {}

impl FromStr for MessageKind {
    type Err = ParseMessageKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseMessageKindError {
                label: s.to_owned(),
            })
    }
}

/// Per-kind message counters.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MessageCounts {
    counts: [u64; MessageKind::ALL.len()],
}

impl MessageCounts {
    /// Creates zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            counts: [0; MessageKind::ALL.len()],
        }
    }

    /// Records one message of `kind`.
    pub fn record(&mut self, kind: MessageKind) {
        self.counts[kind.index()] += 1;
    }

    /// Number of messages of `kind` recorded so far.
    #[must_use]
    pub const fn get(&self, kind: MessageKind) -> u64 {
        self.counts[kind.index()]
    }

    /// Number of failure messages recorded so far.
    #[must_use]
    pub fn failures(&self) -> u64 {
        MessageKind::ALL
            .into_iter()
            .filter(|kind| kind.is_failure())
            .map(|kind| self.get(kind))
            .sum()
    }
}

/// Subsystems that emit tracing events, each with its own target.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Subsystem {
    /// Save path.
    Save,
    /// Restore path.
    Restore,
    /// Change-detection table.
    Accurate,
    /// ACL backends.
    Acl,
    /// Xattr backends.
    Xattr,
    /// Packet framing.
    Wire,
    /// Keep-alive monitor.
    Heartbeat,
}

impl Subsystem {
    /// All subsystems.
    pub const ALL: [Subsystem; 7] = [
        Subsystem::Save,
        Subsystem::Restore,
        Subsystem::Accurate,
        Subsystem::Acl,
        Subsystem::Xattr,
        Subsystem::Wire,
        Subsystem::Heartbeat,
    ];

    /// Short name used in verbosity flags.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Save => "save",
            Self::Restore => "restore",
            Self::Accurate => "accurate",
            Self::Acl => "acl",
            Self::Xattr => "xattr",
            Self::Wire => "wire",
            Self::Heartbeat => "heartbeat",
        }
    }

    /// Tracing target of the subsystem.
    #[must_use]
    pub const fn target(self) -> &'static str {
        match self {
            Self::Save => "filed::save",
            Self::Restore => "filed::restore",
            Self::Accurate => "filed::accurate",
            Self::Acl => "filed::acl",
            Self::Xattr => "filed::xattr",
            Self::Wire => "filed::wire",
            Self::Heartbeat => "filed::heartbeat",
        }
    }

    /// Looks up a subsystem by its flag name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|subsystem| subsystem.name() == name)
    }

    /// Maps a tracing target back to its subsystem.
    #[must_use]
    pub fn from_target(target: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|subsystem| subsystem.target() == target)
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse_from_their_labels() {
        for kind in MessageKind::ALL {
            assert_eq!(kind.as_str().parse::<MessageKind>(), Ok(kind));
        }
        let err = "debug".parse::<MessageKind>().unwrap_err();
        assert_eq!(err.label(), "debug");
        assert_eq!(err.to_string(), "unknown message kind: \"debug\"");
    }

    #[test]
    fn counts_track_failures() {
        let mut counts = MessageCounts::default();
        counts.record(MessageKind::Saved);
        counts.record(MessageKind::NotSaved);
        counts.record(MessageKind::Error);
        counts.record(MessageKind::Skipped);
        assert_eq!(counts.get(MessageKind::Saved), 1);
        assert_eq!(counts.failures(), 2);
    }

    #[test]
    fn subsystem_targets_round_trip() {
        for subsystem in Subsystem::ALL {
            assert_eq!(Subsystem::from_target(subsystem.target()), Some(subsystem));
            assert_eq!(Subsystem::from_name(subsystem.name()), Some(subsystem));
        }
        assert_eq!(Subsystem::from_target("filed"), None);
    }
}
