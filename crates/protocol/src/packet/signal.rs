use ::core::fmt;
use ::core::str::FromStr;

use thiserror::Error;

/// Out-of-band signals carried by a negative length prefix.
///
/// The numeric values are the negative lengths written on the wire. A signal
/// never carries payload bytes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(i32)]
pub enum Signal {
    #[doc(alias = "BNET_EOD")]
    /// End of data for the current record or command.
    EndOfData = -1,
    #[doc(alias = "BNET_EOD_POLL")]
    /// End of data, and the sender waits for a reply.
    EndOfDataPoll = -2,
    #[doc(alias = "BNET_STATUS")]
    /// Status request.
    Status = -3,
    #[doc(alias = "BNET_TERMINATE")]
    /// The peer is shutting the connection down.
    Terminate = -4,
    #[doc(alias = "BNET_POLL")]
    /// Poll request.
    Poll = -5,
    #[doc(alias = "BNET_HEARTBEAT")]
    /// Keep-alive emitted while a long operation is in progress.
    Heartbeat = -6,
    #[doc(alias = "BNET_HB_RESPONSE")]
    /// Reply to a [`Signal::Heartbeat`].
    HeartbeatResponse = -7,
    #[doc(alias = "BNET_PROMPT")]
    /// Prompt for input.
    Prompt = -8,
    #[doc(alias = "BNET_BTIME")]
    /// Time exchange.
    Btime = -9,
    #[doc(alias = "BNET_BREAK")]
    /// Stop the current operation.
    Break = -10,
    #[doc(alias = "BNET_START_SELECT")]
    /// Start of a selection list.
    StartSelect = -11,
    #[doc(alias = "BNET_END_SELECT")]
    /// End of a selection list.
    EndSelect = -12,
}

/// Error returned when parsing a signal from its mnemonic name fails.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("unknown packet signal name: \"{invalid_name}\"")]
pub struct ParseSignalError {
    invalid_name: String,
}

impl ParseSignalError {
    /// Returns the mnemonic name that failed to parse.
    #[must_use]
    pub fn invalid_name(&self) -> &str {
        &self.invalid_name
    }
}

impl Signal {
    /// All signals in wire order.
    pub const ALL: [Signal; 12] = [
        Signal::EndOfData,
        Signal::EndOfDataPoll,
        Signal::Status,
        Signal::Terminate,
        Signal::Poll,
        Signal::Heartbeat,
        Signal::HeartbeatResponse,
        Signal::Prompt,
        Signal::Btime,
        Signal::Break,
        Signal::StartSelect,
        Signal::EndSelect,
    ];

    /// Returns the negative length written on the wire.
    #[must_use]
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Attempts to construct a [`Signal`] from a negative length prefix.
    #[must_use]
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            -1 => Some(Self::EndOfData),
            -2 => Some(Self::EndOfDataPoll),
            -3 => Some(Self::Status),
            -4 => Some(Self::Terminate),
            -5 => Some(Self::Poll),
            -6 => Some(Self::Heartbeat),
            -7 => Some(Self::HeartbeatResponse),
            -8 => Some(Self::Prompt),
            -9 => Some(Self::Btime),
            -10 => Some(Self::Break),
            -11 => Some(Self::StartSelect),
            -12 => Some(Self::EndSelect),
            _ => None,
        }
    }

    /// Returns the mnemonic used in traces.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::EndOfData => "EOD",
            Self::EndOfDataPoll => "EOD_POLL",
            Self::Status => "STATUS",
            Self::Terminate => "TERMINATE",
            Self::Poll => "POLL",
            Self::Heartbeat => "HEARTBEAT",
            Self::HeartbeatResponse => "HB_RESPONSE",
            Self::Prompt => "PROMPT",
            Self::Btime => "BTIME",
            Self::Break => "BREAK",
            Self::StartSelect => "START_SELECT",
            Self::EndSelect => "END_SELECT",
        }
    }

    /// Reports whether the signal terminates a record or command.
    #[must_use]
    pub const fn is_end_of_data(self) -> bool {
        matches!(self, Self::EndOfData | Self::EndOfDataPoll)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Signal {
    type Err = ParseSignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|signal| signal.name() == s)
            .ok_or_else(|| ParseSignalError {
                invalid_name: s.to_owned(),
            })
    }
}

impl From<Signal> for i32 {
    fn from(signal: Signal) -> Self {
        signal.as_i32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_are_stable() {
        assert_eq!(Signal::EndOfData.as_i32(), -1);
        assert_eq!(Signal::Heartbeat.as_i32(), -6);
        assert_eq!(Signal::EndSelect.as_i32(), -12);
    }

    #[test]
    fn from_i32_round_trips_every_signal() {
        for signal in Signal::ALL {
            assert_eq!(Signal::from_i32(signal.as_i32()), Some(signal));
        }
        assert_eq!(Signal::from_i32(0), None);
        assert_eq!(Signal::from_i32(-13), None);
        assert_eq!(Signal::from_i32(7), None);
    }

    #[test]
    fn names_parse_back() {
        for signal in Signal::ALL {
            assert_eq!(signal.to_string().parse::<Signal>(), Ok(signal));
        }
        let err = "NOPE".parse::<Signal>().unwrap_err();
        assert_eq!(err.invalid_name(), "NOPE");
    }
}
