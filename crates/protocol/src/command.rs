//! Coordinator commands understood by the data-movement engine.

use crate::error::ProtocolError;

const ACCURATE_PREFIX: &str = "accurate files=";

/// Reply sent when the `accurate` command cannot be parsed.
pub const BAD_ACCURATE_REPLY: &str = "2991 Bad accurate command\n";

/// Formats the command announcing an accurate file list of `files` entries.
#[must_use]
pub fn format_accurate_command(files: u64) -> String {
    format!("{ACCURATE_PREFIX}{files}")
}

/// Parses `accurate files=<N>` and returns `N`.
///
/// Trailing whitespace, including a newline, is accepted.
pub fn parse_accurate_command(input: &[u8]) -> Result<u64, ProtocolError> {
    std::str::from_utf8(input)
        .ok()
        .and_then(|text| text.trim_end().strip_prefix(ACCURATE_PREFIX))
        .and_then(|count| count.parse::<u64>().ok())
        .ok_or_else(|| ProtocolError::accurate_command(input))
}
