use std::fmt;
use std::io::{self, Write};

use crate::levels::MessageKind;

/// A job message: a kind and a single line of text.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JobMessage {
    kind: MessageKind,
    text: String,
}

impl JobMessage {
    /// Creates a message of `kind`. Trailing newlines are stripped.
    #[must_use]
    pub fn new(kind: MessageKind, text: impl Into<String>) -> Self {
        let mut text = text.into();
        while text.ends_with('\n') {
            text.pop();
        }
        Self { kind, text }
    }

    /// Creates an informational message.
    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Info, text)
    }

    /// Creates a warning.
    #[must_use]
    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Warning, text)
    }

    /// Creates a per-file error.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Error, text)
    }

    /// Creates a fatal error.
    #[must_use]
    pub fn fatal(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Fatal, text)
    }

    /// Returns the kind.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Returns the text without the kind label.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Renders `<kind>: <text>` into `writer`, optionally followed by a newline.
    pub fn render_to_writer<W: Write + ?Sized>(
        &self,
        writer: &mut W,
        newline: bool,
    ) -> io::Result<()> {
        write!(writer, "{}: {}", self.kind, self.text)?;
        if newline {
            writer.write_all(b"\n")?;
        }
        Ok(())
    }
}

impl fmt::Display for JobMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.text)
    }
}
