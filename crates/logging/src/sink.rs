//! Line-oriented writer for job messages.

use std::io::{self, Write};

use crate::levels::{MessageCounts, MessageKind};
use crate::message::JobMessage;

/// Writes [`JobMessage`] values to an underlying writer and counts them per kind.
///
/// The sink owns its writer; callers that share it between threads wrap the
/// sink in a mutex.
#[derive(Debug)]
pub struct MessageSink<W> {
    writer: W,
    terminate_lines: bool,
    counts: MessageCounts,
}

impl<W> MessageSink<W> {
    /// Creates a sink that terminates each message with a newline.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            terminate_lines: true,
            counts: MessageCounts::new(),
        }
    }

    /// Creates a sink that writes messages back to back, for framed channels
    /// where each write is already one message.
    #[must_use]
    pub const fn unterminated(writer: W) -> Self {
        Self {
            writer,
            terminate_lines: false,
            counts: MessageCounts::new(),
        }
    }

    /// Reports whether a newline follows each message.
    #[must_use]
    pub const fn terminates_lines(&self) -> bool {
        self.terminate_lines
    }

    /// Messages written so far, by kind.
    #[must_use]
    pub const fn counts(&self) -> &MessageCounts {
        &self.counts
    }

    /// Borrows the underlying writer.
    #[must_use]
    pub const fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Mutably borrows the underlying writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MessageSink<W> {
    /// Writes one message.
    pub fn write(&mut self, message: &JobMessage) -> io::Result<()> {
        message.render_to_writer(&mut self.writer, self.terminate_lines)?;
        self.counts.record(message.kind());
        Ok(())
    }

    /// Builds and writes a message in one step.
    pub fn emit(&mut self, kind: MessageKind, text: impl Into<String>) -> io::Result<()> {
        self.write(&JobMessage::new(kind, text))
    }

    /// Writes every message yielded by `messages`, stopping at the first error.
    pub fn write_all<'a, I>(&mut self, messages: I) -> io::Result<()>
    where
        I: IntoIterator<Item = &'a JobMessage>,
    {
        for message in messages {
            self.write(message)?;
        }
        Ok(())
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
