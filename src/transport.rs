//! Command/response transport used to talk to the device under test.
//!
//! The device speaks a half-duplex line protocol: the host writes one command,
//! the device answers with any number of lines and finishes with an end marker.
//! Opening the underlying stream (serial port, socket, FIFO) is the caller's job.

use std::io::{BufRead, Write};

use log::{debug, trace};

use crate::errors::{TransportError, TransportResult};

/// Line the device prints once it is ready for the next command.
pub const DEFAULT_END_MARKER: &str = "m-ready";

/// Delimiter the device expects after every command.
pub const DEFAULT_TERMINATOR: &str = "%";

/// A duplex byte stream with a command/response convention.
pub trait Transport {
    /// Sends a single command line and returns the response lines with the
    /// end marker already stripped.
    fn send_command(&mut self, command: &str) -> TransportResult<Vec<String>>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send_command(&mut self, command: &str) -> TransportResult<Vec<String>> {
        (**self).send_command(command)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send_command(&mut self, command: &str) -> TransportResult<Vec<String>> {
        (**self).send_command(command)
    }
}

/// Line-oriented transport over any buffered reader and writer pair.
///
/// Reads block until the end marker arrives or the stream fails; timeouts are
/// the business of the underlying stream.
pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
    end_marker: String,
    terminator: String,
}

impl<R: BufRead, W: Write> LineTransport<R, W> {
    /// Creates a transport using the default end marker and terminator.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            end_marker: DEFAULT_END_MARKER.to_string(),
            terminator: DEFAULT_TERMINATOR.to_string(),
        }
    }

    pub fn with_end_marker(mut self, end_marker: impl Into<String>) -> Self {
        self.end_marker = end_marker.into();
        self
    }

    pub fn with_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.terminator = terminator.into();
        self
    }

    pub fn end_marker(&self) -> &str {
        &self.end_marker
    }

    /// Releases the reader and writer.
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }

    fn read_response(&mut self, command: &str) -> TransportResult<Vec<String>> {
        let mut lines = Vec::new();
        let mut buffer = String::new();

        loop {
            buffer.clear();
            let read = self.reader.read_line(&mut buffer)?;
            if read == 0 {
                return Err(TransportError::ConnectionClosed {
                    command: command.to_string(),
                    end_marker: self.end_marker.clone(),
                });
            }

            let line = buffer.trim();
            if line.is_empty() {
                continue;
            }
            if line == self.end_marker {
                break;
            }
            trace!("<- {}", line);
            lines.push(line.to_string());
        }

        Ok(lines)
    }
}

impl<R: BufRead, W: Write> Transport for LineTransport<R, W> {
    fn send_command(&mut self, command: &str) -> TransportResult<Vec<String>> {
        if !command.is_ascii() || command.contains(['\r', '\n']) {
            return Err(TransportError::InvalidCommand {
                command: command.to_string(),
            });
        }

        debug!("-> {}", command);
        self.writer.write_all(command.as_bytes())?;
        self.writer.write_all(self.terminator.as_bytes())?;
        self.writer.flush()?;

        self.read_response(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_until_end_marker() {
        let input = b"m-name-dut-[board]\r\n\r\nm-ready\r\nleftover\r\n".to_vec();
        let mut transport = LineTransport::new(Cursor::new(input), Vec::new());

        let lines = transport.send_command("name").unwrap();
        assert_eq!(lines, vec!["m-name-dut-[board]".to_string()]);

        let (_, written) = transport.into_inner();
        assert_eq!(written, b"name%".to_vec());
    }

    #[test]
    fn test_custom_terminator_and_marker() {
        let input = b"ok\nDONE\n".to_vec();
        let mut transport = LineTransport::new(Cursor::new(input), Vec::new())
            .with_end_marker("DONE")
            .with_terminator("\n");

        let lines = transport.send_command("help").unwrap();
        assert_eq!(lines, vec!["ok".to_string()]);
        assert_eq!(transport.end_marker(), "DONE");

        let (_, written) = transport.into_inner();
        assert_eq!(written, b"help\n".to_vec());
    }

    #[test]
    fn test_eof_before_marker_is_connection_closed() {
        let input = b"m-lap-us-10\n".to_vec();
        let mut transport = LineTransport::new(Cursor::new(input), Vec::new());

        let result = transport.send_command("infer 1 0");
        assert!(matches!(
            result,
            Err(TransportError::ConnectionClosed { ref command, .. }) if command == "infer 1 0"
        ));
    }

    #[test]
    fn test_rejects_multiline_command() {
        let mut transport = LineTransport::new(Cursor::new(Vec::new()), Vec::new());
        let result = transport.send_command("name\nprofile");
        assert!(matches!(result, Err(TransportError::InvalidCommand { .. })));
    }
}
