//! Error types for transport exchanges.

use thiserror::Error;

/// Errors raised while exchanging a command with the device.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error while talking to the device: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Connection closed before the end marker '{end_marker}' was received for command '{command}'")]
    ConnectionClosed { command: String, end_marker: String },

    #[error("Command must be a single line of ASCII text: {command:?}")]
    InvalidCommand { command: String },
}
