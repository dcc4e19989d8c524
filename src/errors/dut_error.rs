//! Error types for the DUT driver and its power instrument.

use thiserror::Error;

use super::TransportError;

/// Errors reported by a power instrument.
#[derive(Error, Debug)]
pub enum PowerError {
    #[error("Power instrument failure: {message}")]
    InstrumentFailure { message: String },

    #[error("Voltage {millivolts} mV is outside the supported range")]
    UnsupportedVoltage { millivolts: u32 },
}

/// Errors that can occur while driving the device under test.
#[derive(Error, Debug)]
pub enum DutError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Power(#[from] PowerError),

    #[error("No results line in the response to '{command}'")]
    MissingInferenceResults { command: String },

    #[error("Could not parse inference results from line '{line}'")]
    MalformedInferenceResults { line: String },
}
