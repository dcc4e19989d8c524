//! Error types for runner operations.

use std::error::Error;
use std::fmt;

use crate::errors::{AggregationError, DatasetError, DutError, ScriptError};

#[derive(Debug)]
pub enum RunnerError {
    ConfigFileNotFound {
        path: String,
    },
    ConfigParseError {
        path: String,
        source: serde_json::Error,
    },
    ConfigValidationError {
        field: String,
        message: String,
    },
    IoError {
        source: std::io::Error,
    },
    ModelNotIdentified,
    ScriptNotFound {
        model: String,
        available: Vec<String>,
    },
    Device {
        source: DutError,
    },
    Dataset {
        source: DatasetError,
    },
    Script {
        source: ScriptError,
    },
    Aggregation {
        source: AggregationError,
    },
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerError::ConfigFileNotFound { path } => {
                write!(f, "Configuration file not found: {}", path)
            }
            RunnerError::ConfigParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse configuration file '{}': {}",
                    path, source
                )
            }
            RunnerError::ConfigValidationError { field, message } => {
                write!(
                    f,
                    "Configuration validation error for field '{}': {}",
                    field, message
                )
            }
            RunnerError::IoError { source } => {
                write!(f, "IO error: {}", source)
            }
            RunnerError::ModelNotIdentified => {
                write!(
                    f,
                    "The DUT did not report its model, cannot select a test script"
                )
            }
            RunnerError::ScriptNotFound { model, available } => {
                write!(
                    f,
                    "No test script for model '{}'. Available: {}",
                    model,
                    available.join(", ")
                )
            }
            RunnerError::Device { source } => {
                write!(f, "Device error: {}", source)
            }
            RunnerError::Dataset { source } => {
                write!(f, "Dataset error: {}", source)
            }
            RunnerError::Script { source } => {
                write!(f, "Test script failed: {}", source)
            }
            RunnerError::Aggregation { source } => {
                write!(f, "Result aggregation failed: {}", source)
            }
        }
    }
}

impl Error for RunnerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RunnerError::ConfigParseError { source, .. } => Some(source),
            RunnerError::IoError { source } => Some(source),
            RunnerError::Device { source } => Some(source),
            RunnerError::Dataset { source } => Some(source),
            RunnerError::Script { source } => Some(source),
            RunnerError::Aggregation { source } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RunnerError {
    fn from(error: std::io::Error) -> Self {
        RunnerError::IoError { source: error }
    }
}

impl From<DutError> for RunnerError {
    fn from(error: DutError) -> Self {
        RunnerError::Device { source: error }
    }
}

impl From<DatasetError> for RunnerError {
    fn from(error: DatasetError) -> Self {
        RunnerError::Dataset { source: error }
    }
}

impl From<ScriptError> for RunnerError {
    fn from(error: ScriptError) -> Self {
        RunnerError::Script { source: error }
    }
}

impl From<AggregationError> for RunnerError {
    fn from(error: AggregationError) -> Self {
        RunnerError::Aggregation { source: error }
    }
}

pub type RunnerResult<T> = Result<T, RunnerError>;
