//! Error types for script execution.

use thiserror::Error;

use super::{DatasetError, DutError};

/// Errors that abort a script run. Records collected before the failure are discarded.
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Device error while processing '{file}': {source}")]
    Device {
        file: String,
        #[source]
        source: DutError,
    },

    #[error("Dataset error after {samples_processed} samples: {source}")]
    Dataset {
        samples_processed: usize,
        #[source]
        source: DatasetError,
    },
}
