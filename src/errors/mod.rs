//! Error types for the DUT benchmark runner.
//!
//! Each concern gets its own error enum so callers can tell a dead transport
//! apart from a device that answered with garbage, without reaching for
//! generic wrappers like `anyhow` or `Box<dyn Error>`.

mod aggregation_error;
mod dataset_error;
mod dut_error;
mod script_error;
mod transport_error;

pub use aggregation_error::{AggregationError, AucError};
pub use dataset_error::DatasetError;
pub use dut_error::{DutError, PowerError};
pub use script_error::ScriptError;
pub use transport_error::TransportError;

/// Result type alias for transport exchanges.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Result type alias for power instrument operations.
pub type PowerResult<T> = std::result::Result<T, PowerError>;

/// Result type alias for DUT driver operations.
pub type DutResult<T> = std::result::Result<T, DutError>;

/// Result type alias for dataset iteration.
pub type DatasetResult<T> = std::result::Result<T, DatasetError>;

/// Result type alias for script execution.
pub type ScriptResult<T> = std::result::Result<T, ScriptError>;

/// Result type alias for result aggregation.
pub type AggregationResult<T> = std::result::Result<T, AggregationError>;

/// Result type alias for AUC computation.
pub type AucResult<T> = std::result::Result<T, AucError>;
