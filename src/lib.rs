//! Benchmark runner for machine-learning inference on a device under test.
//!
//! This library drives a physical device over a line-oriented command protocol:
//! it identifies the device, streams dataset samples to it in bounded chunks,
//! triggers timed (and optionally power-instrumented) inference, and reduces the
//! collected outputs into file-level accuracy, AUC or throughput figures.

pub mod dataset;
pub mod device_under_test;
pub mod errors;
pub mod power;
pub mod protocol;
pub mod result_aggregator;
pub mod runner;
pub mod script;
pub mod transport;
pub mod utils;

pub use dataset::{Sample, TruthFileDataset};
pub use device_under_test::DeviceUnderTest;
pub use power::PowerInstrument;
pub use protocol::{DeviceIdentity, InferenceRequest, InferenceResult};
pub use result_aggregator::{AccuracySummary, AggregationConfig, ResultAggregator};
pub use script::{ResultRecord, Script, ScriptStep, TestMode};
pub use transport::{LineTransport, Transport};
