//! Test runner wiring configuration, the DUT driver, the script engine and the
//! mode-specific reductions together.

pub mod performance_metrics;
pub mod runner_errors;
pub mod runner_types;
pub mod test_runner;

pub use performance_metrics::{PerformanceSummary, ThroughputStats, summarize_performance};
pub use runner_errors::{RunnerError, RunnerResult};
pub use runner_types::{DutConfig, RunnerConfig, TestScripts};
pub use test_runner::{ConfigLoader, RunReport, TestRunner};
