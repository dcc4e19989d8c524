//! Core test run logic: configuration, identification, script execution and
//! the mode-specific reduction of the results.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::{info, warn};
use serde::de::DeserializeOwned;

use super::performance_metrics::{PerformanceSummary, summarize_performance};
use super::runner_errors::{RunnerError, RunnerResult};
use super::runner_types::{DutConfig, RunnerConfig, TestScripts};
use crate::dataset::TruthFileDataset;
use crate::device_under_test::DeviceUnderTest;
use crate::result_aggregator::{AccuracySummary, ResultAggregator};
use crate::script::{ResultRecord, TestMode};
use crate::transport::Transport;

/// Configuration loader for the JSON files a run reads.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a configuration file with fallback to defaults
    pub fn load_config<T>(path: &Path, config_name: &str) -> RunnerResult<T>
    where
        T: DeserializeOwned + Default,
    {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(path, &content),
            Err(_) => {
                warn!(
                    "Config file '{}' not found, using default configuration for {}",
                    path.display(),
                    config_name
                );
                Ok(T::default())
            }
        }
    }

    /// Load a configuration file that must exist
    pub fn load_required<T: DeserializeOwned>(path: &Path) -> RunnerResult<T> {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(path, &content),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(RunnerError::ConfigFileNotFound {
                path: path.display().to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Load and validate the test scripts
    pub fn load_test_scripts(path: &Path) -> RunnerResult<TestScripts> {
        let scripts: TestScripts = Self::load_required(path)?;
        scripts.validate()?;
        info!(
            "Loaded test scripts for models: {}",
            scripts.models().join(", ")
        );
        Ok(scripts)
    }

    /// Load the DUT configuration, if a file was given
    pub fn load_dut_config(path: Option<&Path>) -> RunnerResult<DutConfig> {
        let config = match path {
            Some(path) => Self::load_config(path, "dut")?,
            None => DutConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn parse<T: DeserializeOwned>(path: &Path, content: &str) -> RunnerResult<T> {
        serde_json::from_str(content).map_err(|e| RunnerError::ConfigParseError {
            path: path.display().to_string(),
            source: e,
        })
    }
}

/// Outcome of a run, reduced according to its mode.
#[derive(Debug, Clone, PartialEq)]
pub enum RunReport {
    Accuracy(AccuracySummary),
    Performance(PerformanceSummary),
    Energy { records: usize },
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunReport::Accuracy(summary) => write!(f, "{}", summary),
            RunReport::Performance(summary) => write!(f, "{}", summary),
            RunReport::Energy { records } => write!(
                f,
                "Energy mode: {} records collected, no energy reduction is defined",
                records
            ),
        }
    }
}

/// Main test runner
pub struct TestRunner {
    config: RunnerConfig,
}

impl TestRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Loads the configuration files, then runs the script matching the DUT's model.
    pub fn run<T: Transport>(&self, dut: &mut DeviceUnderTest<T>) -> RunnerResult<RunReport> {
        let scripts = ConfigLoader::load_test_scripts(&self.config.test_script_path)?;
        let dut_config = ConfigLoader::load_dut_config(self.config.dut_config_path.as_deref())?
            .with_voltage(self.config.voltage_mv);

        self.run_with(dut, &scripts, &dut_config)
    }

    /// Runs with already loaded configuration.
    pub fn run_with<T: Transport>(
        &self,
        dut: &mut DeviceUnderTest<T>,
        scripts: &TestScripts,
        dut_config: &DutConfig,
    ) -> RunnerResult<RunReport> {
        if let Some(voltage_mv) = dut_config.voltage_mv {
            if !dut.configure_voltage(voltage_mv)? {
                return Err(RunnerError::ConfigValidationError {
                    field: "voltage_mv".to_string(),
                    message: format!(
                        "{} mV requested but no power instrument is attached",
                        voltage_mv
                    ),
                });
            }
        }

        let identity = dut.identify()?;
        info!(
            "DUT: name={} model={} profile={}",
            identity.name.as_deref().unwrap_or("<unknown>"),
            identity.model.as_deref().unwrap_or("<unknown>"),
            identity.profile.as_deref().unwrap_or("<unknown>")
        );
        let model = identity
            .model
            .clone()
            .ok_or(RunnerError::ModelNotIdentified)?;

        let script = scripts
            .get(&model)
            .ok_or_else(|| RunnerError::ScriptNotFound {
                model: model.clone(),
                available: scripts.models(),
            })?;

        let dataset =
            TruthFileDataset::open(self.config.dataset_path.join(&script.model), &script.truth)?;
        info!(
            "Dataset for '{}' has {} samples",
            script.model,
            dataset.remaining()
        );

        let records = script.run(dut, dataset, self.config.mode)?;
        self.summarize(&records)
    }

    /// Reduces records according to the configured mode.
    pub fn summarize(&self, records: &[ResultRecord]) -> RunnerResult<RunReport> {
        match self.config.mode {
            TestMode::Accuracy => {
                let aggregator = ResultAggregator::new(self.config.aggregation);
                Ok(RunReport::Accuracy(aggregator.summarize(records)?))
            }
            TestMode::Performance => Ok(RunReport::Performance(summarize_performance(records))),
            TestMode::Energy => {
                warn!("Energy reduction is not defined yet, reporting record count only");
                Ok(RunReport::Energy {
                    records: records.len(),
                })
            }
        }
    }
}
