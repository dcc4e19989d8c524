//! Runner configuration structures.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::runner_errors::{RunnerError, RunnerResult};
use crate::result_aggregator::AggregationConfig;
use crate::script::{Script, ScriptStep, TestMode};

/// Test scripts keyed by the model name the DUT reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestScripts {
    scripts: HashMap<String, Script>,
}

impl TestScripts {
    pub fn new(scripts: HashMap<String, Script>) -> Self {
        Self { scripts }
    }

    pub fn get(&self, model: &str) -> Option<&Script> {
        self.scripts.get(model)
    }

    /// Model names with a script, sorted.
    pub fn models(&self) -> Vec<String> {
        let mut models: Vec<String> = self.scripts.keys().cloned().collect();
        models.sort();
        models
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    /// Validates every script
    pub fn validate(&self) -> RunnerResult<()> {
        if self.scripts.is_empty() {
            return Err(RunnerError::ConfigValidationError {
                field: "scripts".to_string(),
                message: "At least one test script is required".to_string(),
            });
        }

        for (key, script) in &self.scripts {
            if script.model.trim().is_empty() {
                return Err(RunnerError::ConfigValidationError {
                    field: format!("{}.model", key),
                    message: "Model directory must not be empty".to_string(),
                });
            }

            if script.truth.trim().is_empty() {
                return Err(RunnerError::ConfigValidationError {
                    field: format!("{}.truth", key),
                    message: "Truth file must not be empty".to_string(),
                });
            }

            if script.records_per_sample() == 0 {
                return Err(RunnerError::ConfigValidationError {
                    field: format!("{}.steps", key),
                    message: "At least one infer step is required".to_string(),
                });
            }

            for step in &script.steps {
                if let ScriptStep::Infer { count: 0, .. } = step {
                    return Err(RunnerError::ConfigValidationError {
                        field: format!("{}.steps", key),
                        message: "Infer count must be greater than 0".to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Settings applied to the DUT before a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DutConfig {
    /// Supply voltage in millivolts, set through the power instrument.
    pub voltage_mv: Option<u32>,
}

impl DutConfig {
    pub fn validate(&self) -> RunnerResult<()> {
        if self.voltage_mv == Some(0) {
            return Err(RunnerError::ConfigValidationError {
                field: "voltage_mv".to_string(),
                message: "Voltage must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Overrides file values with command-line ones.
    pub fn with_voltage(mut self, voltage_mv: Option<u32>) -> Self {
        if voltage_mv.is_some() {
            self.voltage_mv = voltage_mv;
        }
        self
    }
}

/// Everything a run needs besides the device itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    pub test_script_path: PathBuf,
    pub dut_config_path: Option<PathBuf>,
    pub dataset_path: PathBuf,
    pub mode: TestMode,
    pub voltage_mv: Option<u32>,
    pub aggregation: AggregationConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            test_script_path: PathBuf::from("tests.json"),
            dut_config_path: None,
            dataset_path: PathBuf::from("datasets"),
            mode: TestMode::Accuracy,
            voltage_mv: None,
            aggregation: AggregationConfig::default(),
        }
    }
}
