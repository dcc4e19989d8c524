//! Test scripts and the engine that runs them against a device.
//!
//! A script is an ordered list of steps applied to every dataset sample. The
//! same loop serves all three test modes; the mode only decides how the
//! caller reduces the collected [`ResultRecord`]s afterwards.

use std::fmt;
use std::str::FromStr;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::dataset::Sample;
use crate::device_under_test::DeviceUnderTest;
use crate::errors::{DatasetResult, DutResult, ScriptError, ScriptResult};
use crate::protocol::{InferenceRequest, InferenceResult};
use crate::transport::Transport;

/// What a run is measuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestMode {
    Accuracy,
    Performance,
    Energy,
}

impl TestMode {
    /// Single letter used on the command line.
    pub fn short_name(&self) -> &'static str {
        match self {
            TestMode::Accuracy => "a",
            TestMode::Performance => "p",
            TestMode::Energy => "e",
        }
    }
}

impl fmt::Display for TestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestMode::Accuracy => "accuracy",
            TestMode::Performance => "performance",
            TestMode::Energy => "energy",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for TestMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "a" | "accuracy" => Ok(TestMode::Accuracy),
            "p" | "performance" => Ok(TestMode::Performance),
            "e" | "energy" => Ok(TestMode::Energy),
            other => Err(format!(
                "unknown test mode '{}', expected one of: a, p, e",
                other
            )),
        }
    }
}

/// One step of a test script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Upload the current sample's payload.
    Load,
    /// Run inference and record its results.
    Infer {
        #[serde(default = "default_infer_count")]
        count: u32,
        #[serde(default)]
        warmups: u32,
    },
}

fn default_infer_count() -> u32 {
    1
}

fn default_steps() -> Vec<ScriptStep> {
    vec![
        ScriptStep::Load,
        ScriptStep::Infer {
            count: default_infer_count(),
            warmups: 0,
        },
    ]
}

/// Per-model test script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    /// Dataset directory for the model, relative to the dataset root.
    pub model: String,
    /// Truth file inside the model's dataset directory.
    pub truth: String,
    #[serde(default = "default_steps")]
    pub steps: Vec<ScriptStep>,
}

/// Inference outputs for one sample, tagged with the sample's identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub file: String,
    pub true_class: usize,
    pub request: InferenceRequest,
    pub infer: InferenceResult,
}

impl ResultRecord {
    pub fn new(file: impl Into<String>, true_class: usize, infer: InferenceResult) -> Self {
        Self {
            file: file.into(),
            true_class,
            request: InferenceRequest::new(1, 0),
            infer,
        }
    }

    pub fn with_request(mut self, request: InferenceRequest) -> Self {
        self.request = request;
        self
    }
}

impl Script {
    pub fn new(model: impl Into<String>, truth: impl Into<String>, steps: Vec<ScriptStep>) -> Self {
        Self {
            model: model.into(),
            truth: truth.into(),
            steps,
        }
    }

    /// Number of records each sample produces.
    pub fn records_per_sample(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| matches!(step, ScriptStep::Infer { .. }))
            .count()
    }

    /// Runs every step for every sample until the dataset is exhausted.
    ///
    /// The first device or dataset failure aborts the run and the records
    /// collected so far are dropped.
    pub fn run<T, I>(
        &self,
        dut: &mut DeviceUnderTest<T>,
        dataset: I,
        mode: TestMode,
    ) -> ScriptResult<Vec<ResultRecord>>
    where
        T: Transport,
        I: IntoIterator<Item = DatasetResult<Sample>>,
    {
        info!(
            "Running {} script for model '{}' ({} steps per sample)",
            mode,
            self.model,
            self.steps.len()
        );
        if mode == TestMode::Energy && !dut.has_power_instrument() {
            warn!("Energy mode without a power instrument, no energy will be measured");
        }

        let mut records = Vec::new();
        let mut samples_processed = 0usize;

        for sample in dataset {
            let sample = sample.map_err(|source| ScriptError::Dataset {
                samples_processed,
                source,
            })?;

            self.run_sample(dut, &sample, &mut records)
                .map_err(|source| ScriptError::Device {
                    file: sample.file_name.clone(),
                    source,
                })?;

            samples_processed += 1;
            info!(
                "[{}] {} (class {}) done",
                samples_processed, sample.file_name, sample.true_class
            );
        }

        info!(
            "Script finished: {} samples, {} records",
            samples_processed,
            records.len()
        );
        Ok(records)
    }

    fn run_sample<T: Transport>(
        &self,
        dut: &mut DeviceUnderTest<T>,
        sample: &Sample,
        records: &mut Vec<ResultRecord>,
    ) -> DutResult<()> {
        for step in &self.steps {
            match *step {
                ScriptStep::Load => {
                    dut.load_payload(&sample.payload)?;
                }
                ScriptStep::Infer { count, warmups } => {
                    let request = InferenceRequest::new(count, warmups);
                    let infer = dut.run_inference(request)?;
                    records.push(ResultRecord {
                        file: sample.file_name.clone(),
                        true_class: sample.true_class,
                        request,
                        infer,
                    });
                }
            }
        }
        Ok(())
    }
}
