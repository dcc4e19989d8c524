//! Command vocabulary and response grammar of the DUT line protocol.
//!
//! Commands are plain ASCII lines; payload bytes travel as lowercase hex.
//! Responses are free-form lines of which only a handful of `m-...` lines
//! carry data:
//!
//! - `m-name-dut-[<value>]`
//! - `m-model-[<value>]` and `m-profile-[<value>]`
//! - `m-results-[<f32>,<f32>,...]`
//! - `m-lap-us-<microseconds>`

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{DutError, DutResult};

pub const NAME_COMMAND: &str = "name";
pub const PROFILE_COMMAND: &str = "profile";
pub const TIMESTAMP_COMMAND: &str = "timestamp";
pub const HELP_COMMAND: &str = "help";
pub const PRINT_BUFFER_COMMAND: &str = "db print";

/// Compiled patterns for the response lines the driver understands.
struct ResponsePatterns {
    /// Matches `m-name-dut-[board]`
    name: Regex,
    /// Matches `m-model-[kws01]` and `m-profile-[ulp-mlperf]`
    identity: Regex,
    /// Matches `m-results-[0.1,0.9]`
    results: Regex,
    /// Matches `m-lap-us-123456`
    lap: Regex,
}

fn patterns() -> &'static ResponsePatterns {
    static PATTERNS: OnceLock<ResponsePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| ResponsePatterns {
        name: Regex::new(r"^m-name-dut-\[([^\]]+)\]$").expect("name pattern is valid"),
        identity: Regex::new(r"^m-(model|profile)-\[([^\]]+)\]$")
            .expect("identity pattern is valid"),
        results: Regex::new(r"^m-results-\[([^\]]*)\]$").expect("results pattern is valid"),
        lap: Regex::new(r"^m-lap-us-(\d+)$").expect("lap pattern is valid"),
    })
}

/// What the device has told us about itself so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub name: Option<String>,
    pub model: Option<String>,
    pub profile: Option<String>,
}

impl DeviceIdentity {
    /// Records the name found in a `name` response. Returns how many fields were set.
    ///
    /// A field that is already known is never overwritten.
    pub(crate) fn absorb_name(&mut self, lines: &[String]) -> usize {
        let mut found = 0;
        for line in lines {
            if let Some(captures) = patterns().name.captures(line.trim()) {
                if fill(&mut self.name, &captures[1]) {
                    found += 1;
                }
            }
        }
        found
    }

    /// Records model and profile from a `profile` response. Returns how many fields were set.
    pub(crate) fn absorb_profile(&mut self, lines: &[String]) -> usize {
        let mut found = 0;
        for line in lines {
            let Some(captures) = patterns().identity.captures(line.trim()) else {
                continue;
            };
            let filled = match &captures[1] {
                "model" => fill(&mut self.model, &captures[2]),
                "profile" => fill(&mut self.profile, &captures[2]),
                _ => false,
            };
            if filled {
                found += 1;
            }
        }
        found
    }

    pub fn is_complete(&self) -> bool {
        self.name.is_some() && self.model.is_some() && self.profile.is_some()
    }
}

fn fill(slot: &mut Option<String>, value: &str) -> bool {
    if slot.is_some() {
        return false;
    }
    *slot = Some(value.to_string());
    true
}

/// Parameters of one `infer` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceRequest {
    pub sample_count: u32,
    pub warmup_count: u32,
}

impl InferenceRequest {
    pub fn new(sample_count: u32, warmup_count: u32) -> Self {
        Self {
            sample_count,
            warmup_count,
        }
    }

    /// Builds the command text. The warmup count is always present since the
    /// device runs 10 warmups when it is omitted.
    pub fn command(&self) -> String {
        format!("infer {} {}", self.sample_count, self.warmup_count)
    }
}

/// Raw outputs of one inference call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    /// A single detector score, or one raw score per class.
    pub results: Vec<f32>,
    /// Device time between the first and last lap marker, if it reported two.
    pub elapsed_us: Option<u64>,
    /// Response lines as received.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub response: Vec<String>,
}

impl InferenceResult {
    pub fn new(results: Vec<f32>) -> Self {
        Self {
            results,
            elapsed_us: None,
            response: Vec::new(),
        }
    }

    /// Parses the response to an `infer` command.
    pub fn parse(command: &str, lines: Vec<String>) -> DutResult<Self> {
        let mut results = None;
        let mut laps = Vec::new();

        for line in &lines {
            let line = line.trim();
            if let Some(captures) = patterns().lap.captures(line) {
                if let Ok(micros) = captures[1].parse::<u64>() {
                    laps.push(micros);
                }
            } else if results.is_none() {
                if let Some(captures) = patterns().results.captures(line) {
                    results = Some(parse_values(line, &captures[1])?);
                }
            }
        }

        let results = results.ok_or_else(|| DutError::MissingInferenceResults {
            command: command.to_string(),
        })?;

        let elapsed_us = match (laps.first(), laps.last()) {
            (Some(first), Some(last)) if laps.len() >= 2 => Some(last.saturating_sub(*first)),
            _ => None,
        };

        Ok(Self {
            results,
            elapsed_us,
            response: lines,
        })
    }
}

fn parse_values(line: &str, body: &str) -> DutResult<Vec<f32>> {
    body.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            value
                .parse::<f32>()
                .map_err(|_| DutError::MalformedInferenceResults {
                    line: line.to_string(),
                })
        })
        .collect()
}

/// `db load <N>`: announces a payload of `size` bytes.
pub fn begin_load_command(size: usize) -> String {
    format!("db load {}", size)
}

/// `db <hex>`: one payload chunk.
pub fn chunk_command(chunk: &[u8]) -> String {
    format!("db {}", hex::encode(chunk))
}
