//! Reduction of a run's result records into file-level accuracy and AUC.
//!
//! Records are grouped by file name. Every record becomes one probability
//! vector (a vote); the file's prediction is the class with most votes. AUC is
//! computed from one probability vector per file.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::errors::{AggregationError, AggregationResult, AucError, AucResult};
use crate::script::ResultRecord;
use crate::utils::{AucScore, argmax, mean_vector, normalize, roc_auc, threshold_vector};

/// What to do with a multi-class result whose scores sum to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroSumPolicy {
    /// Fail the whole aggregation.
    #[default]
    Abort,
    /// Drop that record's vote and keep going.
    Skip,
}

/// Which probability vector represents a file when computing AUC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AucSource {
    /// The first vote recorded for the file.
    #[default]
    FirstVote,
    /// The element-wise mean of all the file's votes.
    MeanVote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub zero_sum_policy: ZeroSumPolicy,
    pub auc_source: AucSource,
}

/// All votes collected for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedFileResult {
    pub file: String,
    pub true_class: usize,
    pub votes: Vec<Vec<f32>>,
}

impl AggregatedFileResult {
    /// Majority vote over the argmax of each vote. The lowest class index wins ties.
    pub fn predicted_class(&self) -> Option<usize> {
        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for vote in &self.votes {
            if let Some(class) = argmax(vote) {
                *counts.entry(class).or_insert(0) += 1;
            }
        }

        let mut best: Option<(usize, usize)> = None;
        for (class, count) in counts {
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((class, count)),
            }
        }
        best.map(|(class, _)| class)
    }

    fn auc_vector(&self, source: AucSource) -> Option<Vec<f32>> {
        match source {
            AucSource::FirstVote => self.votes.first().cloned(),
            AucSource::MeanVote => mean_vector(&self.votes),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePrediction {
    pub file: String,
    pub true_class: usize,
    pub predicted_class: usize,
}

impl FilePrediction {
    pub fn is_correct(&self) -> bool {
        self.true_class == self.predicted_class
    }
}

/// Accuracy over files plus the AUC score or the reason it is undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct AccuracySummary {
    pub correct_files: usize,
    pub total_files: usize,
    pub predictions: Vec<FilePrediction>,
    pub auc: AucResult<AucScore>,
}

impl AccuracySummary {
    pub fn accuracy(&self) -> f64 {
        self.correct_files as f64 / self.total_files as f64
    }

    pub fn accuracy_percentage(&self) -> f64 {
        100.0 * self.accuracy()
    }
}

impl fmt::Display for AccuracySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Accuracy = {}/{} = {:4.2}%",
            self.correct_files,
            self.total_files,
            self.accuracy_percentage()
        )?;
        match &self.auc {
            Ok(score) => write!(f, "{}", score),
            Err(e) => write!(f, "AUC calculation failed: {}", e),
        }
    }
}

/// Turns one record's raw results into a probability vector.
///
/// A single score is thresholded into a two-class indicator; several scores
/// are normalized by their sum. NaN or infinite scores are rejected.
pub fn probability_vector(file: &str, results: &[f32]) -> AggregationResult<Vec<f32>> {
    if results.iter().any(|value| !value.is_finite()) {
        return Err(AggregationError::NonFiniteResults {
            file: file.to_string(),
            values: results.to_vec(),
        });
    }

    match results {
        [] => Err(AggregationError::EmptyInferenceResults {
            file: file.to_string(),
        }),
        [score] => Ok(threshold_vector(*score)),
        scores => normalize(scores).ok_or_else(|| AggregationError::ZeroSumProbabilities {
            file: file.to_string(),
            values: scores.to_vec(),
        }),
    }
}

pub struct ResultAggregator {
    config: AggregationConfig,
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new(AggregationConfig::default())
    }
}

impl ResultAggregator {
    pub fn new(config: AggregationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Groups records by file, in first-seen order, converting each into a vote.
    ///
    /// The true class of a file is taken from its first record.
    pub fn group(&self, records: &[ResultRecord]) -> AggregationResult<Vec<AggregatedFileResult>> {
        let mut files: Vec<AggregatedFileResult> = Vec::new();
        let mut index_by_file: HashMap<&str, usize> = HashMap::new();

        for record in records {
            let index = *index_by_file.entry(record.file.as_str()).or_insert_with(|| {
                files.push(AggregatedFileResult {
                    file: record.file.clone(),
                    true_class: record.true_class,
                    votes: Vec::new(),
                });
                files.len() - 1
            });

            match probability_vector(&record.file, &record.infer.results) {
                Ok(vote) => files[index].votes.push(vote),
                Err(e @ AggregationError::ZeroSumProbabilities { .. })
                    if self.config.zero_sum_policy == ZeroSumPolicy::Skip =>
                {
                    warn!("Skipping vote: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        files.retain(|file| {
            if file.votes.is_empty() {
                warn!("No usable votes for '{}', leaving it out of the summary", file.file);
            }
            !file.votes.is_empty()
        });

        Ok(files)
    }

    /// Computes file-level accuracy and the AUC score for a run.
    pub fn summarize(&self, records: &[ResultRecord]) -> AggregationResult<AccuracySummary> {
        let files = self.group(records)?;
        if files.is_empty() {
            return Err(AggregationError::EmptyResults);
        }

        let mut predictions = Vec::with_capacity(files.len());
        let mut true_labels = Vec::with_capacity(files.len());
        let mut probabilities = Vec::with_capacity(files.len());

        for file in &files {
            let (Some(predicted_class), Some(vector)) = (
                file.predicted_class(),
                file.auc_vector(self.config.auc_source),
            ) else {
                continue;
            };

            predictions.push(FilePrediction {
                file: file.file.clone(),
                true_class: file.true_class,
                predicted_class,
            });
            true_labels.push(file.true_class);
            probabilities.push(vector);
        }

        let correct_files = predictions.iter().filter(|p| p.is_correct()).count();
        let total_files = predictions.len();
        if total_files == 0 {
            return Err(AggregationError::EmptyResults);
        }

        let auc = roc_auc(&true_labels, &probabilities);
        match &auc {
            Ok(score) => info!("{}", score),
            Err(e @ AucError::SingleClass { .. }) => warn!("AUC undefined: {}", e),
            Err(e) => warn!("AUC calculation failed: {}", e),
        }
        info!(
            "Accuracy = {}/{} files ({} records)",
            correct_files,
            total_files,
            records.len()
        );

        Ok(AccuracySummary {
            correct_files,
            total_files,
            predictions,
            auc,
        })
    }
}
