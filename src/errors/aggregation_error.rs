//! Error types for result aggregation and AUC scoring.

use thiserror::Error;

/// Errors that stop the aggregation of a run's results.
#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("No results to aggregate")]
    EmptyResults,

    #[error("Inference results for '{file}' are empty")]
    EmptyInferenceResults { file: String },

    #[error("Inference results for '{file}' contain non-finite values: {values:?}")]
    NonFiniteResults { file: String, values: Vec<f32> },

    #[error("Sum of probabilities is zero for '{file}', cannot normalize: {values:?}")]
    ZeroSumProbabilities { file: String, values: Vec<f32> },
}

/// Reasons an AUC score is undefined for a label set.
///
/// These never abort a run; the summary carries them in place of a score.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AucError {
    #[error("No samples to score")]
    NoSamples,

    #[error("Only one class ({class}) present in the true labels, ROC AUC is not defined in that case")]
    SingleClass { class: usize },

    #[error("Number of labels {labels} does not match number of score rows {rows}")]
    LengthMismatch { labels: usize, rows: usize },

    #[error("Number of classes in the true labels ({classes}) not equal to the number of score columns ({columns})")]
    ColumnCountMismatch { classes: usize, columns: usize },

    #[error("Score at row {row} is not a finite number")]
    NonFiniteScore { row: usize },
}
