//! Numeric helpers used by the result aggregator.

pub mod auc;
pub mod probabilities;

pub use auc::{AucKind, AucScore, binary_auc, roc_auc};
pub use probabilities::{SINGLE_SCORE_THRESHOLD, argmax, mean_vector, normalize, threshold_vector};
