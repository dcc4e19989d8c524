//! ROC AUC for binary and one-vs-rest multiclass scoring.
//!
//! The binary score is the Mann-Whitney statistic with tied scores counted as
//! half a win, which equals the trapezoidal area under the ROC curve.

use std::fmt;

use crate::errors::{AucError, AucResult};

/// Which flavour of AUC was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AucKind {
    /// Two classes, scored on the probability of the larger label.
    Binary,
    /// Macro average of per-class one-vs-rest scores.
    OneVsRest,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AucScore {
    pub kind: AucKind,
    pub value: f64,
}

impl fmt::Display for AucScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AucKind::Binary => write!(f, "AUC: {:.4}", self.value),
            AucKind::OneVsRest => write!(f, "Multiclass AUC (One-vs-Rest): {:.4}", self.value),
        }
    }
}

/// AUC of `scores` against boolean `positives`.
pub fn binary_auc(positives: &[bool], scores: &[f64]) -> AucResult<f64> {
    if positives.len() != scores.len() {
        return Err(AucError::LengthMismatch {
            labels: positives.len(),
            rows: scores.len(),
        });
    }
    if positives.is_empty() {
        return Err(AucError::NoSamples);
    }
    if let Some(row) = scores.iter().position(|score| !score.is_finite()) {
        return Err(AucError::NonFiniteScore { row });
    }

    let positive_count = positives.iter().filter(|&&p| p).count();
    let negative_count = positives.len() - positive_count;
    if positive_count == 0 || negative_count == 0 {
        let class = if positive_count == 0 { 0 } else { 1 };
        return Err(AucError::SingleClass { class });
    }

    let ranks = average_ranks(scores);
    let positive_rank_sum: f64 = ranks
        .iter()
        .zip(positives)
        .filter(|(_, positive)| **positive)
        .map(|(rank, _)| rank)
        .sum();

    let positive_count = positive_count as f64;
    let negative_count = negative_count as f64;
    let u = positive_rank_sum - positive_count * (positive_count + 1.0) / 2.0;
    Ok(u / (positive_count * negative_count))
}

/// One-based ranks of `scores`, ties sharing their average rank.
fn average_ranks(scores: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0; scores.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        let rank = (start + end + 1) as f64 / 2.0;
        for &index in &order[start..end] {
            ranks[index] = rank;
        }
        start = end;
    }
    ranks
}

/// Scores per-file probability rows against their true labels.
///
/// Exactly two distinct labels give a binary AUC on column 1, with the larger
/// label as the positive class, whatever the row width. Otherwise the rows
/// must have one column per distinct label (sorted labels map to columns in
/// order) and the result is the unweighted one-vs-rest mean.
pub fn roc_auc(labels: &[usize], probabilities: &[Vec<f32>]) -> AucResult<AucScore> {
    if labels.len() != probabilities.len() {
        return Err(AucError::LengthMismatch {
            labels: labels.len(),
            rows: probabilities.len(),
        });
    }

    let mut classes = labels.to_vec();
    classes.sort_unstable();
    classes.dedup();

    match classes.as_slice() {
        [] => Err(AucError::NoSamples),
        [class] => Err(AucError::SingleClass { class: *class }),
        [_, positive] => {
            let scores = binary_column(probabilities)?;
            let positives: Vec<bool> = labels.iter().map(|label| label == positive).collect();
            Ok(AucScore {
                kind: AucKind::Binary,
                value: binary_auc(&positives, &scores)?,
            })
        }
        _ => {
            let mut total = 0.0;
            for (column_index, class) in classes.iter().enumerate() {
                let scores = column(probabilities, column_index, classes.len())?;
                let positives: Vec<bool> = labels.iter().map(|label| label == class).collect();
                total += binary_auc(&positives, &scores)?;
            }
            Ok(AucScore {
                kind: AucKind::OneVsRest,
                value: total / classes.len() as f64,
            })
        }
    }
}

/// Column 1 of every row. Rows may be wider than two when the model knows
/// more classes than the labels cover.
fn binary_column(probabilities: &[Vec<f32>]) -> AucResult<Vec<f64>> {
    probabilities
        .iter()
        .map(|row| match row.get(1) {
            Some(&score) => Ok(score as f64),
            None => Err(AucError::ColumnCountMismatch {
                classes: 2,
                columns: row.len(),
            }),
        })
        .collect()
}

fn column(probabilities: &[Vec<f32>], index: usize, classes: usize) -> AucResult<Vec<f64>> {
    probabilities
        .iter()
        .map(|row| {
            if row.len() != classes {
                return Err(AucError::ColumnCountMismatch {
                    classes,
                    columns: row.len(),
                });
            }
            Ok(row[index] as f64)
        })
        .collect()
}
