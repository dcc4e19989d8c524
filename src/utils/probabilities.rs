//! Probability vector helpers for turning raw device outputs into votes.

/// A lone detector score above this value means class 0.
pub const SINGLE_SCORE_THRESHOLD: f32 = 10.0;

/// Scales `values` so they sum to 1.0.
///
/// Returns `None` when the sum is zero or not finite, the cases where no
/// scaling exists.
pub fn normalize(values: &[f32]) -> Option<Vec<f32>> {
    let sum: f32 = values.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return None;
    }
    Some(values.iter().map(|value| value / sum).collect())
}

/// Two-class indicator vector for a single detector score.
///
/// `score > 10` votes class 0 (`[1, 0]`), anything else votes class 1 (`[0, 1]`).
pub fn threshold_vector(score: f32) -> Vec<f32> {
    if score > SINGLE_SCORE_THRESHOLD {
        vec![1.0, 0.0]
    } else {
        vec![0.0, 1.0]
    }
}

/// Index of the largest value; the first one wins on ties. NaN never wins.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &value) in values.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((index, value)),
        }
    }
    best.map(|(index, _)| index)
}

/// Element-wise mean of equally sized vectors.
pub fn mean_vector(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
    let first = vectors.first()?;
    let mut mean = vec![0.0f32; first.len()];
    for vector in vectors {
        for (slot, value) in mean.iter_mut().zip(vector) {
            *slot += value;
        }
    }
    let count = vectors.len() as f32;
    mean.iter_mut().for_each(|slot| *slot /= count);
    Some(mean)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELTA: f32 = 1e-6;

    #[test]
    fn test_normalize_sums_to_one() {
        let normalized = normalize(&[2.0, 6.0, 12.0]).unwrap();
        assert!((normalized.iter().sum::<f32>() - 1.0).abs() < DELTA);
        assert!((normalized[0] - 0.1).abs() < DELTA);
        assert!((normalized[2] - 0.6).abs() < DELTA);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize(&[0.3, 1.7, 4.0, 0.5]).unwrap();
        let twice = normalize(&once).unwrap();
        for (a, b) in once.iter().zip(&twice) {
            assert!((a - b).abs() < DELTA);
        }
    }

    #[test]
    fn test_normalize_zero_sum() {
        assert!(normalize(&[0.0, 0.0, 0.0]).is_none());
        assert!(normalize(&[1.0, -1.0]).is_none());
    }

    #[test]
    fn test_normalize_non_finite_sum() {
        assert!(normalize(&[0.5, f32::NAN]).is_none());
        assert!(normalize(&[f32::INFINITY, 1.0]).is_none());
    }

    #[test]
    fn test_threshold_vector() {
        assert_eq!(threshold_vector(15.0), vec![1.0, 0.0]);
        assert_eq!(threshold_vector(5.0), vec![0.0, 1.0]);
        assert_eq!(threshold_vector(10.0), vec![0.0, 1.0]);
    }

    #[test]
    fn test_argmax_first_maximum_wins() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), Some(1));
        assert_eq!(argmax(&[0.9, 0.1]), Some(0));
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[0.1, f32::NAN, 0.3]), Some(2));
        assert_eq!(argmax(&[f32::NAN]), None);
    }

    #[test]
    fn test_mean_vector() {
        let mean = mean_vector(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        assert!((mean[0] - 2.0 / 3.0).abs() < DELTA);
        assert!((mean[1] - 1.0 / 3.0).abs() < DELTA);
        assert!(mean_vector(&[]).is_none());
    }
}
