use serde::{Deserialize, Serialize};
use smartcore::metrics::{mean_absolute_error, r2};
use std::fmt;

/// Hold-out scores of a fitted regressor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub r2: f64,
    pub mae: f64,
    pub n_train: usize,
    pub n_test: usize,
}

impl Evaluation {
    /// `None` when nothing was held out.
    pub fn compute(actual: &[f64], predicted: &[f64], n_train: usize) -> Option<Self> {
        if actual.is_empty() || actual.len() != predicted.len() {
            return None;
        }
        let actual = actual.to_vec();
        let predicted = predicted.to_vec();
        Some(Self {
            r2: r2(&actual, &predicted),
            mae: mean_absolute_error(&actual, &predicted),
            n_train,
            n_test: actual.len(),
        })
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "R²: {:.4}  MAE: {:.4}  (train {}, test {})",
            self.r2, self.mae, self.n_train, self.n_test
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions() {
        let scores = Evaluation::compute(&[4.0, 10.0, 22.5], &[4.0, 10.0, 22.5], 12).unwrap();
        assert_eq!(scores.r2, 1.0);
        assert_eq!(scores.mae, 0.0);
        assert_eq!(scores.n_test, 3);
    }

    #[test]
    fn mean_absolute_error_of_a_flat_guess() {
        let scores = Evaluation::compute(&[1.0, 2.0, 3.0], &[2.0, 2.0, 2.0], 0).unwrap();
        assert!((scores.mae - 2.0 / 3.0).abs() < 1e-12);
        assert!(scores.r2.abs() < 1e-12);
    }

    #[test]
    fn nothing_held_out() {
        assert!(Evaluation::compute(&[], &[], 10).is_none());
    }
}
