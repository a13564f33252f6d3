use serde::{Deserialize, Serialize};

/// Error measure between a prediction and its target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Loss {
    /// Mean absolute error.
    #[default]
    Mae,
    /// Mean squared error.
    Mse,
    /// Root mean squared error.
    Rmse,
}

impl Loss {
    /// Computes the loss over the shared prefix of `prediction` and `target`.
    ///
    /// Empty inputs yield zero.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn compute(self, prediction: &[f64], target: &[f64]) -> f64 {
        let n = prediction.len().min(target.len());
        if n == 0 {
            return 0.0;
        }
        let diffs = prediction.iter().zip(target).map(|(p, y)| p - y);
        match self {
            Self::Mae => diffs.map(f64::abs).sum::<f64>() / n as f64,
            Self::Mse => diffs.map(|d| d * d).sum::<f64>() / n as f64,
            Self::Rmse => (diffs.map(|d| d * d).sum::<f64>() / n as f64).sqrt(),
        }
    }
}
