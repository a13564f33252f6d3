use std::any::Any;

use rand::RngCore;

use crate::{
    error::LcsError,
    param::PredictionParams,
    persist::{self, Decoder},
    sam::ResolvedRates,
};

use super::{BoxedPrediction, Prediction, PredictionKind};

const TAG: u8 = 0x01;

/// Linear model `y[j] = w[j][0] * x0 + Σ w[j][i + 1] * x[i]` trained with
/// normalized least mean squares.
#[derive(Debug, Clone, PartialEq)]
pub struct NlmsPrediction {
    x_dim: usize,
    /// Row-major, `y_dim` rows of `x_dim + 1` weights.
    weights: Vec<f64>,
    eta: f64,
    x0: f64,
}

impl NlmsPrediction {
    #[must_use]
    pub fn new(x_dim: usize, y_dim: usize, params: &PredictionParams) -> Self {
        Self {
            x_dim,
            weights: vec![0.0; y_dim * (x_dim + 1)],
            eta: params.eta,
            x0: params.x0,
        }
    }

    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.weights.chunks_exact(self.x_dim + 1)
    }

    fn row_output(&self, row: &[f64], x: &[f64]) -> f64 {
        row[0] * self.x0 + row[1..].iter().zip(x).map(|(w, x)| w * x).sum::<f64>()
    }

    pub(crate) fn from_blob(
        x_dim: usize,
        y_dim: usize,
        params: &PredictionParams,
        blob: &[u8],
    ) -> Result<Self, LcsError> {
        let mut dec = Decoder::new(blob);
        if dec.u8()? != TAG {
            return Err(LcsError::malformed("not an NLMS prediction"));
        }
        let weights = dec.f64s()?;
        dec.finish()?;
        if weights.len() != y_dim * (x_dim + 1) {
            return Err(LcsError::malformed("NLMS prediction has wrong length"));
        }
        Ok(Self {
            x_dim,
            weights,
            eta: params.eta,
            x0: params.x0,
        })
    }
}

impl Prediction for NlmsPrediction {
    fn kind(&self) -> PredictionKind {
        PredictionKind::Nlms
    }

    fn clone_boxed(&self) -> BoxedPrediction {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn compute(&self, x: &[f64]) -> Vec<f64> {
        self.rows().map(|row| self.row_output(row, x)).collect()
    }

    fn update(&mut self, x: &[f64], y: &[f64]) {
        let norm = self.x0 * self.x0 + x.iter().map(|x| x * x).sum::<f64>();
        if norm <= 0.0 {
            return;
        }
        let errors: Vec<f64> = self
            .compute(x)
            .iter()
            .zip(y)
            .map(|(p, y)| y - p)
            .collect();
        let stride = self.x_dim + 1;
        for (row, err) in self.weights.chunks_exact_mut(stride).zip(errors) {
            let correction = self.eta * err / norm;
            row[0] += correction * self.x0;
            for (w, x) in row[1..].iter_mut().zip(x) {
                *w += correction * x;
            }
        }
    }

    fn crossover(&mut self, _other: &mut dyn Prediction, _rng: &mut dyn RngCore) -> bool {
        false
    }

    fn mutate(&mut self, _rates: &ResolvedRates, _rng: &mut dyn RngCore) -> bool {
        false
    }

    fn to_blob(&self) -> Vec<u8> {
        let mut blob = vec![TAG];
        persist::push_f64s(&mut blob, &self.weights);
        blob
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng as _, SeedableRng as _};
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_learns_linear_function() {
        let params = PredictionParams {
            eta: 0.5,
            ..PredictionParams::default()
        };
        let mut pred = NlmsPrediction::new(1, 1, &params);
        let mut rng = Pcg32::seed_from_u64(4);
        for _ in 0..5000 {
            let x = rng.random::<f64>();
            pred.update(&[x], &[0.5 + 2.0 * x]);
        }
        let out = pred.compute(&[0.25])[0];
        assert!((out - 1.0).abs() < 1e-3, "{out}");
    }

    #[test]
    fn test_untrained_predicts_zero() {
        let pred = NlmsPrediction::new(3, 2, &PredictionParams::default());
        assert_eq!(pred.compute(&[1.0, 2.0, 3.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_blob_rejects_wrong_shape() {
        let params = PredictionParams::default();
        let pred = NlmsPrediction::new(2, 1, &params);
        assert!(NlmsPrediction::from_blob(2, 1, &params, &pred.to_blob()).is_ok());
        assert!(NlmsPrediction::from_blob(3, 1, &params, &pred.to_blob()).is_err());
    }
}
