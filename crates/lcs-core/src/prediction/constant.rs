use std::any::Any;

use rand::RngCore;

use crate::{
    error::LcsError,
    param::PredictionParams,
    persist::{self, Decoder},
    sam::ResolvedRates,
};

use super::{BoxedPrediction, Prediction, PredictionKind};

const TAG: u8 = 0x00;

/// Predicts the same vector for every input.
///
/// Learns with `value += eta * (y - value)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantPrediction {
    value: Vec<f64>,
    eta: f64,
}

impl ConstantPrediction {
    #[must_use]
    pub fn new(y_dim: usize, params: &PredictionParams) -> Self {
        Self {
            value: vec![0.0; y_dim],
            eta: params.eta,
        }
    }

    pub(crate) fn from_blob(
        y_dim: usize,
        params: &PredictionParams,
        blob: &[u8],
    ) -> Result<Self, LcsError> {
        let mut dec = Decoder::new(blob);
        if dec.u8()? != TAG {
            return Err(LcsError::malformed("not a constant prediction"));
        }
        let value = dec.f64s()?;
        dec.finish()?;
        if value.len() != y_dim {
            return Err(LcsError::malformed("constant prediction has wrong length"));
        }
        Ok(Self {
            value,
            eta: params.eta,
        })
    }
}

impl Prediction for ConstantPrediction {
    fn kind(&self) -> PredictionKind {
        PredictionKind::Constant
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

    fn compute(&self, _x: &[f64]) -> Vec<f64> {
        self.value.clone()
    }

    fn update(&mut self, _x: &[f64], y: &[f64]) {
        for (v, y) in self.value.iter_mut().zip(y) {
            *v += self.eta * (y - *v);
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
        persist::push_f64s(&mut blob, &self.value);
        blob
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_converges_to_target() {
        let mut pred = ConstantPrediction::new(2, &PredictionParams::default());
        for _ in 0..500 {
            pred.update(&[], &[0.25, -1.0]);
        }
        let out = pred.compute(&[0.3]);
        assert!((out[0] - 0.25).abs() < 1e-9);
        assert!((out[1] + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_blob_roundtrip() {
        let mut pred = ConstantPrediction::new(1, &PredictionParams::default());
        pred.update(&[], &[0.5]);
        let restored =
            ConstantPrediction::from_blob(1, &PredictionParams::default(), &pred.to_blob())
                .unwrap();
        assert_eq!(pred, restored);
    }
}
