//! Classifier predictions.
//!
//! A prediction maps an input to an output vector of length `y_dim` and
//! learns from targets in place. The engine treats it as opaque: it asks for
//! [`Prediction::compute`] when aggregating and calls
//! [`Prediction::update`] during credit assignment.
//!
//! - [`ConstantPrediction`]: a constant vector adjusted with the delta rule
//! - [`NlmsPrediction`]: a linear model trained with normalized least mean squares

use std::{any::Any, fmt};

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::{
    error::LcsError,
    param::{Dimensions, PredictionParams},
    sam::ResolvedRates,
};

pub use self::{constant::ConstantPrediction, nlms::NlmsPrediction};

mod constant;
mod nlms;

pub trait Prediction: fmt::Debug + Send + Sync {
    fn kind(&self) -> PredictionKind;
    fn clone_boxed(&self) -> BoxedPrediction;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    #[must_use]
    fn compute(&self, x: &[f64]) -> Vec<f64>;

    fn update(&mut self, x: &[f64], y: &[f64]);

    /// Recombines with a prediction of the same representation.
    fn crossover(&mut self, other: &mut dyn Prediction, rng: &mut dyn RngCore) -> bool;

    fn mutate(&mut self, rates: &ResolvedRates, rng: &mut dyn RngCore) -> bool;

    #[must_use]
    fn to_blob(&self) -> Vec<u8>;
}

pub type BoxedPrediction = Box<dyn Prediction>;

impl Clone for BoxedPrediction {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionKind {
    Constant,
    #[default]
    Nlms,
}

impl PredictionKind {
    /// Creates an untrained prediction for the given problem shape.
    #[must_use]
    pub fn create(self, dims: Dimensions, params: &PredictionParams) -> BoxedPrediction {
        match self {
            Self::Constant => Box::new(ConstantPrediction::new(dims.y_dim, params)),
            Self::Nlms => Box::new(NlmsPrediction::new(dims.x_dim, dims.y_dim, params)),
        }
    }

    /// Restores a prediction written by [`Prediction::to_blob`].
    pub fn from_blob(
        self,
        dims: Dimensions,
        params: &PredictionParams,
        blob: &[u8],
    ) -> Result<BoxedPrediction, LcsError> {
        Ok(match self {
            Self::Constant => Box::new(ConstantPrediction::from_blob(dims.y_dim, params, blob)?),
            Self::Nlms => Box::new(NlmsPrediction::from_blob(
                dims.x_dim, dims.y_dim, params, blob,
            )?),
        })
    }
}
