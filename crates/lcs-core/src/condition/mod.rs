//! Classifier conditions.
//!
//! A condition decides which inputs a classifier responds to. The engine only
//! talks to conditions through the [`Condition`] trait; construction goes
//! through [`ConditionKind`], which is what parameters and persisted files
//! name.
//!
//! Two representations are provided:
//!
//! - [`DummyCondition`]: matches every input (pure regression with one rule
//!   set, or testing)
//! - [`HyperrectangleCondition`]: an axis-aligned box given by centre and spread

use std::{any::Any, fmt};

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::{error::LcsError, param::ConditionParams, sam::ResolvedRates};

pub use self::{dummy::DummyCondition, hyperrectangle::HyperrectangleCondition};

mod dummy;
mod hyperrectangle;

pub trait Condition: fmt::Debug + Send + Sync {
    fn kind(&self) -> ConditionKind;
    fn clone_boxed(&self) -> BoxedCondition;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    #[must_use]
    fn matches(&self, x: &[f64]) -> bool;

    /// Mutates in place. Returns whether anything changed.
    fn mutate(&mut self, rates: &ResolvedRates, rng: &mut dyn RngCore) -> bool;

    /// Recombines with a condition of the same representation.
    ///
    /// Returns whether either side changed; different representations never cross.
    fn crossover(&mut self, other: &mut dyn Condition, rng: &mut dyn RngCore) -> bool;

    /// Whether every input matched by `other` is also matched by `self`.
    #[must_use]
    fn general_than(&self, other: &dyn Condition) -> bool;

    /// Relative size of the condition, weighting its deletion vote.
    #[must_use]
    fn size_proxy(&self) -> f64;

    /// Serializes the condition into its own binary format.
    #[must_use]
    fn to_blob(&self) -> Vec<u8>;
}

pub type BoxedCondition = Box<dyn Condition>;

impl Clone for BoxedCondition {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    Dummy,
    #[default]
    Hyperrectangle,
}

impl ConditionKind {
    /// Creates a condition that matches `x`.
    #[must_use]
    pub fn cover(
        self,
        x: &[f64],
        params: &ConditionParams,
        rng: &mut dyn RngCore,
    ) -> BoxedCondition {
        match self {
            Self::Dummy => Box::new(DummyCondition),
            Self::Hyperrectangle => Box::new(HyperrectangleCondition::cover(x, params, rng)),
        }
    }

    /// Creates a random condition over `x_dim` inputs.
    #[must_use]
    pub fn random(
        self,
        x_dim: usize,
        params: &ConditionParams,
        rng: &mut dyn RngCore,
    ) -> BoxedCondition {
        match self {
            Self::Dummy => Box::new(DummyCondition),
            Self::Hyperrectangle => Box::new(HyperrectangleCondition::random(x_dim, params, rng)),
        }
    }

    /// Restores a condition written by [`Condition::to_blob`].
    pub fn from_blob(
        self,
        x_dim: usize,
        params: &ConditionParams,
        blob: &[u8],
    ) -> Result<BoxedCondition, LcsError> {
        Ok(match self {
            Self::Dummy => Box::new(DummyCondition::from_blob(blob)?),
            Self::Hyperrectangle => {
                Box::new(HyperrectangleCondition::from_blob(x_dim, params, blob)?)
            }
        })
    }
}
