use std::any::Any;

use rand::RngCore;

use crate::{error::LcsError, sam::ResolvedRates};

use super::{BoxedCondition, Condition, ConditionKind};

const TAG: u8 = 0x00;

/// A condition that matches every input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DummyCondition;

impl DummyCondition {
    pub(crate) fn from_blob(blob: &[u8]) -> Result<Self, LcsError> {
        match blob {
            [TAG] => Ok(Self),
            _ => Err(LcsError::malformed("invalid dummy condition blob")),
        }
    }
}

impl Condition for DummyCondition {
    fn kind(&self) -> ConditionKind {
        ConditionKind::Dummy
    }

    fn clone_boxed(&self) -> BoxedCondition {
        Box::new(*self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn matches(&self, _x: &[f64]) -> bool {
        true
    }

    fn mutate(&mut self, _rates: &ResolvedRates, _rng: &mut dyn RngCore) -> bool {
        false
    }

    fn crossover(&mut self, _other: &mut dyn Condition, _rng: &mut dyn RngCore) -> bool {
        false
    }

    fn general_than(&self, other: &dyn Condition) -> bool {
        other.as_any().is::<Self>()
    }

    fn size_proxy(&self) -> f64 {
        1.0
    }

    fn to_blob(&self) -> Vec<u8> {
        vec![TAG]
    }
}
