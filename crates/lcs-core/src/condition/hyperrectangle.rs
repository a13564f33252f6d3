use std::{any::Any, mem};

use rand::{Rng, RngCore};
use rand_distr::StandardNormal;

use crate::{
    error::LcsError,
    param::ConditionParams,
    persist::{self, Decoder},
    sam::ResolvedRates,
};

use super::{BoxedCondition, Condition, ConditionKind};

const TAG: u8 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    min: f64,
    max: f64,
    smin: f64,
}

impl Bounds {
    fn new(params: &ConditionParams) -> Self {
        Self {
            min: params.min,
            max: params.max,
            smin: params.smin,
        }
    }

    fn random_spread(self, rng: &mut dyn RngCore) -> f64 {
        rng.random_range(self.smin..=(self.max - self.min).max(self.smin))
    }
}

/// An axis-aligned box in input space.
///
/// Input `x` matches when `|x[i] - center[i]| <= spread[i]` for every
/// dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperrectangleCondition {
    center: Vec<f64>,
    spread: Vec<f64>,
    bounds: Bounds,
}

impl HyperrectangleCondition {
    /// Centers a box on `x` with random spreads in `[smin, max - min]`.
    pub fn cover(x: &[f64], params: &ConditionParams, rng: &mut dyn RngCore) -> Self {
        let bounds = Bounds::new(params);
        Self {
            center: x.to_vec(),
            spread: x.iter().map(|_| bounds.random_spread(rng)).collect(),
            bounds,
        }
    }

    pub fn random(x_dim: usize, params: &ConditionParams, rng: &mut dyn RngCore) -> Self {
        let bounds = Bounds::new(params);
        Self {
            center: (0..x_dim)
                .map(|_| rng.random_range(bounds.min..=bounds.max))
                .collect(),
            spread: (0..x_dim).map(|_| bounds.random_spread(rng)).collect(),
            bounds,
        }
    }

    /// Creates a box from explicit centre and spread vectors.
    ///
    /// # Panics
    ///
    /// Panics if the vectors differ in length.
    #[must_use]
    pub fn new(center: Vec<f64>, spread: Vec<f64>, params: &ConditionParams) -> Self {
        assert_eq!(center.len(), spread.len());
        Self {
            center,
            spread,
            bounds: Bounds::new(params),
        }
    }

    #[must_use]
    pub fn center(&self) -> &[f64] {
        &self.center
    }

    #[must_use]
    pub fn spread(&self) -> &[f64] {
        &self.spread
    }

    fn interval(&self, i: usize) -> (f64, f64) {
        (
            self.center[i] - self.spread[i],
            self.center[i] + self.spread[i],
        )
    }

    pub(crate) fn from_blob(
        x_dim: usize,
        params: &ConditionParams,
        blob: &[u8],
    ) -> Result<Self, LcsError> {
        let mut dec = Decoder::new(blob);
        if dec.u8()? != TAG {
            return Err(LcsError::malformed("not a hyperrectangle condition"));
        }
        let center = dec.f64s()?;
        let spread = dec.f64s()?;
        dec.finish()?;
        if center.len() != x_dim || spread.len() != x_dim {
            return Err(LcsError::malformed(format!(
                "hyperrectangle has {} dimensions, expected {x_dim}",
                center.len()
            )));
        }
        Ok(Self::new(center, spread, params))
    }
}

impl Condition for HyperrectangleCondition {
    fn kind(&self) -> ConditionKind {
        ConditionKind::Hyperrectangle
    }

    fn clone_boxed(&self) -> BoxedCondition {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn matches(&self, x: &[f64]) -> bool {
        x.len() == self.center.len()
            && x.iter()
                .zip(self.center.iter().zip(&self.spread))
                .all(|(x, (c, s))| (x - c).abs() <= *s)
    }

    fn mutate(&mut self, rates: &ResolvedRates, rng: &mut dyn RngCore) -> bool {
        let Bounds { min, max, smin } = self.bounds;
        let mut changed = false;
        for (c, s) in self.center.iter_mut().zip(&mut self.spread) {
            if rng.random_bool(rates.p_mutation) {
                let noise: f64 = rng.sample(StandardNormal);
                *c = (*c + noise * rates.s_mutation).clamp(min, max);
                changed = true;
            }
            if rng.random_bool(rates.p_mutation) {
                let noise: f64 = rng.sample(StandardNormal);
                *s = (*s + noise * rates.s_mutation).abs().max(smin);
                changed = true;
            }
        }
        changed
    }

    fn crossover(&mut self, other: &mut dyn Condition, rng: &mut dyn RngCore) -> bool {
        let Some(other) = other.as_any_mut().downcast_mut::<Self>() else {
            return false;
        };
        let mut changed = false;
        let genes = self.center.len().min(other.center.len());
        for i in 0..genes {
            if rng.random_bool(0.5) {
                changed |= self.center[i] != other.center[i];
                mem::swap(&mut self.center[i], &mut other.center[i]);
            }
            if rng.random_bool(0.5) {
                changed |= self.spread[i] != other.spread[i];
                mem::swap(&mut self.spread[i], &mut other.spread[i]);
            }
        }
        changed
    }

    fn general_than(&self, other: &dyn Condition) -> bool {
        let Some(other) = other.as_any().downcast_ref::<Self>() else {
            return false;
        };
        self.center.len() == other.center.len()
            && (0..self.center.len()).all(|i| {
                let (lower, upper) = self.interval(i);
                let (other_lower, other_upper) = other.interval(i);
                lower <= other_lower && upper >= other_upper
            })
    }

    #[expect(clippy::cast_precision_loss)]
    fn size_proxy(&self) -> f64 {
        self.center.len() as f64
    }

    fn to_blob(&self) -> Vec<u8> {
        let mut blob = vec![TAG];
        persist::push_f64s(&mut blob, &self.center);
        persist::push_f64s(&mut blob, &self.spread);
        blob
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::condition::DummyCondition;

    fn params() -> ConditionParams {
        ConditionParams::default()
    }

    #[test]
    fn test_cover_matches_input() {
        let mut rng = Pcg32::seed_from_u64(11);
        for _ in 0..100 {
            let x = [rng.random::<f64>(), rng.random::<f64>(), rng.random::<f64>()];
            let cond = HyperrectangleCondition::cover(&x, &params(), &mut rng);
            assert!(cond.matches(&x));
            assert!(cond.spread().iter().all(|s| *s >= params().smin));
        }
    }

    #[test]
    fn test_matches_boundaries() {
        let cond = HyperrectangleCondition::new(vec![0.5, 0.5], vec![0.25, 0.0], &params());
        assert!(cond.matches(&[0.75, 0.5]));
        assert!(cond.matches(&[0.25, 0.5]));
        assert!(!cond.matches(&[0.8, 0.5]));
        assert!(!cond.matches(&[0.5, 0.51]));
        assert!(!cond.matches(&[0.5]));
    }

    #[test]
    fn test_general_than_is_containment() {
        let wide = HyperrectangleCondition::new(vec![0.5], vec![0.4], &params());
        let narrow = HyperrectangleCondition::new(vec![0.6], vec![0.1], &params());
        let offset = HyperrectangleCondition::new(vec![0.95], vec![0.1], &params());
        assert!(wide.general_than(&narrow));
        assert!(!narrow.general_than(&wide));
        assert!(!wide.general_than(&offset));
        assert!(wide.general_than(&wide.clone()));
        assert!(!wide.general_than(&DummyCondition));
    }

    #[test]
    fn test_mutation_respects_bounds() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut cond = HyperrectangleCondition::random(4, &params(), &mut rng);
        let rates = ResolvedRates {
            p_mutation: 1.0,
            s_mutation: 2.0,
            p_func_mutation: 0.0,
        };
        for _ in 0..50 {
            assert!(cond.mutate(&rates, &mut rng));
            assert!(cond.center().iter().all(|c| (0.0..=1.0).contains(c)));
            assert!(cond.spread().iter().all(|s| *s >= params().smin));
        }
    }

    #[test]
    fn test_zero_rate_never_mutates() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut cond = HyperrectangleCondition::random(4, &params(), &mut rng);
        let before = cond.clone();
        let rates = ResolvedRates {
            p_mutation: 0.0,
            s_mutation: 0.1,
            p_func_mutation: 0.0,
        };
        assert!(!cond.mutate(&rates, &mut rng));
        assert_eq!(cond, before);
    }

    #[test]
    fn test_crossover_preserves_gene_pool() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut a = HyperrectangleCondition::new(vec![0.1; 8], vec![0.2; 8], &params());
        let mut b = HyperrectangleCondition::new(vec![0.9; 8], vec![0.3; 8], &params());
        assert!(a.crossover(&mut b, &mut rng));
        for i in 0..8 {
            let mut centers = [a.center()[i], b.center()[i]];
            centers.sort_by(f64::total_cmp);
            assert_eq!(centers, [0.1, 0.9]);
        }
    }

    #[test]
    fn test_blob_roundtrip() {
        let mut rng = Pcg32::seed_from_u64(2);
        let cond = HyperrectangleCondition::random(3, &params(), &mut rng);
        let restored = HyperrectangleCondition::from_blob(3, &params(), &cond.to_blob()).unwrap();
        assert_eq!(cond, restored);
        assert!(HyperrectangleCondition::from_blob(2, &params(), &cond.to_blob()).is_err());
        assert!(HyperrectangleCondition::from_blob(3, &params(), &[TAG, 1]).is_err());
    }
}
