//! Self-adaptive mutation.
//!
//! Each classifier carries up to [`MAX_SLOTS`] mutation rates that evolve
//! along with its condition. Before an offspring is mutated its rates are
//! perturbed log-normally (`mu *= exp(N(0, 1))`) and clamped to
//! `[mutation_floor, 1]`; the perturbed rates then drive the mutation itself,
//! so rates that produce fit offspring are inherited.
//!
//! Slots map positionally onto [`ResolvedRates`]:
//!
//! | Slot | Rate |
//! |------|------|
//! | 0    | `p_mutation`: per-gene mutation probability |
//! | 1    | `s_mutation`: mutation step size |
//! | 2    | `p_func_mutation`: structural mutation rate |
//!
//! Slots a classifier does not carry fall back to the static values in
//! [`EaParams`].

use rand::{Rng, RngCore};
use rand_distr::StandardNormal;

use crate::param::EaParams;

/// Maximum number of self-adapted rates.
pub const MAX_SLOTS: usize = 3;

/// Mutation rates handed to the condition, prediction and action mutate contracts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedRates {
    pub p_mutation: f64,
    pub s_mutation: f64,
    pub p_func_mutation: f64,
}

impl ResolvedRates {
    /// The static rates from the parameters, without self-adaptation.
    #[must_use]
    pub fn from_params(params: &EaParams) -> Self {
        Self {
            p_mutation: params.p_mutation,
            s_mutation: params.s_mutation,
            p_func_mutation: params.p_func_mutation,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationRates(Vec<f64>);

impl MutationRates {
    /// Draws `n` rates uniformly from `[floor, 1]`.
    pub fn random(n: usize, floor: f64, rng: &mut dyn RngCore) -> Self {
        Self(
            (0..n.min(MAX_SLOTS))
                .map(|_| rng.random::<f64>().clamp(floor, 1.0))
                .collect(),
        )
    }

    /// Wraps previously stored rates.
    #[must_use]
    pub fn from_vec(rates: Vec<f64>) -> Self {
        Self(rates)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Perturbs every rate log-normally and clamps it to `[floor, 1]`.
    pub fn adapt(&mut self, floor: f64, rng: &mut dyn RngCore) {
        for mu in &mut self.0 {
            let noise: f64 = rng.sample(StandardNormal);
            *mu = (*mu * noise.exp()).clamp(floor, 1.0);
        }
    }

    /// Overlays the carried rates on the static ones.
    #[must_use]
    pub fn resolve(&self, params: &EaParams) -> ResolvedRates {
        let mut rates = ResolvedRates::from_params(params);
        let slots = [
            &mut rates.p_mutation,
            &mut rates.s_mutation,
            &mut rates.p_func_mutation,
        ];
        for (slot, mu) in slots.into_iter().zip(&self.0) {
            *slot = *mu;
        }
        rates
    }
}
