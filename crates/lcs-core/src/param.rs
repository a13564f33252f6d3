//! Run parameters.
//!
//! [`Params`] is an immutable snapshot handed to [`Xcs`](crate::Xcs) at
//! construction. It deserializes from JSON where every field is optional, so a
//! configuration file only needs to name the values it overrides:
//!
//! ```
//! use lcs_core::param::Params;
//!
//! let params: Params =
//!     serde_json::from_str(r#"{ "general": { "pop_size": 500 }, "ea": { "theta_ea": 25.0 } }"#)
//!         .unwrap();
//! assert_eq!(params.general.pop_size, 500);
//! assert_eq!(params.classifier.beta, 0.1);
//! ```
//!
//! Out-of-range values are never fatal: [`Params::sanitized`] clamps each one to
//! the nearest valid bound and emits a warning.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{condition::ConditionKind, loss::Loss, prediction::PredictionKind};

/// Shape of the problem: input length, output length and number of actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub x_dim: usize,
    pub y_dim: usize,
    pub n_actions: usize,
}

impl Dimensions {
    /// Dimensions of a supervised regression problem (a single action).
    #[must_use]
    pub const fn regression(x_dim: usize, y_dim: usize) -> Self {
        Self {
            x_dim,
            y_dim,
            n_actions: 1,
        }
    }

    /// Dimensions of a single-step reinforcement learning problem (scalar payoff).
    #[must_use]
    pub const fn reinforcement(x_dim: usize, n_actions: usize) -> Self {
        Self {
            x_dim,
            y_dim: 1,
            n_actions,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub general: GeneralParams,
    pub classifier: ClassifierParams,
    pub ea: EaParams,
    pub subsumption: SubsumptionParams,
    pub condition: ConditionParams,
    pub prediction: PredictionParams,
    pub action: ActionParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralParams {
    /// Maximum total numerosity of the population.
    pub pop_size: u32,
    /// Fill the population with random classifiers before learning.
    pub pop_init: bool,
    /// Number of learning trials performed by [`Xcs::fit`](crate::Xcs::fit).
    pub max_trials: u64,
    /// Trials per performance report.
    pub perf_trials: u64,
    /// Worker threads used for matching and updates.
    pub n_threads: usize,
    pub loss: Loss,
}

impl Default for GeneralParams {
    fn default() -> Self {
        Self {
            pop_size: 2000,
            pop_init: true,
            max_trials: 100_000,
            perf_trials: 1000,
            n_threads: 1,
            loss: Loss::Mae,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierParams {
    /// Target error under which a classifier is considered accurate.
    pub eps_0: f64,
    /// Accuracy offset for classifiers with error above `eps_0`.
    pub alpha: f64,
    /// Accuracy slope.
    pub nu: f64,
    /// Learning rate for error, fitness and running averages.
    pub beta: f64,
    /// Fraction of mean fitness below which deletion votes are inflated.
    pub delta: f64,
    /// Experience required before low fitness inflates a deletion vote.
    pub theta_del: u64,
    pub init_fitness: f64,
    pub init_error: f64,
    /// Offspring error multiplier.
    pub err_reduc: f64,
    /// Offspring fitness multiplier.
    pub fit_reduc: f64,
    /// Experience below which error is a plain running average.
    pub m_probation: u64,
    /// Lower bound applied after every fitness update.
    pub fitness_floor: f64,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            eps_0: 0.01,
            alpha: 0.1,
            nu: 5.0,
            beta: 0.1,
            delta: 0.1,
            theta_del: 20,
            init_fitness: 0.01,
            init_error: 0.0,
            err_reduc: 1.0,
            fit_reduc: 0.1,
            m_probation: 10,
            fitness_floor: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionKind {
    #[default]
    Roulette,
    Tournament,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EaParams {
    pub select_type: SelectionKind,
    /// Fraction of set numerosity entering a tournament.
    pub select_size: f64,
    /// Mean trials since the last EA in a set before the EA runs again.
    pub theta_ea: f64,
    /// Offspring per EA invocation (produced in pairs).
    pub lambda: usize,
    pub p_crossover: f64,
    /// Number of self-adaptive mutation rates per classifier (0 to 3).
    pub num_sam: usize,
    /// Lower bound on self-adapted mutation rates.
    pub mutation_floor: f64,
    /// Per-gene mutation probability used when no rate is self-adapted.
    pub p_mutation: f64,
    /// Mutation step size used when no rate is self-adapted.
    pub s_mutation: f64,
    /// Structural mutation rate used when no rate is self-adapted.
    pub p_func_mutation: f64,
}

impl Default for EaParams {
    fn default() -> Self {
        Self {
            select_type: SelectionKind::Roulette,
            select_size: 0.4,
            theta_ea: 50.0,
            lambda: 2,
            p_crossover: 0.8,
            num_sam: 2,
            mutation_floor: 0.0005,
            p_mutation: 0.04,
            s_mutation: 0.1,
            p_func_mutation: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubsumptionParams {
    pub ea_subsumption: bool,
    pub set_subsumption: bool,
    /// Experience a classifier needs before it may subsume others.
    pub theta_sub: u64,
}

impl Default for SubsumptionParams {
    fn default() -> Self {
        Self {
            ea_subsumption: false,
            set_subsumption: false,
            theta_sub: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionParams {
    pub kind: ConditionKind,
    /// Lower bound of the input space.
    pub min: f64,
    /// Upper bound of the input space.
    pub max: f64,
    /// Minimum spread of a covering hyperrectangle.
    pub smin: f64,
}

impl Default for ConditionParams {
    fn default() -> Self {
        Self {
            kind: ConditionKind::Hyperrectangle,
            min: 0.0,
            max: 1.0,
            smin: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionParams {
    pub kind: PredictionKind,
    /// Learning rate of the prediction model.
    pub eta: f64,
    /// Constant bias input of linear models.
    pub x0: f64,
}

impl Default for PredictionParams {
    fn default() -> Self {
        Self {
            kind: PredictionKind::Nlms,
            eta: 0.1,
            x0: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionParams {
    /// Exploration probability during explore trials.
    pub p_explore: f64,
    /// Minimum number of distinct actions in a match set; `None` means all actions.
    pub theta_mna: Option<usize>,
}

impl Default for ActionParams {
    fn default() -> Self {
        Self {
            p_explore: 0.9,
            theta_mna: None,
        }
    }
}

fn clamp_f64(name: &str, value: &mut f64, min: f64, max: f64) {
    let clamped = if value.is_nan() { min } else { value.clamp(min, max) };
    if clamped.to_bits() != value.to_bits() {
        let original = *value;
        warn!(param = name, value = original, clamped, "parameter out of range, clamped");
        *value = clamped;
    }
}

fn clamp_min<T>(name: &str, value: &mut T, min: T)
where
    T: PartialOrd + Copy + std::fmt::Debug,
{
    if *value < min {
        let original = *value;
        warn!(param = name, value = ?original, clamped = ?min, "parameter too small, clamped");
        *value = min;
    }
}

impl Params {
    /// Returns a copy with every parameter clamped into its valid range.
    ///
    /// Each adjustment is logged as a warning.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let g = &mut self.general;
        clamp_min("pop_size", &mut g.pop_size, 1);
        clamp_min("perf_trials", &mut g.perf_trials, 1);
        clamp_min("n_threads", &mut g.n_threads, 1);

        let c = &mut self.classifier;
        clamp_f64("eps_0", &mut c.eps_0, f64::MIN_POSITIVE, f64::MAX);
        clamp_f64("alpha", &mut c.alpha, 0.0, 1.0);
        clamp_f64("nu", &mut c.nu, 0.0, f64::MAX);
        clamp_f64("beta", &mut c.beta, f64::EPSILON, 1.0);
        clamp_f64("delta", &mut c.delta, 0.0, 1.0);
        clamp_f64("init_fitness", &mut c.init_fitness, 0.0, f64::MAX);
        clamp_f64("init_error", &mut c.init_error, 0.0, f64::MAX);
        clamp_f64("err_reduc", &mut c.err_reduc, 0.0, 1.0);
        clamp_f64("fit_reduc", &mut c.fit_reduc, 0.0, 1.0);
        clamp_f64("fitness_floor", &mut c.fitness_floor, 0.0, f64::MAX);

        let ea = &mut self.ea;
        clamp_f64("ea_select_size", &mut ea.select_size, 0.0, 1.0);
        clamp_f64("theta_ea", &mut ea.theta_ea, 0.0, f64::MAX);
        clamp_min("lambda", &mut ea.lambda, 2);
        clamp_f64("p_crossover", &mut ea.p_crossover, 0.0, 1.0);
        if ea.num_sam > crate::sam::MAX_SLOTS {
            warn!(
                param = "num_sam",
                value = ea.num_sam,
                clamped = crate::sam::MAX_SLOTS,
                "parameter too large, clamped"
            );
            ea.num_sam = crate::sam::MAX_SLOTS;
        }
        clamp_f64("mutation_floor", &mut ea.mutation_floor, 0.0, 1.0);
        clamp_f64("p_mutation", &mut ea.p_mutation, 0.0, 1.0);
        clamp_f64("s_mutation", &mut ea.s_mutation, 0.0, f64::MAX);
        clamp_f64("p_func_mutation", &mut ea.p_func_mutation, 0.0, 1.0);

        let cond = &mut self.condition;
        if cond.max < cond.min {
            warn!(
                min = cond.min,
                max = cond.max,
                "condition bounds reversed, swapped"
            );
            std::mem::swap(&mut cond.min, &mut cond.max);
        }
        clamp_f64("cond_smin", &mut cond.smin, 0.0, cond.max - cond.min);

        clamp_f64("pred_eta", &mut self.prediction.eta, 0.0, 1.0);
        clamp_f64("p_explore", &mut self.action.p_explore, 0.0, 1.0);
        if let Some(theta_mna) = &mut self.action.theta_mna {
            clamp_min("theta_mna", theta_mna, 1);
        }
        self
    }

    /// Minimum number of distinct actions a match set must contain.
    #[must_use]
    pub fn theta_mna(&self, dims: Dimensions) -> usize {
        self.action
            .theta_mna
            .unwrap_or(dims.n_actions)
            .clamp(1, dims.n_actions.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_survive_sanitizing() {
        let params = Params::default();
        assert_eq!(params.clone().sanitized(), params);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let mut params = Params::default();
        params.classifier.beta = 1.5;
        params.classifier.alpha = -0.3;
        params.ea.select_size = 2.0;
        params.ea.num_sam = 7;
        params.ea.lambda = 0;
        params.action.p_explore = f64::NAN;
        let params = params.sanitized();
        assert_eq!(params.classifier.beta, 1.0);
        assert_eq!(params.classifier.alpha, 0.0);
        assert_eq!(params.ea.select_size, 1.0);
        assert_eq!(params.ea.num_sam, crate::sam::MAX_SLOTS);
        assert_eq!(params.ea.lambda, 2);
        assert_eq!(params.action.p_explore, 0.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let params: Params = serde_json::from_str(
            r#"{ "subsumption": { "ea_subsumption": true }, "condition": { "kind": "dummy" } }"#,
        )
        .unwrap();
        assert!(params.subsumption.ea_subsumption);
        assert!(!params.subsumption.set_subsumption);
        assert_eq!(params.condition.kind, ConditionKind::Dummy);
        assert_eq!(params.general, GeneralParams::default());
    }

    #[test]
    fn test_theta_mna_defaults_to_action_count() {
        let mut params = Params::default();
        let dims = Dimensions::reinforcement(6, 2);
        assert_eq!(params.theta_mna(dims), 2);
        params.action.theta_mna = Some(5);
        assert_eq!(params.theta_mna(dims), 2);
    }
}
