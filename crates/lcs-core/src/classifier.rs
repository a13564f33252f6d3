//! A single rule of the population.
//!
//! A [`Classifier`] pairs a condition (which inputs it responds to) with an
//! action and a prediction (what it expects to happen), and tracks how well
//! that expectation has held up: error, fitness and experience. A classifier
//! with numerosity `n` stands for `n` identical micro-classifiers.

use rand::{Rng, RngCore};

use crate::{
    condition::BoxedCondition,
    param::{ClassifierParams, Dimensions, Params},
    prediction::BoxedPrediction,
    sam::MutationRates,
    update,
};

#[derive(Debug, Clone)]
pub struct Classifier {
    pub(crate) condition: BoxedCondition,
    pub(crate) prediction: BoxedPrediction,
    pub(crate) action: usize,
    pub(crate) fitness: f64,
    pub(crate) error: f64,
    pub(crate) numerosity: u32,
    pub(crate) experience: u64,
    /// Trial of the last EA involvement.
    pub(crate) time_stamp: u64,
    pub(crate) mutation_rates: MutationRates,
}

impl Classifier {
    /// Assembles a fresh classifier with initial fitness and error and no
    /// self-adapted rates.
    #[must_use]
    pub fn new(
        condition: BoxedCondition,
        prediction: BoxedPrediction,
        action: usize,
        params: &ClassifierParams,
        time: u64,
    ) -> Self {
        Self {
            condition,
            prediction,
            action,
            fitness: params.init_fitness,
            error: params.init_error,
            numerosity: 1,
            experience: 0,
            time_stamp: time,
            mutation_rates: MutationRates::default(),
        }
    }

    /// Creates a classifier whose condition matches `x` and which advocates `action`.
    pub fn cover<R>(
        x: &[f64],
        action: usize,
        dims: Dimensions,
        params: &Params,
        time: u64,
        rng: &mut R,
    ) -> Self
    where
        R: Rng,
    {
        let condition = params.condition.kind.cover(x, &params.condition, rng);
        Self::with_random_rates(condition, action, dims, params, time, rng)
    }

    /// Creates a classifier with a random condition and action.
    pub fn random<R>(dims: Dimensions, params: &Params, time: u64, rng: &mut R) -> Self
    where
        R: Rng,
    {
        let condition = params
            .condition
            .kind
            .random(dims.x_dim, &params.condition, rng);
        let action = rng.random_range(0..dims.n_actions.max(1));
        Self::with_random_rates(condition, action, dims, params, time, rng)
    }

    fn with_random_rates(
        condition: BoxedCondition,
        action: usize,
        dims: Dimensions,
        params: &Params,
        time: u64,
        rng: &mut dyn RngCore,
    ) -> Self {
        let prediction = params.prediction.kind.create(dims, &params.prediction);
        let mut cl = Self::new(condition, prediction, action, &params.classifier, time);
        cl.mutation_rates =
            MutationRates::random(params.ea.num_sam, params.ea.mutation_floor, rng);
        cl
    }

    #[must_use]
    pub fn condition(&self) -> &BoxedCondition {
        &self.condition
    }

    #[must_use]
    pub fn prediction(&self) -> &BoxedPrediction {
        &self.prediction
    }

    #[must_use]
    pub fn action(&self) -> usize {
        self.action
    }

    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    #[must_use]
    pub fn error(&self) -> f64 {
        self.error
    }

    #[must_use]
    pub fn numerosity(&self) -> u32 {
        self.numerosity
    }

    #[must_use]
    pub fn experience(&self) -> u64 {
        self.experience
    }

    #[must_use]
    pub fn time_stamp(&self) -> u64 {
        self.time_stamp
    }

    #[must_use]
    pub fn mutation_rates(&self) -> &MutationRates {
        &self.mutation_rates
    }

    #[must_use]
    pub fn matches(&self, x: &[f64]) -> bool {
        self.condition.matches(x)
    }

    #[must_use]
    pub fn predict(&self, x: &[f64]) -> Vec<f64> {
        self.prediction.compute(x)
    }

    #[must_use]
    pub fn accuracy(&self, params: &ClassifierParams) -> f64 {
        update::accuracy(self.error, params)
    }

    /// Credit assignment for one trial: experience, error, then prediction.
    ///
    /// The error is measured against the prediction made before learning
    /// from `y`.
    pub(crate) fn update(&mut self, x: &[f64], y: &[f64], params: &Params) {
        self.experience += 1;
        let err = params.general.loss.compute(&self.prediction.compute(x), y);
        let c = &params.classifier;
        if self.experience < c.m_probation {
            #[expect(clippy::cast_precision_loss)]
            let n = self.experience as f64;
            self.error += (err - self.error) / n;
        } else {
            self.error += c.beta * (err - self.error);
        }
        self.error = self.error.max(0.0);
        self.prediction.update(x, y);
    }

    /// Moves fitness towards this classifier's share of the set's accuracy.
    pub(crate) fn update_fitness(&mut self, acc_sum: f64, params: &ClassifierParams) {
        let share = self.accuracy(params) * f64::from(self.numerosity) / acc_sum;
        self.fitness += params.beta * (share - self.fitness);
        self.fitness = self.fitness.max(params.fitness_floor);
    }

    /// Weight of this classifier in the deletion roulette.
    #[must_use]
    pub fn deletion_vote(&self, mean_fitness: f64, params: &ClassifierParams) -> f64 {
        let num = f64::from(self.numerosity);
        let vote = self.condition.size_proxy() * num;
        let micro_fitness = self.fitness / num;
        if self.experience > params.theta_del && micro_fitness < params.delta * mean_fitness {
            return vote * mean_fitness / micro_fitness.max(f64::EPSILON * mean_fitness);
        }
        vote
    }

    /// Whether this classifier is experienced and accurate enough to subsume.
    #[must_use]
    pub fn could_subsume(&self, params: &Params) -> bool {
        self.experience > params.subsumption.theta_sub && self.error < params.classifier.eps_0
    }

    /// Same action and a condition covering everything `other` matches.
    #[must_use]
    pub fn is_more_general(&self, other: &Self) -> bool {
        self.action == other.action && self.condition.general_than(other.condition.as_ref())
    }

    /// A single micro-classifier copy for EA reproduction.
    #[must_use]
    pub(crate) fn offspring(&self, time: u64, params: &ClassifierParams) -> Self {
        Self {
            fitness: self.fitness / f64::from(self.numerosity) * params.fit_reduc,
            error: self.error * params.err_reduc,
            numerosity: 1,
            experience: 0,
            time_stamp: time,
            ..self.clone()
        }
    }

    /// Recombines condition and prediction. Returns whether anything changed.
    pub(crate) fn crossover(&mut self, other: &mut Self, rng: &mut dyn RngCore) -> bool {
        let cond = self.condition.crossover(other.condition.as_mut(), rng);
        let pred = self.prediction.crossover(other.prediction.as_mut(), rng);
        cond || pred
    }

    /// Adapts the mutation rates, then mutates condition, prediction and action.
    ///
    /// Returns whether anything other than the rates changed.
    pub(crate) fn mutate<R>(&mut self, params: &Params, dims: Dimensions, rng: &mut R) -> bool
    where
        R: Rng,
    {
        self.mutation_rates.adapt(params.ea.mutation_floor, rng);
        let rates = self.mutation_rates.resolve(&params.ea);
        let mut changed = self.condition.mutate(&rates, rng);
        changed |= self.prediction.mutate(&rates, rng);
        if dims.n_actions > 1 && rng.random_bool(rates.p_mutation) {
            let other = rng.random_range(0..dims.n_actions - 1);
            self.action = if other >= self.action { other + 1 } else { other };
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::{
        condition::{ConditionKind, HyperrectangleCondition},
        param::{ConditionParams, PredictionParams},
        prediction::{ConstantPrediction, PredictionKind},
        test_util::dummy,
    };

    #[test]
    fn test_cover_matches_input() {
        let mut rng = Pcg32::seed_from_u64(1);
        let params = Params::default();
        let dims = Dimensions::reinforcement(3, 4);
        let x = [0.2, 0.7, 0.4];
        let cl = Classifier::cover(&x, 2, dims, &params, 9, &mut rng);
        assert!(cl.matches(&x));
        assert_eq!(cl.action(), 2);
        assert_eq!(cl.numerosity(), 1);
        assert_eq!(cl.experience(), 0);
        assert_eq!(cl.time_stamp(), 9);
        assert_eq!(cl.mutation_rates().len(), params.ea.num_sam);
        assert_eq!(cl.fitness(), params.classifier.init_fitness);
    }

    #[test]
    fn test_probation_then_delta_rule() {
        let params = Params {
            classifier: ClassifierParams {
                m_probation: 3,
                beta: 0.5,
                ..ClassifierParams::default()
            },
            ..Params::default()
        };
        let mut cl = dummy(&params.classifier);
        // constant prediction starts at 0; targets keep it away from the error history
        cl.prediction = Box::new(ConstantPrediction::new(
            1,
            &PredictionParams {
                eta: 0.0,
                ..PredictionParams::default()
            },
        ));
        cl.update(&[], &[1.0], &params);
        assert_eq!(cl.error(), 1.0);
        cl.update(&[], &[3.0], &params);
        assert_eq!(cl.error(), 2.0);
        // experience 3 reaches m_probation: delta rule with beta 0.5
        cl.update(&[], &[4.0], &params);
        assert_eq!(cl.error(), 3.0);
        assert_eq!(cl.experience(), 3);
    }

    #[test]
    fn test_offspring_inherits_scaled_values() {
        let params = ClassifierParams::default();
        let mut parent = dummy(&params);
        parent.numerosity = 4;
        parent.fitness = 0.8;
        parent.error = 0.3;
        parent.experience = 50;
        let child = parent.offspring(77, &params);
        assert_eq!(child.numerosity(), 1);
        assert_eq!(child.experience(), 0);
        assert_eq!(child.time_stamp(), 77);
        assert!((child.fitness() - 0.8 / 4.0 * params.fit_reduc).abs() < 1e-12);
        assert!((child.error() - 0.3 * params.err_reduc).abs() < 1e-12);
    }

    #[test]
    fn test_deletion_vote_penalizes_unfit_experienced() {
        let params = ClassifierParams::default();
        let mut cl = dummy(&params);
        cl.numerosity = 2;
        cl.fitness = 0.002;
        assert_eq!(cl.deletion_vote(1.0, &params), 2.0);
        cl.experience = params.theta_del + 1;
        let vote = cl.deletion_vote(1.0, &params);
        assert!((vote - 2.0 * 1.0 / 0.001).abs() < 1e-6);
        cl.fitness = 0.0;
        assert!(cl.deletion_vote(1.0, &params).is_finite());
    }

    #[test]
    fn test_subsumption_requires_experience_and_accuracy() {
        let params = Params::default();
        let mut cl = dummy(&params.classifier);
        cl.error = 0.0;
        assert!(!cl.could_subsume(&params));
        cl.experience = params.subsumption.theta_sub + 1;
        assert!(cl.could_subsume(&params));
        cl.error = params.classifier.eps_0;
        assert!(!cl.could_subsume(&params));
    }

    #[test]
    fn test_more_general_needs_same_action() {
        let cond = ConditionParams::default();
        let params = ClassifierParams::default();
        let dims = Dimensions::regression(1, 1);
        let pred = || PredictionKind::Constant.create(dims, &PredictionParams::default());
        let wide = Classifier::new(
            Box::new(HyperrectangleCondition::new(vec![0.5], vec![0.5], &cond)),
            pred(),
            0,
            &params,
            0,
        );
        let mut narrow = Classifier::new(
            Box::new(HyperrectangleCondition::new(vec![0.5], vec![0.1], &cond)),
            pred(),
            0,
            &params,
            0,
        );
        assert!(wide.is_more_general(&narrow));
        narrow.action = 1;
        assert!(!wide.is_more_general(&narrow));
    }

    #[test]
    fn test_action_mutation_picks_other_action() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut params = Params::default();
        params.ea.num_sam = 0;
        params.ea.p_mutation = 1.0;
        params.condition.kind = ConditionKind::Dummy;
        let dims = Dimensions::reinforcement(2, 3);
        let mut cl = Classifier::random(dims, &params, 0, &mut rng);
        for _ in 0..20 {
            let before = cl.action();
            assert!(cl.mutate(&params, dims, &mut rng));
            assert_ne!(cl.action(), before);
            assert!(cl.action() < 3);
        }
    }
}
