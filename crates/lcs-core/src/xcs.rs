//! The learning system as seen by a driver.
//!
//! [`Xcs`] owns the population, the parameter snapshot, the random source and
//! the trial clock. A trial runs start to finish before the next begins:
//!
//! ```text
//! input ─▶ match set (+ covering, deletion) ─▶ prediction array ─▶ action
//!            └─ target / reward, when exploring ─▶ update action set ─▶ EA?
//! end of trial ─▶ kill set dropped, population invariants checked
//! ```
//!
//! Supervised learning goes through [`Xcs::fit`] or [`Xcs::run_trial`];
//! single-step reinforcement learning through [`Xcs::decide`],
//! [`Xcs::reinforce`] and [`Xcs::end_trial`].

use std::io::{Read, Write};

use lcs_stats::running::{RunningMean, WindowedMean};
use rand::Rng as _;
use rand_pcg::Pcg32;
use tracing::{debug, info};

use crate::{
    classifier::Classifier,
    clset::ClassifierSet,
    ea::Evolver,
    error::LcsError,
    matching,
    pa::PredictionArray,
    param::{Dimensions, Params},
    persist::{self, Decoder, Encoder},
    population::Population,
    samples::{self, Samples},
    seed::LcsSeed,
    summary::PopulationSummary,
    update,
};

#[derive(Debug)]
struct Trial {
    input: Vec<f64>,
    action_set: ClassifierSet,
    /// System prediction for the chosen action.
    prediction: Option<Vec<f64>>,
    explore: bool,
}

#[derive(Debug)]
pub struct Xcs {
    dims: Dimensions,
    params: Params,
    seed: LcsSeed,
    rng: Pcg32,
    pop: Population,
    /// Number of learning trials so far.
    time: u64,
    /// Decision awaiting its reward.
    trial: Option<Trial>,
    /// Set from the start of a trial until `end_trial`.
    open: bool,
    system_error: RunningMean,
    match_set_size: RunningMean,
    /// Set once the population has first reached `pop_size`.
    saturated: bool,
}

impl Xcs {
    /// Creates a system with an empty population.
    ///
    /// Parameters are sanitized first; every clamped value is logged.
    ///
    /// # Panics
    ///
    /// Panics if `dims.y_dim` or `dims.n_actions` is zero.
    #[must_use]
    pub fn new(dims: Dimensions, params: Params, seed: LcsSeed) -> Self {
        assert!(
            dims.y_dim > 0 && dims.n_actions > 0,
            "output and action dimensions must be non-zero"
        );
        let params = params.sanitized();
        let rate = params.classifier.beta;
        Self {
            dims,
            params,
            seed,
            rng: seed.rng(),
            pop: Population::new(),
            time: 0,
            trial: None,
            open: false,
            system_error: RunningMean::new(rate),
            match_set_size: RunningMean::new(rate),
            saturated: false,
        }
    }

    #[must_use]
    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    #[must_use]
    pub fn seed(&self) -> LcsSeed {
        self.seed
    }

    /// Number of learning trials performed.
    #[must_use]
    pub fn time(&self) -> u64 {
        self.time
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.pop
    }

    /// Number of macro-classifiers.
    #[must_use]
    pub fn population_size(&self) -> usize {
        self.pop.len()
    }

    #[must_use]
    pub fn population_numerosity(&self) -> u64 {
        self.pop.numerosity()
    }

    #[must_use]
    pub fn mean_fitness(&self) -> f64 {
        self.pop.mean_fitness()
    }

    /// Running average of the system prediction error on learning trials.
    #[must_use]
    pub fn system_error(&self) -> f64 {
        self.system_error.value()
    }

    /// Running average of the number of classifiers in a match set.
    #[must_use]
    pub fn mean_match_set_size(&self) -> f64 {
        self.match_set_size.value()
    }

    #[must_use]
    pub fn summary(&self) -> PopulationSummary {
        PopulationSummary::new(&self.pop)
    }

    /// Fills the population with random classifiers up to `pop_size`.
    pub fn init_population(&mut self) -> Result<(), LcsError> {
        let cap = u64::from(self.params.general.pop_size);
        while self.pop.numerosity() < cap {
            let cl = Classifier::random(self.dims, &self.params, self.time, &mut self.rng);
            self.pop.insert(cl);
        }
        debug!(size = self.pop.len(), "population initialized");
        self.check_invariants()
    }

    /// Runs one complete trial and returns the prediction array.
    ///
    /// With a target and `explore` set, the classifiers advocating the
    /// selected action learn from it and the EA may run. Without either the
    /// trial only predicts, although covering can still change the population.
    pub fn run_trial(
        &mut self,
        x: &[f64],
        target: Option<&[f64]>,
        explore: bool,
    ) -> Result<PredictionArray, LcsError> {
        if let Some(y) = target {
            samples::check_len("target", self.dims.y_dim, y)?;
        }
        let (match_set, pa) = self.start_trial(x)?;
        let action = pa.select_action(explore, self.params.action.p_explore, &mut self.rng);
        if let (Some(y), true) = (target, explore) {
            if let Some(prediction) = pa.get(action) {
                self.system_error
                    .push(self.params.general.loss.compute(prediction, y));
            }
            let mut action_set = match_set.action_set(&self.pop, action);
            self.learn(x, &mut action_set, y)?;
        }
        self.end_trial()?;
        Ok(pa)
    }

    /// Starts a reinforcement learning trial and returns the chosen action.
    ///
    /// The trial stays open for [`Xcs::reinforce`] until [`Xcs::end_trial`]
    /// or the next decision.
    pub fn decide(&mut self, x: &[f64], explore: bool) -> Result<usize, LcsError> {
        let (match_set, pa) = self.start_trial(x)?;
        let action = pa.select_action(explore, self.params.action.p_explore, &mut self.rng);
        self.trial = Some(Trial {
            input: x.to_vec(),
            action_set: match_set.action_set(&self.pop, action),
            prediction: pa.get(action).map(<[f64]>::to_vec),
            explore,
        });
        Ok(action)
    }

    /// Pays `reward` for the last decision.
    ///
    /// Only explore trials learn. A decision can be reinforced once.
    pub fn reinforce(&mut self, reward: f64) -> Result<(), LcsError> {
        let y = [reward];
        samples::check_len("reward", self.dims.y_dim, &y)?;
        let Some(mut trial) = self.trial.take() else {
            return Err(LcsError::NoTrial);
        };
        if let Some(prediction) = &trial.prediction {
            self.system_error
                .push(self.params.general.loss.compute(prediction, &y));
        }
        if trial.explore {
            self.learn(&trial.input, &mut trial.action_set, &y)?;
        }
        Ok(())
    }

    /// Closes the current trial: drops the kill set and checks the
    /// population invariants.
    pub fn end_trial(&mut self) -> Result<(), LcsError> {
        self.trial = None;
        self.open = false;
        self.pop.end_trial();
        self.check_invariants()
    }

    /// Learns from `train` for `max_trials` trials.
    ///
    /// Samples are visited in order, or drawn uniformly when `shuffle` is
    /// set. With a `test` set every trial also predicts one random test
    /// sample. Mean train and test errors are logged every `perf_trials`.
    /// Returns the running system error.
    pub fn fit(
        &mut self,
        train: &Samples,
        test: Option<&Samples>,
        shuffle: bool,
    ) -> Result<f64, LcsError> {
        for data in std::iter::once(train).chain(test) {
            self.check_samples(data)?;
        }
        if train.is_empty() {
            return Ok(self.system_error());
        }
        let window = usize::try_from(self.params.general.perf_trials).unwrap_or(usize::MAX);
        let mut train_window = WindowedMean::new(window);
        let mut test_window = WindowedMean::new(window);

        for trial in 0..self.params.general.max_trials {
            let i = if shuffle {
                self.rng.random_range(0..train.len())
            } else {
                usize::try_from(trial % train.len() as u64).unwrap_or(0)
            };
            let (x, y) = (train.input(i), train.target(i));
            let pa = self.run_trial(x, Some(y), true)?;
            let train_error = self.error_of(&pa, y);

            let test_error = match test.filter(|t| !t.is_empty()) {
                Some(test) => {
                    let j = self.rng.random_range(0..test.len());
                    let (x, y) = (test.input(j), test.target(j));
                    let pa = self.run_trial(x, None, false)?;
                    test_window.push(self.error_of(&pa, y))
                }
                None => None,
            };
            if let Some(train_error) = train_window.push(train_error) {
                info!(
                    trials = self.time,
                    train_error,
                    test_error = test_error.unwrap_or(f64::NAN),
                    size = self.pop.len(),
                    mean_match_set = self.match_set_size.value(),
                    "performance"
                );
            }
        }
        Ok(self.system_error())
    }

    /// The system prediction for `x`: the aggregated prediction of the best
    /// action. Covering may add classifiers for unmatched inputs.
    pub fn predict(&mut self, x: &[f64]) -> Result<Vec<f64>, LcsError> {
        let pa = self.run_trial(x, None, false)?;
        Ok(pa
            .get(pa.best_action())
            .map_or_else(|| vec![0.0; self.dims.y_dim], <[f64]>::to_vec))
    }

    /// Mean loss of the system predictions over `samples`.
    #[expect(clippy::cast_precision_loss)]
    pub fn score(&mut self, samples: &Samples) -> Result<f64, LcsError> {
        self.check_samples(samples)?;
        if samples.is_empty() {
            return Ok(0.0);
        }
        let mut total = 0.0;
        for (x, y) in samples.iter() {
            let prediction = self.predict(x)?;
            total += self.params.general.loss.compute(&prediction, y);
        }
        Ok(total / samples.len() as f64)
    }

    /// Writes the dimensions, trial counter and population.
    pub fn save<W>(&self, writer: W) -> Result<(), LcsError>
    where
        W: Write,
    {
        let mut enc = Encoder::new(writer);
        persist::write_header(&mut enc, self.dims, self.time)?;
        enc.u64(self.pop.len() as u64)?;
        for (_, cl) in self.pop.iter() {
            persist::write_classifier(&mut enc, cl)?;
        }
        debug!(size = self.pop.len(), time = self.time, "population saved");
        Ok(())
    }

    /// Restores a system written by [`Xcs::save`].
    ///
    /// `params` must describe the same representations as the run that saved
    /// the population.
    pub fn load<R>(reader: R, params: Params, seed: LcsSeed) -> Result<Self, LcsError>
    where
        R: Read,
    {
        let mut dec = Decoder::new(reader);
        let (dims, time) = persist::read_header(&mut dec)?;
        if dims.y_dim == 0 || dims.n_actions == 0 {
            return Err(LcsError::malformed("zero output or action dimension"));
        }
        let mut xcs = Self::new(dims, params, seed);
        let count = dec.u64()?;
        for _ in 0..count {
            let cl = persist::read_classifier(&mut dec, dims, &xcs.params)?;
            xcs.pop.insert(cl);
        }
        dec.finish()?;

        let cap = u64::from(xcs.params.general.pop_size);
        if xcs.pop.numerosity() > cap {
            return Err(LcsError::malformed(format!(
                "population numerosity {} exceeds pop_size {cap}",
                xcs.pop.numerosity()
            )));
        }
        xcs.time = time;
        xcs.saturated = xcs.pop.numerosity() == cap;
        debug!(size = xcs.pop.len(), time, "population loaded");
        Ok(xcs)
    }

    fn start_trial(&mut self, x: &[f64]) -> Result<(ClassifierSet, PredictionArray), LcsError> {
        samples::check_len("input", self.dims.x_dim, x)?;
        if self.open {
            self.end_trial()?;
        }
        self.open = true;
        let match_set = matching::build_match_set(
            &mut self.pop,
            x,
            self.dims,
            &self.params,
            self.time,
            &mut self.rng,
        )?;
        #[expect(clippy::cast_precision_loss)]
        self.match_set_size.push(match_set.len() as f64);
        let pa = PredictionArray::build(
            &self.pop,
            &match_set,
            x,
            self.dims.n_actions,
            self.dims.y_dim,
        );
        Ok((match_set, pa))
    }

    fn learn(
        &mut self,
        x: &[f64],
        action_set: &mut ClassifierSet,
        y: &[f64],
    ) -> Result<(), LcsError> {
        self.time += 1;
        action_set.validate(&self.pop);
        update::update_set(&mut self.pop, action_set, x, y, &self.params);
        update::update_fitness(&mut self.pop, action_set, &self.params.classifier);
        let ea = Evolver::new(&self.params, self.dims);
        if ea.is_due(&self.pop, action_set, self.time) {
            ea.run(&mut self.pop, action_set, self.time, &mut self.rng)?;
        }
        Ok(())
    }

    fn error_of(&self, pa: &PredictionArray, y: &[f64]) -> f64 {
        pa.get(pa.best_action())
            .map_or(f64::NAN, |prediction| self.params.general.loss.compute(prediction, y))
    }

    fn check_samples(&self, samples: &Samples) -> Result<(), LcsError> {
        for (kind, expected, actual) in [
            ("input", self.dims.x_dim, samples.x_dim()),
            ("target", self.dims.y_dim, samples.y_dim()),
        ] {
            if expected != actual {
                return Err(LcsError::DimensionMismatch {
                    kind,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    fn check_invariants(&mut self) -> Result<(), LcsError> {
        if let Some((_, actual)) = self.pop.recount() {
            return Err(LcsError::NumerosityMismatch {
                expected: self.pop.numerosity(),
                actual,
            });
        }
        let cap = u64::from(self.params.general.pop_size);
        let actual = self.pop.numerosity();
        if actual > cap || (self.saturated && actual != cap) {
            return Err(LcsError::NumerosityMismatch {
                expected: cap,
                actual,
            });
        }
        self.saturated |= actual == cap;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use rand::{Rng as _, SeedableRng as _};

    use super::*;
    use crate::{condition::ConditionKind, prediction::PredictionKind};

    fn sine(n: usize, seed: u64) -> Samples {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut samples = Samples::new(1, 1);
        for _ in 0..n {
            let x: f64 = rng.random();
            samples
                .push(&[x], &[0.5 + 0.5 * (2.0 * PI * x).sin()])
                .unwrap();
        }
        samples
    }

    fn small_params(pop_size: u32, max_trials: u64) -> Params {
        let mut params = Params::default();
        params.general.pop_size = pop_size;
        params.general.max_trials = max_trials;
        params.general.perf_trials = 500;
        params
    }

    #[test]
    fn test_numerosity_is_conserved() {
        let mut params = small_params(60, 0);
        params.subsumption.ea_subsumption = true;
        params.subsumption.set_subsumption = true;
        params.ea.theta_ea = 5.0;
        let data = sine(200, 1);
        let mut xcs = Xcs::new(Dimensions::regression(1, 1), params, LcsSeed::from_u128(7));
        let mut full = false;
        for t in 0..3000 {
            let i = t % data.len();
            xcs.run_trial(data.input(i), Some(data.target(i)), true)
                .unwrap();
            let num = xcs.population_numerosity();
            assert!(num <= 60);
            full |= num == 60;
            if full {
                assert_eq!(num, 60);
            }
        }
        assert!(full);
        assert_eq!(xcs.time(), 3000);
    }

    #[test]
    fn test_single_classifier_converges() {
        let mut params = small_params(1, 0);
        params.condition.kind = ConditionKind::Dummy;
        params.prediction.kind = PredictionKind::Constant;
        let mut xcs = Xcs::new(Dimensions::regression(1, 1), params, LcsSeed::from_u128(3));
        for _ in 0..1000 {
            xcs.run_trial(&[0.4], Some(&[0.7]), true).unwrap();
        }
        assert_eq!(xcs.population_size(), 1);
        let eps_0 = xcs.params().classifier.eps_0;
        let (_, cl) = xcs.population().iter().next().unwrap();
        assert!(cl.error() < eps_0, "error {}", cl.error());
        assert_eq!(cl.accuracy(&xcs.params().classifier), 1.0);
        let prediction = xcs.predict(&[0.4]).unwrap();
        assert!((prediction[0] - 0.7).abs() < eps_0);
    }

    #[test]
    fn test_fit_reduces_error() {
        let params = small_params(400, 20_000);
        let train = sine(500, 11);
        let test = sine(100, 12);
        let mut xcs = Xcs::new(Dimensions::regression(1, 1), params, LcsSeed::from_u128(5));
        let before = xcs.score(&test).unwrap();
        xcs.fit(&train, Some(&test), true).unwrap();
        let after = xcs.score(&test).unwrap();
        assert!(after < before, "{after} >= {before}");
        assert!(xcs.mean_match_set_size() > 0.0);
    }

    #[test]
    fn test_init_population_fills_to_cap() {
        let params = small_params(30, 0);
        let mut xcs = Xcs::new(Dimensions::reinforcement(3, 2), params, LcsSeed::from_u128(1));
        xcs.init_population().unwrap();
        assert_eq!(xcs.population_numerosity(), 30);
        assert_eq!(xcs.population_size(), 30);
    }

    #[test]
    fn test_persistence_round_trip() {
        let mut params = small_params(80, 2000);
        params.condition.kind = ConditionKind::Hyperrectangle;
        let seed = LcsSeed::from_u128(9);
        let data = sine(100, 2);
        let mut xcs = Xcs::new(Dimensions::regression(1, 1), params.clone(), seed);
        xcs.fit(&data, None, true).unwrap();

        let mut bytes = Vec::new();
        xcs.save(&mut bytes).unwrap();
        let mut restored = Xcs::load(bytes.as_slice(), params, seed).unwrap();

        assert_eq!(restored.time(), xcs.time());
        assert_eq!(restored.population_size(), xcs.population_size());
        assert_eq!(restored.population_numerosity(), xcs.population_numerosity());
        for ((_, a), (_, b)) in xcs.population().iter().zip(restored.population().iter()) {
            assert_eq!(a.numerosity(), b.numerosity());
            assert_eq!(a.fitness(), b.fitness());
            assert_eq!(a.error(), b.error());
            assert_eq!(a.experience(), b.experience());
            assert_eq!(a.time_stamp(), b.time_stamp());
            assert_eq!(a.action(), b.action());
            assert_eq!(a.mutation_rates(), b.mutation_rates());
            assert_eq!(a.predict(&[0.3]), b.predict(&[0.3]));
        }
        // a covered input predicts without touching the random source
        let (x, _) = data
            .iter()
            .find(|(x, _)| xcs.population().iter().any(|(_, cl)| cl.matches(x)))
            .unwrap();
        assert_eq!(restored.predict(x).unwrap(), xcs.predict(x).unwrap());
    }

    #[test]
    fn test_load_rejects_corrupt_data() {
        let params = small_params(20, 0);
        let dims = Dimensions::regression(1, 1);
        let mut xcs = Xcs::new(dims, params.clone(), LcsSeed::from_u128(9));
        xcs.init_population().unwrap();
        let mut bytes = Vec::new();
        xcs.save(&mut bytes).unwrap();
        let seed = LcsSeed::from_u128(0);

        let truncated = &bytes[..bytes.len() - 3];
        assert!(matches!(
            Xcs::load(truncated, params.clone(), seed),
            Err(LcsError::MalformedState { .. })
        ));

        let mut bad_magic = bytes.clone();
        bad_magic[0] = b'X';
        assert!(matches!(
            Xcs::load(bad_magic.as_slice(), params.clone(), seed),
            Err(LcsError::MalformedState { .. })
        ));

        let mut trailing = bytes.clone();
        trailing.push(0);
        assert!(Xcs::load(trailing.as_slice(), params.clone(), seed).is_err());

        let smaller = small_params(10, 0);
        assert!(matches!(
            Xcs::load(bytes.as_slice(), smaller, seed),
            Err(LcsError::MalformedState { .. })
        ));
    }

    #[test]
    fn test_reinforcement_learns_threshold() {
        let mut params = small_params(200, 0);
        params.prediction.kind = PredictionKind::Constant;
        let mut xcs = Xcs::new(Dimensions::reinforcement(1, 2), params, LcsSeed::from_u128(17));
        let mut rng = Pcg32::seed_from_u64(17);
        let correct = |x: f64| usize::from(x > 0.5);
        for _ in 0..6000 {
            let x: f64 = rng.random();
            let action = xcs.decide(&[x], true).unwrap();
            let reward = if action == correct(x) { 1.0 } else { 0.0 };
            xcs.reinforce(reward).unwrap();
            xcs.end_trial().unwrap();
        }
        let mut hits = 0;
        for _ in 0..200 {
            let x: f64 = rng.random();
            if xcs.decide(&[x], false).unwrap() == correct(x) {
                hits += 1;
            }
            xcs.end_trial().unwrap();
        }
        assert!(hits > 120, "{hits}");
    }

    #[test]
    fn test_reinforce_needs_decision() {
        let mut xcs = Xcs::new(
            Dimensions::reinforcement(1, 2),
            Params::default(),
            LcsSeed::from_u128(1),
        );
        assert!(matches!(xcs.reinforce(1.0), Err(LcsError::NoTrial)));
        xcs.decide(&[0.5], true).unwrap();
        xcs.reinforce(1.0).unwrap();
        assert!(matches!(xcs.reinforce(1.0), Err(LcsError::NoTrial)));
        assert_eq!(xcs.time(), 1);
    }

    #[test]
    fn test_next_decision_closes_reinforced_trial() {
        let mut params = small_params(20, 0);
        params.ea.theta_ea = 0.0;
        let mut xcs = Xcs::new(Dimensions::reinforcement(1, 2), params, LcsSeed::from_u128(23));
        let mut rng = Pcg32::seed_from_u64(23);
        for _ in 0..2000 {
            let x: f64 = rng.random();
            xcs.decide(&[x], true).unwrap();
            // only removals made by this decision are still pending
            assert!(xcs.population().kill_set().count() <= 40);
            xcs.reinforce(1.0).unwrap();
        }
        assert_eq!(xcs.time(), 2000);
        assert!(xcs.population_numerosity() <= 20);
        xcs.end_trial().unwrap();
        assert_eq!(xcs.population().kill_set().count(), 0);
    }

    #[test]
    fn test_dimension_mismatch_is_reported() {
        let mut xcs = Xcs::new(
            Dimensions::regression(2, 1),
            Params::default(),
            LcsSeed::from_u128(1),
        );
        assert!(matches!(
            xcs.predict(&[0.5]),
            Err(LcsError::DimensionMismatch {
                kind: "input",
                expected: 2,
                actual: 1
            })
        ));
        assert!(xcs.run_trial(&[0.1, 0.2], Some(&[1.0, 2.0]), true).is_err());
        assert!(xcs.fit(&Samples::new(1, 1), None, false).is_err());
        assert_eq!(xcs.population_size(), 0);
    }

    #[test]
    fn test_same_seed_same_population() {
        let params = small_params(50, 1000);
        let data = sine(50, 4);
        let run = || {
            let mut xcs = Xcs::new(
                Dimensions::regression(1, 1),
                params.clone(),
                LcsSeed::from_u128(42),
            );
            xcs.fit(&data, None, true).unwrap();
            let mut bytes = Vec::new();
            xcs.save(&mut bytes).unwrap();
            bytes
        };
        assert_eq!(run(), run());
    }
}
