//! The prediction array: the system's aggregated prediction per action.

use rand::{Rng, seq::IndexedRandom as _};

use crate::{clset::ClassifierSet, population::Population};

/// Fitness-weighted mean prediction of each action's advocates in a match set.
///
/// Actions without advocates have no entry and never get selected.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionArray {
    values: Vec<Option<Vec<f64>>>,
}

impl PredictionArray {
    /// Aggregates the predictions of `set` for input `x`.
    ///
    /// If every advocate of an action has zero fitness their plain mean is
    /// used instead.
    #[must_use]
    pub fn build(
        pop: &Population,
        set: &ClassifierSet,
        x: &[f64],
        n_actions: usize,
        y_dim: usize,
    ) -> Self {
        let mut weighted = vec![vec![0.0; y_dim]; n_actions];
        let mut plain = vec![vec![0.0; y_dim]; n_actions];
        let mut fitness = vec![0.0; n_actions];
        let mut count = vec![0u32; n_actions];

        for (_, cl) in set.members(pop) {
            let a = cl.action;
            if a >= n_actions {
                continue;
            }
            let prediction = cl.predict(x);
            for ((w, p), v) in weighted[a].iter_mut().zip(&mut plain[a]).zip(&prediction) {
                *w += cl.fitness * v;
                *p += v;
            }
            fitness[a] += cl.fitness;
            count[a] += 1;
        }

        let values = (0..n_actions)
            .map(|a| {
                if count[a] == 0 {
                    return None;
                }
                let mean = if fitness[a] > 0.0 {
                    weighted[a].iter().map(|w| w / fitness[a]).collect()
                } else {
                    let n = f64::from(count[a]);
                    plain[a].iter().map(|p| p / n).collect()
                };
                Some(mean)
            })
            .collect();
        Self { values }
    }

    #[must_use]
    pub fn n_actions(&self) -> usize {
        self.values.len()
    }

    /// Aggregated prediction for `action`, if any classifier advocates it.
    #[must_use]
    pub fn get(&self, action: usize) -> Option<&[f64]> {
        self.values.get(action)?.as_deref()
    }

    /// Actions advocated by at least one classifier.
    pub fn represented(&self) -> impl Iterator<Item = usize> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_some())
            .map(|(a, _)| a)
    }

    /// The represented action with the highest first output.
    ///
    /// Ties go to the lowest action; an empty array yields action 0.
    #[must_use]
    pub fn best_action(&self) -> usize {
        let mut best: Option<(usize, f64)> = None;
        for (a, value) in self.values.iter().enumerate() {
            let Some(v) = value.as_ref().and_then(|v| v.first().copied()) else {
                continue;
            };
            if best.is_none_or(|(_, b)| v > b) {
                best = Some((a, v));
            }
        }
        best.map_or(0, |(a, _)| a)
    }

    /// A uniformly chosen represented action; action 0 if none is represented.
    pub fn random_action<R>(&self, rng: &mut R) -> usize
    where
        R: Rng,
    {
        let represented: Vec<usize> = self.represented().collect();
        represented.choose(rng).copied().unwrap_or(0)
    }

    /// Explores with probability `p_explore` when `explore` is set, otherwise
    /// exploits.
    pub fn select_action<R>(&self, explore: bool, p_explore: f64, rng: &mut R) -> usize
    where
        R: Rng,
    {
        if explore && rng.random_bool(p_explore) {
            self.random_action(rng)
        } else {
            self.best_action()
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::{
        classifier::Classifier,
        param::PredictionParams,
        prediction::{ConstantPrediction, Prediction as _},
        test_util::interval,
    };

    fn constant(action: usize, value: f64, fitness: f64) -> Classifier {
        let mut cl = interval(0.5, 0.5, action);
        let params = PredictionParams {
            eta: 1.0,
            ..PredictionParams::default()
        };
        let mut pred = ConstantPrediction::new(1, &params);
        pred.update(&[], &[value]);
        cl.prediction = Box::new(pred);
        cl.fitness = fitness;
        cl
    }

    fn array(cls: Vec<Classifier>, n_actions: usize) -> PredictionArray {
        let mut pop = Population::new();
        let set = ClassifierSet::from_ids(cls.into_iter().map(|cl| pop.insert(cl)).collect());
        PredictionArray::build(&pop, &set, &[0.5], n_actions, 1)
    }

    #[test]
    fn test_fitness_weighted_mean() {
        let pa = array(vec![constant(0, 1.0, 0.3), constant(0, 0.0, 0.1)], 2);
        assert!((pa.get(0).unwrap()[0] - 0.75).abs() < 1e-12);
        assert_eq!(pa.get(1), None);
        assert_eq!(pa.represented().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_zero_fitness_falls_back_to_plain_mean() {
        let pa = array(vec![constant(1, 1.0, 0.0), constant(1, 0.0, 0.0)], 2);
        assert!((pa.get(1).unwrap()[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_best_action_skips_unrepresented_and_breaks_ties_low() {
        let pa = array(
            vec![
                constant(1, -1.0, 1.0),
                constant(2, 0.5, 1.0),
                constant(3, 0.5, 1.0),
            ],
            4,
        );
        assert_eq!(pa.best_action(), 2);
    }

    #[test]
    fn test_exploit_never_explores() {
        let mut rng = Pcg32::seed_from_u64(6);
        let pa = array(vec![constant(0, 1.0, 1.0), constant(1, 0.0, 1.0)], 2);
        for _ in 0..100 {
            assert_eq!(pa.select_action(false, 1.0, &mut rng), 0);
            assert_ne!(pa.random_action(&mut rng), 2);
        }
        let explored = (0..100)
            .filter(|_| pa.select_action(true, 1.0, &mut rng) == 1)
            .count();
        assert!(explored > 20);
    }
}
