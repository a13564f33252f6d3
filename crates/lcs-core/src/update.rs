//! Credit assignment.
//!
//! After the target (supervised) or payoff (reinforcement) for a trial is
//! known, every member of the action set updates its error and prediction
//! ([`update_set`]); fitness is then shared out by relative accuracy across
//! the whole set ([`update_fitness`]).

use crate::{
    clset::ClassifierSet,
    param::{ClassifierParams, Params},
    population::Population,
};

/// Accuracy of a classifier with the given error.
///
/// `1` up to `eps_0`, then `alpha * (error / eps_0)^-nu`.
#[must_use]
pub fn accuracy(error: f64, params: &ClassifierParams) -> f64 {
    if error <= params.eps_0 {
        1.0
    } else {
        params.alpha * (error / params.eps_0).powf(-params.nu)
    }
}

/// Updates experience, error and prediction of every member of `set`.
pub fn update_set(
    pop: &mut Population,
    set: &ClassifierSet,
    x: &[f64],
    y: &[f64],
    params: &Params,
) {
    pop.for_each_mut(set.ids(), params.general.n_threads, |cl| {
        cl.update(x, y, params);
    });
}

/// Shares fitness out by accuracy.
///
/// `fitness += beta * (accuracy * numerosity / acc_sum - fitness)` for every
/// member. Nothing changes when the accuracy sum is zero.
pub fn update_fitness(pop: &mut Population, set: &ClassifierSet, params: &ClassifierParams) {
    let acc_sum: f64 = set
        .members(pop)
        .map(|(_, cl)| cl.accuracy(params) * f64::from(cl.numerosity))
        .sum();
    if acc_sum <= 0.0 {
        return;
    }
    for id in set.ids() {
        if let Some(cl) = pop.get_mut(*id) {
            cl.update_fitness(acc_sum, params);
        }
    }
}
