//! Match set construction and covering.

use rand::{Rng, seq::IndexedRandom as _};
use tracing::debug;

use crate::{
    classifier::Classifier,
    clset::ClassifierSet,
    error::LcsError,
    param::{Dimensions, Params},
    population::Population,
};

/// Upper bound on covering attempts for a single match set.
pub const MAX_COVER_ATTEMPTS: usize = 1000;

/// Collects every classifier matching `x`, covering until at least
/// `theta_mna` distinct actions are represented.
///
/// Each cover is inserted into the population and the population cap is
/// enforced right away, which can delete a fresh cover again; covering then
/// repeats, up to [`MAX_COVER_ATTEMPTS`] times.
pub fn build_match_set<R>(
    pop: &mut Population,
    x: &[f64],
    dims: Dimensions,
    params: &Params,
    time: u64,
    rng: &mut R,
) -> Result<ClassifierSet, LcsError>
where
    R: Rng,
{
    let mut set = ClassifierSet::from_ids(pop.matching_ids(x, params.general.n_threads));
    let required = params.theta_mna(dims);
    let mut attempts = 0;
    loop {
        let missing: Vec<usize> = set
            .represented_actions(pop, dims.n_actions)
            .into_iter()
            .enumerate()
            .filter(|(_, present)| !present)
            .map(|(action, _)| action)
            .collect();
        if dims.n_actions - missing.len() >= required {
            break;
        }
        if attempts >= MAX_COVER_ATTEMPTS {
            return Err(LcsError::CoveringExhausted { required, attempts });
        }
        let Some(&action) = missing.choose(rng) else {
            break;
        };
        attempts += 1;
        let cl = Classifier::cover(x, action, dims, params, time, rng);
        set.push(pop.insert(cl));
        pop.enforce_limit(u64::from(params.general.pop_size), &params.classifier, rng)?;
        set.validate(pop);
    }
    if attempts > 0 {
        debug!(time, covers = attempts, size = set.len(), "covered match set");
    }
    Ok(set)
}
