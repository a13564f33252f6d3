//! Steady-state evolutionary algorithm.
//!
//! The EA runs on one classifier set (the action set, which is the match set
//! in single-action regression) when the members have on average gone
//! `theta_ea` trials without taking part in it. One invocation:
//!
//! 1. stamps every member with the current trial
//! 2. selects two parents (roulette on fitness or tournament)
//! 3. copies them into offspring with reduced fitness and reset experience
//! 4. crosses the offspring over with probability `p_crossover`
//! 5. adapts each offspring's mutation rates and mutates it
//! 6. inserts the offspring, or lets a parent absorb them (EA subsumption)
//! 7. runs set subsumption if enabled
//! 8. deletes until the population is back within `pop_size`
//!
//! Steps 2 to 6 repeat until `lambda` offspring have been produced.

use rand::{Rng, seq::IndexedRandom as _};
use tracing::debug;

use crate::{
    classifier::Classifier,
    clset::ClassifierSet,
    error::LcsError,
    param::{Dimensions, Params, SelectionKind},
    population::{ClassifierId, Population},
};

/// What a single EA invocation did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EaOutcome {
    pub offspring: usize,
    /// Offspring added to the population as new classifiers.
    pub inserted: usize,
    /// Offspring absorbed by a parent.
    pub subsumed: usize,
    /// Classifiers absorbed by set subsumption.
    pub set_subsumed: usize,
    /// Micro-classifiers deleted to restore the population cap.
    pub deleted: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct Evolver<'a> {
    params: &'a Params,
    dims: Dimensions,
}

impl<'a> Evolver<'a> {
    #[must_use]
    pub fn new(params: &'a Params, dims: Dimensions) -> Self {
        Self { params, dims }
    }

    /// Whether the members of `set` are due for an EA invocation at `time`.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn is_due(&self, pop: &Population, set: &ClassifierSet, time: u64) -> bool {
        !set.is_empty() && time as f64 - set.mean_time_stamp(pop) >= self.params.ea.theta_ea
    }

    /// Runs one EA invocation on `set`. Offspring that join the population
    /// also join `set`.
    pub fn run<R>(
        &self,
        pop: &mut Population,
        set: &mut ClassifierSet,
        time: u64,
        rng: &mut R,
    ) -> Result<EaOutcome, LcsError>
    where
        R: Rng,
    {
        let mut outcome = EaOutcome::default();
        set.validate(pop);
        if set.is_empty() {
            return Ok(outcome);
        }
        set.set_time_stamps(pop, time);

        while outcome.offspring < self.params.ea.lambda {
            let (Some(p1), Some(p2)) = (self.select(pop, set, rng), self.select(pop, set, rng))
            else {
                break;
            };
            let (mut c1, mut c2) = match (pop.get(p1), pop.get(p2)) {
                (Some(a), Some(b)) => (
                    a.offspring(time, &self.params.classifier),
                    b.offspring(time, &self.params.classifier),
                ),
                _ => break,
            };

            if rng.random_bool(self.params.ea.p_crossover) && c1.crossover(&mut c2, rng) {
                let error = (c1.error + c2.error) / 2.0;
                let fitness = (c1.fitness + c2.fitness) / 2.0;
                for child in [&mut c1, &mut c2] {
                    child.error = error;
                    child.fitness = fitness;
                }
            }

            for mut child in [c1, c2] {
                if outcome.offspring == self.params.ea.lambda {
                    break;
                }
                child.mutate(self.params, self.dims, rng);
                outcome.offspring += 1;
                if self.absorbed_by_parent(pop, &child, [p1, p2]) {
                    outcome.subsumed += 1;
                } else {
                    set.push(pop.insert(child));
                    outcome.inserted += 1;
                }
            }
        }

        if self.params.subsumption.set_subsumption {
            outcome.set_subsumed = set.subsume(pop, self.params);
        }
        outcome.deleted = pop.enforce_limit(
            u64::from(self.params.general.pop_size),
            &self.params.classifier,
            rng,
        )?;
        set.validate(pop);

        debug!(
            time,
            offspring = outcome.offspring,
            inserted = outcome.inserted,
            subsumed = outcome.subsumed + outcome.set_subsumed,
            deleted = outcome.deleted,
            "EA invoked"
        );
        Ok(outcome)
    }

    fn absorbed_by_parent(
        &self,
        pop: &mut Population,
        child: &Classifier,
        parents: [ClassifierId; 2],
    ) -> bool {
        if !self.params.subsumption.ea_subsumption {
            return false;
        }
        let subsumer = parents.into_iter().find(|id| {
            pop.get(*id)
                .is_some_and(|p| p.could_subsume(self.params) && p.is_more_general(child))
        });
        subsumer.is_some_and(|id| pop.add_numerosity(id, 1))
    }

    /// Picks a parent from `set`, or `None` when the set has no live members.
    pub fn select<R>(
        &self,
        pop: &Population,
        set: &ClassifierSet,
        rng: &mut R,
    ) -> Option<ClassifierId>
    where
        R: Rng,
    {
        let members: Vec<(ClassifierId, &Classifier)> = set.members(pop).collect();
        let picked = match self.params.ea.select_type {
            SelectionKind::Roulette => roulette(&members, rng),
            SelectionKind::Tournament => tournament(&members, self.params.ea.select_size, rng),
        };
        picked.or_else(|| members.choose(rng).map(|(id, _)| *id))
    }
}

/// Roulette wheel on fitness. `None` if the total fitness is not positive.
fn roulette<R>(members: &[(ClassifierId, &Classifier)], rng: &mut R) -> Option<ClassifierId>
where
    R: Rng,
{
    let total: f64 = members.iter().map(|(_, cl)| cl.fitness).sum();
    if !(total.is_finite() && total > 0.0) {
        return None;
    }
    let mut point = rng.random::<f64>() * total;
    for (id, cl) in members {
        if point < cl.fitness {
            return Some(*id);
        }
        point -= cl.fitness;
    }
    members.last().map(|(id, _)| *id)
}

/// Each micro-classifier enters with probability `select_size`; the entrant
/// with the highest fitness per micro-classifier wins. `None` if nobody entered.
fn tournament<R>(
    members: &[(ClassifierId, &Classifier)],
    select_size: f64,
    rng: &mut R,
) -> Option<ClassifierId>
where
    R: Rng,
{
    let mut winner: Option<(ClassifierId, f64)> = None;
    for (id, cl) in members {
        let entered = (0..cl.numerosity).any(|_| rng.random_bool(select_size));
        if !entered {
            continue;
        }
        let score = cl.fitness / f64::from(cl.numerosity);
        if winner.is_none_or(|(_, best)| score > best) {
            winner = Some((*id, score));
        }
    }
    winner.map(|(id, _)| id)
}
