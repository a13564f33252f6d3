//! An XCSF-style learning classifier system.
//!
//! The system keeps a population of rules ("classifiers"), each pairing a
//! condition over the input space with an action and a prediction. For every
//! input the matching rules form a match set whose fitness-weighted
//! predictions make up the system's answer; the rules that advocated the
//! chosen action then learn from the target or reward with Widrow-Hoff
//! updates, and a steady-state genetic algorithm evolves the population.
//!
//! # How a Trial Works
//!
//! 1. **Matching** - Collect every classifier whose condition matches the input
//! 2. **Covering** - Create matching classifiers for unrepresented actions
//! 3. **Prediction** - Aggregate predictions per action into a [`PredictionArray`]
//! 4. **Action selection** - Explore randomly or exploit the best action
//! 5. **Credit assignment** - Update error, prediction and fitness of the action set
//! 6. **Evolution** - Run the EA on the action set when it is due
//! 7. **Deletion** - Remove micro-classifiers until the population fits `pop_size`
//!
//! # Architecture
//!
//! ```text
//! Xcs (driver facade, trial clock, RNG)
//!     ↓ owns
//! Population (arena of classifiers, kill set)
//!     ↑ referenced by id
//! ClassifierSet (match set, action set)
//!     ↓ feeds
//! PredictionArray / update / Evolver
//! ```
//!
//! Conditions and predictions are trait objects ([`condition::Condition`],
//! [`prediction::Prediction`]) chosen by [`Params`]; the engine never looks
//! inside them.
//!
//! # Example
//!
//! ```
//! use lcs_core::{Dimensions, LcsSeed, Params, Samples, Xcs};
//!
//! let mut train = Samples::new(1, 1);
//! for i in 0..100 {
//!     let x = f64::from(i) / 100.0;
//!     train.push(&[x], &[x * x]).unwrap();
//! }
//!
//! let mut params = Params::default();
//! params.general.pop_size = 200;
//! params.general.max_trials = 2000;
//!
//! let mut xcs = Xcs::new(Dimensions::regression(1, 1), params, LcsSeed::from_u128(1));
//! xcs.fit(&train, None, true).unwrap();
//! assert!(xcs.population_numerosity() <= 200);
//! let y = xcs.predict(&[0.5]).unwrap();
//! assert_eq!(y.len(), 1);
//! ```

pub use self::{
    error::LcsError,
    pa::PredictionArray,
    param::{Dimensions, Params},
    samples::Samples,
    seed::LcsSeed,
    summary::PopulationSummary,
    xcs::Xcs,
};

pub mod classifier;
pub mod clset;
pub mod condition;
pub mod ea;
pub mod error;
pub mod loss;
pub mod matching;
pub mod pa;
pub mod param;
pub mod population;
pub mod prediction;
pub mod sam;
pub mod samples;
pub mod seed;
pub mod summary;
pub mod update;
pub mod xcs;

mod persist;

#[cfg(test)]
mod test_util;
