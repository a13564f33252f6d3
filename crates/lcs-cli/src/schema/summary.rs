use chrono::{DateTime, Utc};
use lcs_core::{LcsSeed, Params, PopulationSummary};
use lcs_stats::descriptive::DescriptiveStats;
use serde::{Deserialize, Serialize};

use crate::problem::Problem;

/// Record written next to a saved model.
///
/// Holds everything needed to reload the population: the problem it was
/// trained on, the parameters and the seed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelSummary {
    pub problem: Problem,
    pub trained_at: DateTime<Utc>,
    pub seed: LcsSeed,
    pub params: Params,
    pub trials: u64,
    pub system_error: f64,
    /// Test loss for regression, exploit accuracy for reinforcement.
    pub score: f64,
    /// Exploit accuracy over the last training window, for reinforcement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_accuracy: Option<f64>,
    pub population: PopulationStats,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PopulationStats {
    pub size: usize,
    pub numerosity: u64,
    pub mean_fitness: f64,
    pub fitness: Option<Stats>,
    pub error: Option<Stats>,
    pub experience: Option<Stats>,
    pub numerosity_per_classifier: Option<Stats>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Stats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

impl From<&DescriptiveStats> for Stats {
    fn from(stats: &DescriptiveStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean,
            median: stats.median,
            std_dev: stats.std_dev,
        }
    }
}

impl From<&PopulationSummary> for PopulationStats {
    fn from(summary: &PopulationSummary) -> Self {
        Self {
            size: summary.size,
            numerosity: summary.numerosity,
            mean_fitness: summary.mean_fitness,
            fitness: summary.fitness.as_ref().map(Stats::from),
            error: summary.error.as_ref().map(Stats::from),
            experience: summary.experience.as_ref().map(Stats::from),
            numerosity_per_classifier: summary.macro_numerosity.as_ref().map(Stats::from),
        }
    }
}
