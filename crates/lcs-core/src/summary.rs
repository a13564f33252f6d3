use lcs_stats::descriptive::DescriptiveStats;

use crate::{classifier::Classifier, population::Population};

/// Distribution of classifier properties across a population.
///
/// Each statistic is taken over macro-classifiers; `None` for an empty
/// population.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationSummary {
    pub size: usize,
    pub numerosity: u64,
    pub mean_fitness: f64,
    pub fitness: Option<DescriptiveStats>,
    pub error: Option<DescriptiveStats>,
    pub experience: Option<DescriptiveStats>,
    pub macro_numerosity: Option<DescriptiveStats>,
}

impl PopulationSummary {
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn new(pop: &Population) -> Self {
        let collect = |f: fn(&Classifier) -> f64| {
            DescriptiveStats::new(pop.iter().map(|(_, cl)| f(cl)))
        };
        Self {
            size: pop.len(),
            numerosity: pop.numerosity(),
            mean_fitness: pop.mean_fitness(),
            fitness: collect(|cl| cl.fitness),
            error: collect(|cl| cl.error),
            experience: collect(|cl| cl.experience as f64),
            macro_numerosity: collect(|cl| f64::from(cl.numerosity)),
        }
    }
}
