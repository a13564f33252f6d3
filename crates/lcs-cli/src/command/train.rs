use std::path::PathBuf;

use chrono::Utc;
use lcs_core::{LcsSeed, Xcs};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;

use crate::{
    problem::{Problem, ProblemKind, rmux::RealMultiplexer, sine},
    schema::summary::{ModelSummary, PopulationStats},
    util::{self, Output},
};

const SINE_TRAIN_SAMPLES: usize = 1000;
const SINE_TEST_SAMPLES: usize = 500;
const RMUX_TEST_TRIALS: usize = 1000;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    #[arg(long, default_value = "sine")]
    problem: ProblemKind,
    /// Address bits of the real multiplexer
    #[arg(long, default_value_t = 2)]
    address_bits: usize,
    /// Parameter JSON file; unset fields keep their defaults
    #[arg(long)]
    params: Option<PathBuf>,
    /// Seed in hex; random when omitted
    #[arg(long, value_parser = util::parse_seed)]
    seed: Option<LcsSeed>,
    /// Binary model output path
    #[arg(long)]
    model: Option<PathBuf>,
    /// Summary JSON output path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let TrainArg {
        problem,
        address_bits,
        params,
        seed,
        model,
        output,
    } = arg;
    let problem = Problem::new(*problem, *address_bits);
    let params = util::read_params_file(params.as_ref())?;
    let seed = seed.unwrap_or_else(|| rand::rng().random());
    let mut data_rng = Pcg32::from_rng(&mut seed.rng());

    eprintln!("Training on {problem:?} with seed {seed}");
    let mut xcs = Xcs::new(problem.dims(), params, seed);
    if xcs.params().general.pop_init {
        xcs.init_population()?;
    }
    let max_trials = xcs.params().general.max_trials;
    let perf_trials = xcs.params().general.perf_trials;

    let (score, train_accuracy) = match problem {
        Problem::Sine => {
            let train = sine::samples(SINE_TRAIN_SAMPLES, &mut data_rng)?;
            let test = sine::samples(SINE_TEST_SAMPLES, &mut data_rng)?;
            xcs.fit(&train, Some(&test), true)?;
            (xcs.score(&test)?, None)
        }
        Problem::Rmux { address_bits } => {
            let mux = RealMultiplexer::new(address_bits);
            let accuracy = mux.train(&mut xcs, max_trials, perf_trials, &mut data_rng)?;
            let score = mux.evaluate(&mut xcs, RMUX_TEST_TRIALS, &mut data_rng)?;
            (score, accuracy)
        }
    };

    let summary = ModelSummary {
        problem,
        trained_at: Utc::now(),
        seed,
        params: xcs.params().clone(),
        trials: xcs.time(),
        system_error: xcs.system_error(),
        score,
        train_accuracy,
        population: PopulationStats::from(&xcs.summary()),
    };

    if let Some(path) = model {
        util::save_model(&xcs, path)?;
    }
    Output::save_json(&summary, output.clone())?;

    eprintln!();
    eprintln!("Training completed");
    if let Some(path) = model {
        eprintln!("  Model: {}", path.display());
    }
    eprintln!("  Trials: {}", summary.trials);
    eprintln!("  System error: {:.4}", summary.system_error);
    eprintln!("  Score: {:.4}", summary.score);
    if let Some(accuracy) = summary.train_accuracy {
        eprintln!("  Training accuracy: {accuracy:.4}");
    }
    eprintln!(
        "  Population: {} macro / {} micro classifiers",
        summary.population.size, summary.population.numerosity
    );

    Ok(())
}
