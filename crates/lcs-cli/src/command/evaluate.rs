use std::path::PathBuf;

use rand::SeedableRng as _;
use rand_pcg::Pcg32;

use crate::{
    problem::{Problem, rmux::RealMultiplexer, sine},
    util,
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct EvaluateArg {
    /// Summary JSON written by `train`
    #[arg(long)]
    summary: PathBuf,
    /// Binary model written by `train`
    #[arg(long)]
    model: PathBuf,
    /// Number of fresh problem instances to score on
    #[arg(long, default_value_t = 1000)]
    samples: usize,
    /// Seed for drawing the problem instances
    #[arg(long, default_value_t = 0)]
    data_seed: u64,
}

pub(crate) fn run(arg: &EvaluateArg) -> anyhow::Result<()> {
    let EvaluateArg {
        summary,
        model,
        samples,
        data_seed,
    } = arg;
    let summary = util::read_summary_file(summary)?;
    let mut xcs = util::load_model(model, summary.params.clone(), summary.seed)?;
    let mut rng = Pcg32::seed_from_u64(*data_seed);

    let (metric, score) = match summary.problem {
        Problem::Sine => {
            let test = sine::samples(*samples, &mut rng)?;
            (format!("{:?}", xcs.params().general.loss), xcs.score(&test)?)
        }
        Problem::Rmux { address_bits } => {
            let mux = RealMultiplexer::new(address_bits);
            ("accuracy".to_owned(), mux.evaluate(&mut xcs, *samples, &mut rng)?)
        }
    };

    eprintln!("Model trained at {} on {:?}", summary.trained_at, summary.problem);
    eprintln!(
        "  Population: {} macro / {} micro classifiers",
        xcs.population_size(),
        xcs.population_numerosity()
    );
    eprintln!("  Trials: {}", xcs.time());
    eprintln!("  {metric}: {score:.4} (at training: {:.4})", summary.score);

    Ok(())
}
