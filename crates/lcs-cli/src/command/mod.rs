use clap::{Parser, Subcommand};

use self::{evaluate::EvaluateArg, params::ParamsArg, train::TrainArg};

mod evaluate;
mod params;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Train a classifier system on a built-in problem
    Train(#[clap(flatten)] TrainArg),
    /// Score a saved model on fresh problem instances
    Evaluate(#[clap(flatten)] EvaluateArg),
    /// Print the default parameters as JSON
    Params(#[clap(flatten)] ParamsArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Evaluate(arg) => evaluate::run(&arg)?,
        Mode::Params(arg) => params::run(&arg)?,
    }
    Ok(())
}
