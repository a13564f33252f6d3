use std::path::PathBuf;

use lcs_core::Params;

use crate::util::Output;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ParamsArg {
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ParamsArg) -> anyhow::Result<()> {
    Output::save_json(&Params::default(), arg.output.clone())
}
