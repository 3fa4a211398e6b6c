use anyhow::Result;
use clap::Parser;
use tokio::runtime::Runtime;

use studyflow_app::cli::commands::run_cli;
use studyflow_app::cli::opts::Cli;
use studyflow_app::logging::init_tracing;

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level);

    let rt = Runtime::new()?;
    rt.block_on(run_cli(args))
}
