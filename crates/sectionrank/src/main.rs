use std::path::PathBuf;

use crate::prelude::*;
use clap::Parser;

mod analyze;
mod error;
mod outline;
mod prelude;
mod scenario;
mod workspace;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Extract PDF outlines and rank document sections for a persona and a job"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Analysis settings (TOML)
    #[clap(long, env = "SECTIONRANK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Documents processed in parallel (defaults to the number of CPUs)
    #[clap(long, env = "SECTIONRANK_JOBS", global = true)]
    jobs: Option<usize>,

    /// Whether to display additional information.
    #[clap(long, env = "SECTIONRANK_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Write the outline of every PDF in a directory as JSON
    Outline(crate::outline::Options),

    /// Rank the sections of a set of PDFs for a persona and a job
    Analyze(crate::analyze::Options),

    /// Run the persona analysis for every scenario directory
    Scenarios(crate::scenario::Options),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Outline(options) => crate::outline::run(options, app.global).await,
        SubCommands::Analyze(options) => crate::analyze::run(options, app.global).await,
        SubCommands::Scenarios(options) => crate::scenario::run(options, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
