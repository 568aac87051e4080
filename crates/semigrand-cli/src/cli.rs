use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Semigrand Developers",
    version,
    about = "semigrand - Wang-Landau and umbrella sampling of molecule state occupancy in the semigrand ensemble.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run semigrand moves on the system described by a configuration file.
    Run(RunArgs),
    /// Summarize the moves stored in a checkpoint archive.
    Inspect(InspectArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the run configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Override the number of trials to run.
    #[arg(short = 'n', long, value_name = "INT")]
    pub trials: Option<u64>,

    /// Seed for the random number generator. Omit for a random seed.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Override how often, in trials, the checkpoint archive is written.
    #[arg(long, value_name = "INT")]
    pub checkpoint_interval: Option<u64>,

    /// Override the checkpoint archive path.
    #[arg(long, value_name = "PATH")]
    pub checkpoint_file: Option<PathBuf>,

    /// Stop once every Wang-Landau move's weight step is at or below this value.
    #[arg(long, value_name = "FLOAT")]
    pub min_weight_step: Option<f64>,

    /// Resume the system and moves from a checkpoint archive.
    #[arg(short, long, value_name = "PATH")]
    pub restart: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S moves.0.weight-step=2.0
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to a checkpoint archive written by `run`.
    #[arg(required = true, value_name = "PATH")]
    pub checkpoint: PathBuf,

    /// Also print every move's full weight table.
    #[arg(short, long)]
    pub weights: bool,
}
