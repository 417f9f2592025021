use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "qpbench", version, about = "Benchmark QP solvers and summarize the results")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Solve a benchmark set with every selected solver
    Run {
        #[command(subcommand)]
        set: SetCommand,
    },

    /// Compute statistics from the results of a finished run
    Stats(StatsArgs),
}

#[derive(Subcommand, Debug)]
pub enum SetCommand {
    /// Random problem families swept over dimensions
    Parametric {
        /// Dimensions per family
        #[arg(long, default_value_t = 10)]
        n_dim: usize,

        /// Instances per dimension
        #[arg(long, default_value_t = 10)]
        n_instances: u64,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Every `.qplib` file in a directory
    Qplib {
        /// Directory holding the QPLIB files
        #[arg(long, default_value = "problem_classes/qplib_data")]
        dir: PathBuf,

        /// Name of the output folder
        #[arg(long, default_value = "qplib_problems")]
        name: String,

        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// JSON run configuration; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Root of the result files
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Solve instances on a worker pool
    #[arg(long)]
    pub parallel: bool,

    /// Worker count (capped by the machine)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Use the high accuracy solver identities
    #[arg(long)]
    pub high_accuracy: bool,

    /// Key unit files by a fingerprint of the solver settings
    #[arg(long)]
    pub fingerprint: bool,

    /// Let solvers print their own progress
    #[arg(long)]
    pub verbose: bool,

    /// Solver identities to run, comma separated (default: standard set)
    #[arg(long, value_delimiter = ',')]
    pub solvers: Vec<String>,

    /// Compute statistics once the run finishes
    #[arg(long)]
    pub stats: bool,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Output folder of one benchmark set, e.g. results/benchmark_problems
    pub set_dir: PathBuf,

    /// Solvers to compare, comma separated (default: standard set)
    #[arg(long, value_delimiter = ',')]
    pub solvers: Vec<String>,

    /// Pair the high accuracy polish variants
    #[arg(long)]
    pub high_accuracy: bool,
}
