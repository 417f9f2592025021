//! `qpbench` - run QP solver benchmarks and compute their statistics

mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qpbench_runner::{BenchmarkRunner, NamedSet, ParametricSet, RunConfig, RunReport};
use qpbench_solver::SolverRegistry;
use qpbench_stats::compute_stats_info;
use qpbench_types::{standard_solvers, SolverSettings};

use crate::cli::{Cli, Command, RunArgs, SetCommand, StatsArgs};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run { set } => run(set),
        Command::Stats(args) => stats(args),
    }
}

fn run(set: SetCommand) -> Result<()> {
    let (report, args, config) = match set {
        SetCommand::Parametric {
            n_dim,
            n_instances,
            run,
        } => {
            let config = build_config(&run)?;
            let solvers = solver_settings(&config, &run.solvers)?;
            let set = ParametricSet::standard(n_dim, n_instances)
                .with_name(config.set_name("benchmark_problems"));
            let runner = BenchmarkRunner::new(config.clone(), SolverRegistry::with_defaults())?;
            let report = runner
                .run_parametric(&set, &solvers)
                .context("parametric benchmark failed")?;
            (report, run, config)
        }
        SetCommand::Qplib { dir, name, run } => {
            let config = build_config(&run)?;
            let solvers = solver_settings(&config, &run.solvers)?;
            let set = NamedSet::from_qplib_dir(config.set_name(&name), &dir)
                .with_context(|| format!("failed to list QPLIB problems in {}", dir.display()))?;
            let runner = BenchmarkRunner::new(config.clone(), SolverRegistry::with_defaults())?;
            let report = runner
                .run_named(&set, &solvers)
                .context("QPLIB benchmark failed")?;
            (report, run, config)
        }
    };

    info!(
        set = %report.set_name,
        computed = report.computed(),
        cached = report.cached(),
        "benchmark finished"
    );

    if args.stats {
        stats_after_run(&report, config.high_accuracy)?;
    }
    print_results(&report);
    Ok(())
}

/// Statistics over the tables of a finished run; false when the set was empty
fn stats_after_run(report: &RunReport, high_accuracy: bool) -> Result<bool> {
    if report.units.is_empty() {
        info!(set = %report.set_name, "no problems in set, skipping statistics");
        return Ok(false);
    }
    let solvers = report.results.iter().map(|(s, _)| s.clone()).collect::<Vec<_>>();
    write_stats(&report.set_dir, &solvers, high_accuracy)?;
    Ok(true)
}

fn stats(args: StatsArgs) -> Result<()> {
    let solvers = if args.solvers.is_empty() {
        standard_solvers(args.high_accuracy)
            .into_iter()
            .map(str::to_string)
            .collect()
    } else {
        args.solvers
    };
    write_stats(&args.set_dir, &solvers, args.high_accuracy)
}

fn write_stats(set_dir: &Path, solvers: &[String], high_accuracy: bool) -> Result<()> {
    let report = compute_stats_info(set_dir, solvers, high_accuracy)
        .with_context(|| format!("failed to compute statistics for {}", set_dir.display()))?;
    print!("{}", report.summary());
    Ok(())
}

/// File configuration, then command line overrides
fn build_config(args: &RunArgs) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_json_file(path)
            .with_context(|| format!("failed to load run configuration {}", path.display()))?,
        None => RunConfig::default(),
    };

    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    if let Some(workers) = args.workers {
        config.desired_parallelism = workers;
    }
    config.parallel |= args.parallel;
    config.high_accuracy |= args.high_accuracy;
    config.fingerprint_cache |= args.fingerprint;
    config.verbose |= args.verbose;
    Ok(config)
}

fn solver_settings(config: &RunConfig, names: &[String]) -> Result<Vec<SolverSettings>> {
    if names.is_empty() {
        return Ok(config.standard_settings()?);
    }
    names
        .iter()
        .map(|name| {
            config
                .settings_for(name)
                .with_context(|| format!("unknown solver identity '{}'", name))
        })
        .collect()
}

fn print_results(report: &RunReport) {
    for (solver, path) in &report.results {
        println!("{:<20} {}", solver, path.display());
    }
}
