use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use qpbench_types::{
    compute_hash, BenchError, Fingerprint, Result, ResultTable, ADMM, ADMM_HIGH, ADMM_POLISH,
    ADMM_POLISH_HIGH,
};

use crate::geomean::{shifted_geometric_means, DEFAULT_SHIFT};
use crate::polish::{phase_timing_ratios, polish_statistics, PhaseTiming, PolishStatistics};
use crate::profile::{failure_rates, performance_profiles, PerformanceProfile, ProfileOptions};
use crate::timing::{check_aligned, SolverTable};

pub const FAILURE_RATES_FILE: &str = "failure_rates.csv";
pub const PROFILES_FILE: &str = "performance_profiles.csv";
pub const GEOM_MEAN_FILE: &str = "geom_mean.csv";
pub const POLISH_FILE: &str = "polish_statistics.csv";
pub const PHASE_TIMING_FILE: &str = "phase_timing.csv";
pub const SUMMARY_FILE: &str = "statistics.txt";

/// Every statistic of one benchmark set, with digests of the tables it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    pub set_dir: PathBuf,
    pub problems: usize,
    /// SHA-256 of each solver's `results.csv`, in solver order
    pub inputs: Vec<(String, Fingerprint)>,
    pub failure_rates: Vec<(String, f64)>,
    pub geom_means: Vec<(String, f64)>,
    pub profile: PerformanceProfile,
    pub polish: Option<PolishStatistics>,
    pub phase_timing: Vec<PhaseTiming>,
}

impl StatsReport {
    /// Plain-text summary written to `statistics.txt`
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Benchmark statistics for {}", self.set_dir.display())?;
        writeln!(f, "Problems: {}", self.problems)?;

        writeln!(f, "\nFailure rates")?;
        for (solver, rate) in &self.failure_rates {
            writeln!(f, "  {:<20} {:>8.2}%", solver, rate * 100.0)?;
        }

        writeln!(f, "\nShifted geometric means (shift {}s, best = 1)", DEFAULT_SHIFT)?;
        for (solver, mean) in &self.geom_means {
            writeln!(f, "  {:<20} {:>10.4}", solver, mean)?;
        }

        if let Some(polish) = &self.polish {
            writeln!(f, "\nPolish ({} vs {})", polish.polished, polish.base)?;
            writeln!(f, "  problems solved by {}: {}", polish.base, polish.problems)?;
            if let Some(ratio) = polish.median_time_ratio {
                writeln!(f, "  median time ratio: {:.4}", ratio)?;
            }
            if let Some(rate) = polish.success_rate {
                writeln!(f, "  polish success: {:.2}%", rate * 100.0)?;
            }
        }

        if !self.phase_timing.is_empty() {
            writeln!(f, "\nSetup / solve time")?;
            for phase in &self.phase_timing {
                writeln!(
                    f,
                    "  {:<20} mean {:.4}  median {:.4}  ({} records)",
                    phase.solver, phase.mean_ratio, phase.median_ratio, phase.records
                )?;
            }
        }

        writeln!(f, "\nInputs")?;
        for (solver, digest) in &self.inputs {
            writeln!(f, "  {:<20} {}", solver, digest)?;
        }
        Ok(())
    }
}

/// Load `{set_dir}/{solver}/results.csv` for each solver, in order
pub fn load_solver_tables(set_dir: &Path, solvers: &[String]) -> Result<(Vec<SolverTable>, Vec<(String, Fingerprint)>)> {
    let mut tables = Vec::with_capacity(solvers.len());
    let mut digests = Vec::with_capacity(solvers.len());

    for solver in solvers {
        let path = set_dir.join(solver).join("results.csv");
        if !path.is_file() {
            return Err(BenchError::ProblemNotFound(format!(
                "no results for {} at {}",
                solver,
                path.display()
            )));
        }
        let bytes = fs::read(&path)?;
        let text = std::str::from_utf8(&bytes)
            .map_err(|e| BenchError::Parse(format!("{}: {}", path.display(), e)))?;
        let table = ResultTable::from_csv_str(text)
            .map_err(|e| BenchError::Parse(format!("{}: {}", path.display(), e)))?;

        digests.push((solver.clone(), compute_hash(&bytes)));
        tables.push((solver.clone(), table));
    }

    Ok((tables, digests))
}

/// The unpolished/polished solver pair compared at this accuracy tier
pub fn polish_pair(high_accuracy: bool) -> (&'static str, &'static str) {
    if high_accuracy {
        (ADMM_HIGH, ADMM_POLISH_HIGH)
    } else {
        (ADMM, ADMM_POLISH)
    }
}

/// Compute every statistic for a set and write them next to its results
pub fn compute_stats_info(set_dir: &Path, solvers: &[String], high_accuracy: bool) -> Result<StatsReport> {
    let (tables, inputs) = load_solver_tables(set_dir, solvers)?;
    let problems = check_aligned(&tables)?;

    let profile = performance_profiles(&tables, &ProfileOptions::default())?;
    let geom_means = shifted_geometric_means(&tables, DEFAULT_SHIFT)?;

    let (base, polished) = polish_pair(high_accuracy);
    let find = |name: &str| tables.iter().find(|(s, _)| s == name);
    let polish = match (find(base), find(polished)) {
        (Some(b), Some(p)) => Some(polish_statistics(b, p)?),
        _ => None,
    };

    let report = StatsReport {
        set_dir: set_dir.to_path_buf(),
        problems,
        inputs,
        failure_rates: failure_rates(&tables),
        geom_means,
        profile,
        polish,
        phase_timing: tables
            .iter()
            .filter_map(|(solver, table)| phase_timing_ratios(solver, table))
            .collect(),
    };

    write_outputs(set_dir, &report)?;
    info!(
        set_dir = %set_dir.display(),
        solvers = solvers.len(),
        problems,
        "statistics written"
    );
    Ok(report)
}

fn write_outputs(set_dir: &Path, report: &StatsReport) -> Result<()> {
    fs::create_dir_all(set_dir)?;

    write_rows(
        &set_dir.join(FAILURE_RATES_FILE),
        &["solver", "failure_rate"],
        report
            .failure_rates
            .iter()
            .map(|(s, r)| vec![s.clone(), r.to_string()]),
    )?;

    write_rows(
        &set_dir.join(GEOM_MEAN_FILE),
        &["solver", "geom_mean"],
        report
            .geom_means
            .iter()
            .map(|(s, g)| vec![s.clone(), g.to_string()]),
    )?;

    let mut writer = csv::Writer::from_path(set_dir.join(PROFILES_FILE))?;
    report.profile.to_csv(&mut writer)?;

    write_rows(
        &set_dir.join(POLISH_FILE),
        &["base", "polished", "problems", "median_time_ratio", "success_rate"],
        report.polish.iter().map(|p| {
            vec![
                p.base.clone(),
                p.polished.clone(),
                p.problems.to_string(),
                opt(p.median_time_ratio),
                opt(p.success_rate),
            ]
        }),
    )?;

    write_rows(
        &set_dir.join(PHASE_TIMING_FILE),
        &["solver", "records", "mean_ratio", "median_ratio"],
        report.phase_timing.iter().map(|p| {
            vec![
                p.solver.clone(),
                p.records.to_string(),
                p.mean_ratio.to_string(),
                p.median_ratio.to_string(),
            ]
        }),
    )?;

    fs::write(set_dir.join(SUMMARY_FILE), report.summary())?;
    Ok(())
}

fn write_rows<I>(path: &Path, header: &[&str], rows: I) -> Result<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
