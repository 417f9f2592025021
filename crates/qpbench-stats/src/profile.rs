use serde::{Deserialize, Serialize};
use tracing::debug;

use qpbench_types::{BenchError, Result, ResultTable};

use crate::timing::{check_aligned, penalized_times, SolverTable, MAX_TIMING};

/// Fraction of a table's records with no usable solution
///
/// An empty table has a failure rate of 0.
pub fn failure_rate(table: &ResultTable) -> f64 {
    if table.is_empty() {
        return 0.0;
    }
    let failed = table.iter().filter(|r| !r.is_solution_present()).count();
    failed as f64 / table.len() as f64
}

/// Failure rate of every solver, in input order
pub fn failure_rates(tables: &[SolverTable]) -> Vec<(String, f64)> {
    tables
        .iter()
        .map(|(solver, table)| (solver.clone(), failure_rate(table)))
        .collect()
}

/// Threshold grid and failure penalty of a performance profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileOptions {
    /// log10 of the smallest threshold
    pub log_tau_min: f64,
    /// log10 of the largest threshold
    pub log_tau_max: f64,
    pub points: usize,
    pub max_timing: f64,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            log_tau_min: 0.0,
            log_tau_max: 4.0,
            points: 1000,
            max_timing: MAX_TIMING,
        }
    }
}

impl ProfileOptions {
    /// Thresholds `10^a .. 10^b`, evenly spaced in log10
    pub fn tau_grid(&self) -> Vec<f64> {
        match self.points {
            0 => Vec::new(),
            1 => vec![10f64.powf(self.log_tau_min)],
            points => {
                let step = (self.log_tau_max - self.log_tau_min) / (points - 1) as f64;
                (0..points)
                    .map(|i| 10f64.powf(self.log_tau_min + step * i as f64))
                    .collect()
            }
        }
    }
}

/// Fraction of problems each solver solves within `tau` times the best time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceProfile {
    pub tau: Vec<f64>,
    /// One curve per solver, aligned with `tau`, in input order
    pub curves: Vec<(String, Vec<f64>)>,
}

impl PerformanceProfile {
    pub fn curve(&self, solver: &str) -> Option<&[f64]> {
        self.curves
            .iter()
            .find(|(s, _)| s == solver)
            .map(|(_, curve)| curve.as_slice())
    }

    /// Write as `tau,<solver>,...` with one row per threshold
    pub fn to_csv<W: std::io::Write>(&self, writer: &mut csv::Writer<W>) -> Result<()> {
        let mut header = vec!["tau".to_string()];
        header.extend(self.curves.iter().map(|(s, _)| s.clone()));
        writer.write_record(&header)?;

        for (i, tau) in self.tau.iter().enumerate() {
            let mut row = vec![tau.to_string()];
            row.extend(self.curves.iter().map(|(_, curve)| curve[i].to_string()));
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Performance profiles of the compared solvers
///
/// Failed solves are charged `max_timing` rather than dropped, so a solver
/// with failures never reaches 1 unless every solver failed the same
/// problems. Where all times of a problem are equal each solver's ratio is 1.
pub fn performance_profiles(tables: &[SolverTable], options: &ProfileOptions) -> Result<PerformanceProfile> {
    let n_problems = check_aligned(tables)?;
    if n_problems == 0 {
        return Err(BenchError::Precondition(
            "performance profile needs at least one problem".to_string(),
        ));
    }

    let times: Vec<Vec<f64>> = tables
        .iter()
        .map(|(_, table)| penalized_times(table, options.max_timing))
        .collect();

    let best: Vec<f64> = (0..n_problems)
        .map(|p| times.iter().map(|t| t[p]).fold(f64::INFINITY, f64::min))
        .collect();

    let tau = options.tau_grid();
    let curves = tables
        .iter()
        .zip(&times)
        .map(|((solver, _), t)| {
            let mut ratios: Vec<f64> = t
                .iter()
                .zip(&best)
                .map(|(&time, &min)| if time == min { 1.0 } else { time / min })
                .collect();
            ratios.sort_by(f64::total_cmp);

            let curve = tau
                .iter()
                .map(|&threshold| {
                    ratios.partition_point(|&r| r <= threshold) as f64 / n_problems as f64
                })
                .collect();
            (solver.clone(), curve)
        })
        .collect();

    debug!(solvers = tables.len(), problems = n_problems, points = tau.len(), "performance profiles computed");
    Ok(PerformanceProfile { tau, curves })
}
