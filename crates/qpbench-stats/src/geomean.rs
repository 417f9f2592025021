use tracing::debug;

use qpbench_types::{BenchError, Result};

use crate::timing::{check_aligned, penalized_times, SolverTable, MAX_TIMING};

/// Shift added to every time before taking logs, in seconds
pub const DEFAULT_SHIFT: f64 = 10.0;

/// `exp(mean(ln(max(1, t + shift)))) - shift`, accumulated in log space
pub fn shifted_geometric_mean(times: &[f64], shift: f64) -> Option<f64> {
    if times.is_empty() {
        return None;
    }
    let log_sum: f64 = times.iter().map(|&t| (t + shift).max(1.0).ln()).sum();
    Some((log_sum / times.len() as f64).exp() - shift)
}

/// Shifted geometric mean of each solver's times, relative to the best solver
///
/// Failed solves are charged [`MAX_TIMING`]. The best solver reports exactly
/// 1.0. If the best mean is zero, solvers tied with it report 1.0 and the
/// rest report infinity.
pub fn shifted_geometric_means(tables: &[SolverTable], shift: f64) -> Result<Vec<(String, f64)>> {
    let n_problems = check_aligned(tables)?;
    if n_problems == 0 {
        return Err(BenchError::Precondition(
            "geometric mean needs at least one problem".to_string(),
        ));
    }

    let means: Vec<(String, f64)> = tables
        .iter()
        .map(|(solver, table)| {
            let times = penalized_times(table, MAX_TIMING);
            let mean = shifted_geometric_mean(&times, shift).unwrap_or(f64::NAN);
            (solver.clone(), mean)
        })
        .collect();

    let best = means.iter().map(|(_, g)| *g).fold(f64::INFINITY, f64::min);
    debug!(best, problems = n_problems, "shifted geometric means computed");

    Ok(means
        .into_iter()
        .map(|(solver, g)| {
            let normalized = if g == best { 1.0 } else { g / best };
            (solver, normalized)
        })
        .collect())
}
