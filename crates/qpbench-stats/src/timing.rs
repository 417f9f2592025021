use qpbench_types::{BenchError, Result, ResultTable};

/// Run time charged to a solve that produced no usable solution
pub const MAX_TIMING: f64 = 1e8;

/// A solver's name with its result table
pub type SolverTable = (String, ResultTable);

/// Check that every table covers the same problems in the same order
///
/// Returns the shared number of problems.
pub fn check_aligned(tables: &[SolverTable]) -> Result<usize> {
    let views: Vec<(&str, &ResultTable)> = tables.iter().map(|(s, t)| (s.as_str(), t)).collect();
    check_views(&views)
}

pub(crate) fn check_views(tables: &[(&str, &ResultTable)]) -> Result<usize> {
    let (first_solver, first) = tables
        .first()
        .ok_or_else(|| BenchError::Precondition("no solver tables to compare".to_string()))?;
    let keys = first.keys();

    for (solver, table) in &tables[1..] {
        if table.len() != first.len() {
            return Err(BenchError::Precondition(format!(
                "{} has {} records but {} has {}",
                solver,
                table.len(),
                first_solver,
                first.len()
            )));
        }
        if let Some((i, (a, b))) = keys
            .iter()
            .zip(table.iter().map(|r| r.key()))
            .enumerate()
            .find(|(_, (a, b))| *a != b)
        {
            return Err(BenchError::Precondition(format!(
                "record {} is '{}' for {} but '{}' for {}",
                i, a, first_solver, b, solver
            )));
        }
    }

    Ok(keys.len())
}

/// Run times with `max_timing` in place of every solve that has no solution
pub fn penalized_times(table: &ResultTable, max_timing: f64) -> Vec<f64> {
    table
        .iter()
        .map(|r| {
            if r.is_solution_present() {
                r.run_time
            } else {
                max_timing
            }
        })
        .collect()
}

/// Median of a sample, `None` when empty
pub(crate) fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some(0.5 * (sorted[mid - 1] + sorted[mid]))
    } else {
        Some(sorted[mid])
    }
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
