use serde::{Deserialize, Serialize};

use qpbench_types::{PolishStatus, Result, ResultTable, Status};

use crate::timing::{check_views, mean, median, SolverTable};

/// Effect of polishing, over problems the unpolished solver solved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolishStatistics {
    pub base: String,
    pub polished: String,
    /// Problems where the base solver reported OPTIMAL
    pub problems: usize,
    /// Median of polished / base run time
    pub median_time_ratio: Option<f64>,
    /// Fraction of those problems where polishing succeeded
    pub success_rate: Option<f64>,
}

/// Compare a solver against its polishing variant on the same problems
///
/// Only problems where `base` is `OPTIMAL` count; ratios with a zero base
/// time are skipped.
pub fn polish_statistics(base: &SolverTable, polished: &SolverTable) -> Result<PolishStatistics> {
    let (base_name, base_table) = base;
    let (polished_name, polished_table) = polished;
    check_views(&[(base_name.as_str(), base_table), (polished_name.as_str(), polished_table)])?;

    let pairs: Vec<_> = base_table
        .iter()
        .zip(polished_table.iter())
        .filter(|(b, _)| b.status == Status::Optimal)
        .collect();

    let ratios: Vec<f64> = pairs
        .iter()
        .filter(|(b, _)| b.run_time > 0.0)
        .map(|(b, p)| p.run_time / b.run_time)
        .collect();

    let success_rate = if pairs.is_empty() {
        None
    } else {
        let successful = pairs
            .iter()
            .filter(|(_, p)| p.extras.status_polish == Some(PolishStatus::Successful))
            .count();
        Some(successful as f64 / pairs.len() as f64)
    };

    Ok(PolishStatistics {
        base: base_name.clone(),
        polished: polished_name.clone(),
        problems: pairs.len(),
        median_time_ratio: median(&ratios),
        success_rate,
    })
}

/// Setup time relative to solve time for one solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTiming {
    pub solver: String,
    pub records: usize,
    pub mean_ratio: f64,
    pub median_ratio: f64,
}

/// `setup_time / solve_time` over solved records with a positive solve time
///
/// `None` when the table carries no phase timings.
pub fn phase_timing_ratios(solver: &str, table: &ResultTable) -> Option<PhaseTiming> {
    let ratios: Vec<f64> = table
        .iter()
        .filter(|r| r.is_solution_present())
        .filter_map(|r| match (r.extras.setup_time, r.extras.solve_time) {
            (Some(setup), Some(solve)) if solve > 0.0 => Some(setup / solve),
            _ => None,
        })
        .collect();

    Some(PhaseTiming {
        solver: solver.to_string(),
        records: ratios.len(),
        mean_ratio: mean(&ratios)?,
        median_ratio: median(&ratios)?,
    })
}
