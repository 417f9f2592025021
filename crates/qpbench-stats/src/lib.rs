mod timing;
mod profile;
mod geomean;
mod polish;
mod report;

pub use timing::{check_aligned, penalized_times, SolverTable, MAX_TIMING};
pub use profile::{failure_rate, failure_rates, performance_profiles, PerformanceProfile, ProfileOptions};
pub use geomean::{shifted_geometric_mean, shifted_geometric_means, DEFAULT_SHIFT};
pub use polish::{phase_timing_ratios, polish_statistics, PhaseTiming, PolishStatistics};
pub use report::{
    compute_stats_info, load_solver_tables, polish_pair, StatsReport, FAILURE_RATES_FILE,
    GEOM_MEAN_FILE, PHASE_TIMING_FILE, POLISH_FILE, PROFILES_FILE, SUMMARY_FILE,
};

#[cfg(test)]
mod tests;
