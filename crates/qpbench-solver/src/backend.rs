use qpbench_types::{PolishStatus, Result, SolverSettings, Status};

use crate::qp_model::QpModel;

/// What an engine can do, consulted by the adapter and the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Safe to run on several worker threads at once
    pub supports_concurrent_execution: bool,
    /// Accepts `time_limit` itself; otherwise the adapter strips it
    pub native_time_limit: bool,
    pub reports_polish: bool,
    pub reports_phase_timings: bool,
}

/// Solution exactly as an engine reports it
#[derive(Debug, Clone, Default)]
pub struct RawSolution {
    /// Engine-native status code, translated through the engine's status map
    pub status_code: String,
    pub x: Option<Vec<f64>>,
    pub y: Option<Vec<f64>>,
    pub obj_val: Option<f64>,
    /// Seconds
    pub run_time: f64,
    pub iterations: u64,
    pub status_polish: Option<PolishStatus>,
    pub setup_time: Option<f64>,
    pub solve_time: Option<f64>,
    pub update_time: Option<f64>,
    pub rho_updates: Option<u64>,
    pub dual_obj_val: Option<f64>,
    pub duality_gap: Option<f64>,
    pub restarts: Option<u64>,
}

/// Trait for QP engines
pub trait SolverBackend: Send + Sync {
    /// Registry key, e.g. "admm"
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> Capabilities;

    /// Native status code to canonical status; codes not listed map to SOLVER_ERROR
    fn status_map(&self) -> &'static [(&'static str, Status)];

    /// Solve a QP problem: minimize 0.5 * x^T P x + q^T x
    /// subject to l <= A x <= u
    fn solve_qp(&self, model: &QpModel, settings: &SolverSettings) -> Result<RawSolution>;

    fn map_status(&self, code: &str) -> Status {
        self.status_map()
            .iter()
            .find(|(native, _)| *native == code)
            .map(|(_, status)| *status)
            .unwrap_or(Status::SolverError)
    }
}
