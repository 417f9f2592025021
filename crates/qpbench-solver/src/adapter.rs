use std::sync::Arc;

use qpbench_types::{Result, SolverExtras, SolverSettings, Status};
use tracing::{debug, warn};

use crate::backend::{Capabilities, RawSolution, SolverBackend};
use crate::optimality::is_qp_solution_optimal;
use crate::qp_model::QpModel;

/// Canonical result of one adapter call
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: Status,
    /// Engine objective, without offset or sense correction; `None` unless a
    /// solution is present
    pub obj_val: Option<f64>,
    pub run_time: f64,
    pub iterations: u64,
    pub x: Option<Vec<f64>>,
    pub y: Option<Vec<f64>>,
    pub extras: SolverExtras,
}

/// One solver identity bound to the engine that executes it
#[derive(Clone)]
pub struct SolverAdapter {
    backend: Arc<dyn SolverBackend>,
    settings: SolverSettings,
}

impl std::fmt::Debug for SolverAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverAdapter")
            .field("engine", &self.backend.name())
            .field("settings", &self.settings)
            .finish()
    }
}

impl SolverAdapter {
    pub fn new(backend: Arc<dyn SolverBackend>, settings: SolverSettings) -> Self {
        SolverAdapter { backend, settings }
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Identity written to result tables
    pub fn solver_name(&self) -> &str {
        &self.settings.solver
    }

    pub fn capabilities(&self) -> Capabilities {
        self.backend.capabilities()
    }

    /// Solve `model` and translate the engine's answer into a canonical status
    ///
    /// Solver failures come back as `Ok` with a non-optimal status; only an
    /// invalid instance or an engine crash is an `Err`.
    pub fn solve(&self, model: &QpModel) -> Result<SolveOutcome> {
        model.validate()?;

        let capabilities = self.backend.capabilities();
        let time_limit = self.settings.time_limit;

        let raw = if capabilities.native_time_limit {
            self.backend.solve_qp(model, &self.settings)?
        } else {
            let engine_settings = self.settings.clone().with_time_limit(None);
            self.backend.solve_qp(model, &engine_settings)?
        };

        let mut status = self.backend.map_status(&raw.status_code);
        if status == Status::SolverError {
            debug!(
                solver = %self.settings.solver,
                code = %raw.status_code,
                "engine status maps to SOLVER_ERROR"
            );
        }

        if status.is_solution_present() && !self.solution_checks_out(model, &raw) {
            warn!(
                solver = %self.settings.solver,
                reported = %status,
                "solution failed optimality check, recording SOLVER_ERROR"
            );
            status = Status::SolverError;
        }

        if let Some(limit) = time_limit {
            if raw.run_time > limit {
                debug!(
                    solver = %self.settings.solver,
                    run_time = raw.run_time,
                    limit,
                    "run exceeded time limit"
                );
                status = Status::TimeLimit;
            }
        }

        let extras = extras_for(&capabilities, &raw);
        let solution_present = status.is_solution_present();

        Ok(SolveOutcome {
            status,
            obj_val: raw.obj_val.filter(|_| solution_present),
            run_time: raw.run_time,
            iterations: raw.iterations,
            x: raw.x,
            y: raw.y,
            extras,
        })
    }

    fn solution_checks_out(&self, model: &QpModel, raw: &RawSolution) -> bool {
        match (&raw.x, &raw.y) {
            (Some(x), Some(y)) => is_qp_solution_optimal(model, x, y, self.settings.accuracy),
            _ => false,
        }
    }
}

fn extras_for(capabilities: &Capabilities, raw: &RawSolution) -> SolverExtras {
    let mut extras = SolverExtras {
        dual_obj_val: raw.dual_obj_val,
        duality_gap: raw.duality_gap,
        restarts: raw.restarts,
        ..SolverExtras::default()
    };
    if capabilities.reports_polish {
        extras.status_polish = raw.status_polish;
    }
    if capabilities.reports_phase_timings {
        extras.setup_time = raw.setup_time;
        extras.solve_time = raw.solve_time;
        extras.update_time = raw.update_time;
        extras.rho_updates = raw.rho_updates;
    }
    extras
}
