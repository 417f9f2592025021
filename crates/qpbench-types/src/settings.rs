use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};
use crate::hashing::{compute_json_hash, Fingerprint};

/// Low-accuracy tolerance tier
pub const EPS_LOW: f64 = 1e-3;
/// High-accuracy tolerance tier
pub const EPS_HIGH: f64 = 1e-6;
/// Default per-solve time limit in seconds
pub const TIME_LIMIT: f64 = 1000.0;

pub const CLARABEL: &str = "CLARABEL";
pub const CLARABEL_HIGH: &str = "CLARABEL_high";
pub const ADMM: &str = "ADMM";
pub const ADMM_HIGH: &str = "ADMM_high";
pub const ADMM_POLISH: &str = "ADMM_polish";
pub const ADMM_POLISH_HIGH: &str = "ADMM_polish_high";

/// Tolerance tier of a solver identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accuracy {
    Low,
    High,
}

impl Accuracy {
    pub fn eps(self) -> f64 {
        match self {
            Accuracy::Low => EPS_LOW,
            Accuracy::High => EPS_HIGH,
        }
    }
}

/// Immutable settings of one solver identity.
///
/// `solver` names the identity used in result tables ("ADMM_polish_high"),
/// `engine` names the registered backend that executes it ("admm").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    pub solver: String,
    pub engine: String,
    pub eps_abs: f64,
    pub eps_rel: f64,
    /// Seconds; `None` disables the post-solve time check
    pub time_limit: Option<f64>,
    pub polish: bool,
    pub accuracy: Accuracy,
    pub max_iter: u32,
    pub verbose: bool,
    /// Initial ADMM step size, ignored by other engines
    pub rho: f64,
}

impl SolverSettings {
    /// Settings for an engine at a given tier
    pub fn new(solver: &str, engine: &str, accuracy: Accuracy) -> Self {
        SolverSettings {
            solver: solver.to_string(),
            engine: engine.to_string(),
            eps_abs: accuracy.eps(),
            eps_rel: accuracy.eps(),
            time_limit: Some(TIME_LIMIT),
            polish: false,
            accuracy,
            max_iter: 100_000,
            verbose: false,
            rho: 0.1,
        }
    }

    /// Look up one of the built-in solver identities
    pub fn preset(solver: &str) -> Result<Self> {
        let settings = match solver {
            CLARABEL => Self::new(CLARABEL, "clarabel", Accuracy::Low),
            CLARABEL_HIGH => Self::new(CLARABEL_HIGH, "clarabel", Accuracy::High),
            ADMM => Self::new(ADMM, "admm", Accuracy::Low),
            ADMM_HIGH => Self::new(ADMM_HIGH, "admm", Accuracy::High),
            ADMM_POLISH => Self::new(ADMM_POLISH, "admm", Accuracy::Low).with_polish(true),
            ADMM_POLISH_HIGH => {
                Self::new(ADMM_POLISH_HIGH, "admm", Accuracy::High).with_polish(true)
            }
            other => return Err(BenchError::UnknownSolver(other.to_string())),
        };
        Ok(settings)
    }

    pub fn with_polish(mut self, polish: bool) -> Self {
        self.polish = polish;
        self
    }

    pub fn with_time_limit(mut self, time_limit: Option<f64>) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn with_max_iter(mut self, max_iter: u32) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Hex SHA-256 of the settings' JSON encoding
    ///
    /// `verbose` only affects engine logging and is left out.
    pub fn fingerprint(&self) -> Result<Fingerprint> {
        Ok(compute_json_hash(&FingerprintView::from(self))?)
    }
}

/// Fields of `SolverSettings` that can change a result
#[derive(Serialize)]
struct FingerprintView<'a> {
    solver: &'a str,
    engine: &'a str,
    eps_abs: f64,
    eps_rel: f64,
    time_limit: Option<f64>,
    polish: bool,
    accuracy: Accuracy,
    max_iter: u32,
    rho: f64,
}

impl<'a> From<&'a SolverSettings> for FingerprintView<'a> {
    fn from(settings: &'a SolverSettings) -> Self {
        FingerprintView {
            solver: &settings.solver,
            engine: &settings.engine,
            eps_abs: settings.eps_abs,
            eps_rel: settings.eps_rel,
            time_limit: settings.time_limit,
            polish: settings.polish,
            accuracy: settings.accuracy,
            max_iter: settings.max_iter,
            rho: settings.rho,
        }
    }
}

/// Solver identities of the standard comparison, in report order
pub fn standard_solvers(high_accuracy: bool) -> Vec<&'static str> {
    if high_accuracy {
        vec![ADMM_HIGH, ADMM_POLISH_HIGH, CLARABEL_HIGH]
    } else {
        vec![ADMM, ADMM_POLISH, CLARABEL]
    }
}
