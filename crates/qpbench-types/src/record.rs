use serde::{Deserialize, Serialize};

use crate::status::{PolishStatus, Status};

/// Fields only some engine families report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverExtras {
    pub status_polish: Option<PolishStatus>,
    pub setup_time: Option<f64>,
    pub solve_time: Option<f64>,
    pub update_time: Option<f64>,
    pub rho_updates: Option<u64>,
    pub dual_obj_val: Option<f64>,
    pub duality_gap: Option<f64>,
    pub restarts: Option<u64>,
}

/// One solve of one problem by one solver identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Problem class ("Portfolio") or problem name ("QPLIB_8790")
    pub problem: String,
    pub dimension: Option<usize>,
    pub instance: Option<u64>,
    pub solver: String,
    pub status: Status,
    /// Seconds
    pub run_time: f64,
    pub iter: u64,
    pub obj_val: Option<f64>,
    pub n: usize,
    pub m: usize,
    /// nnz(P) + nnz(A)
    pub nnz: usize,
    pub extras: SolverExtras,
}

/// Identity of the problem a record belongs to, independent of the solver
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProblemKey {
    pub problem: String,
    pub dimension: Option<usize>,
    pub instance: Option<u64>,
}

impl std::fmt::Display for ProblemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.problem)?;
        if let Some(n) = self.dimension {
            write!(f, " n={}", n)?;
        }
        if let Some(i) = self.instance {
            write!(f, " instance={}", i)?;
        }
        Ok(())
    }
}

impl ResultRecord {
    pub fn key(&self) -> ProblemKey {
        ProblemKey {
            problem: self.problem.clone(),
            dimension: self.dimension,
            instance: self.instance,
        }
    }

    pub fn is_solution_present(&self) -> bool {
        self.status.is_solution_present()
    }
}
