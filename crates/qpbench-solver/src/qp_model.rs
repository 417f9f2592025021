use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use qpbench_types::{BenchError, Result};

/// Bounds at or beyond this magnitude are treated as infinite
pub const INFINITY_THRESHOLD: f64 = 9e19;

/// Direction of the original objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveSense {
    Minimize,
    /// Stored negated: P, q and the offset describe `minimize -f(x)`
    Maximize,
}

/// QP model in standard form:
/// minimize 0.5 * x^T P x + q^T x + r
/// subject to l <= A x <= u
#[derive(Debug, Clone)]
pub struct QpModel {
    /// Hessian matrix P (symmetric PSD)
    pub p: DMatrix<f64>,
    /// Linear term q
    pub q: DVector<f64>,
    /// Constraint matrix A
    pub a: DMatrix<f64>,
    /// Lower bounds l
    pub l: DVector<f64>,
    /// Upper bounds u
    pub u: DVector<f64>,
    /// Constant objective term r
    pub offset: f64,
    pub sense: ObjectiveSense,
    /// Known optimal objective, in the original sense
    pub reference_objective: Option<f64>,
}

impl QpModel {
    /// Create a new minimization model without offset
    pub fn new(
        p: DMatrix<f64>,
        q: DVector<f64>,
        a: DMatrix<f64>,
        l: DVector<f64>,
        u: DVector<f64>,
    ) -> Self {
        QpModel {
            p,
            q,
            a,
            l,
            u,
            offset: 0.0,
            sense: ObjectiveSense::Minimize,
            reference_objective: None,
        }
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_sense(mut self, sense: ObjectiveSense) -> Self {
        self.sense = sense;
        self
    }

    pub fn with_reference_objective(mut self, objective: f64) -> Self {
        self.reference_objective = Some(objective);
        self
    }

    /// Get number of variables
    pub fn num_vars(&self) -> usize {
        self.q.len()
    }

    /// Get number of constraints
    pub fn num_constraints(&self) -> usize {
        self.l.len()
    }

    /// nnz(P) + nnz(A)
    pub fn nnz(&self) -> usize {
        count_nonzeros(&self.p) + count_nonzeros(&self.a)
    }

    /// Objective value in the original sense for a solver-reported value
    pub fn original_objective(&self, solver_objective: f64) -> f64 {
        let objective = solver_objective + self.offset;
        match self.sense {
            ObjectiveSense::Minimize => objective,
            ObjectiveSense::Maximize => -objective,
        }
    }

    /// Validate model dimensions and bound ordering
    pub fn validate(&self) -> Result<()> {
        let n = self.num_vars();
        let m = self.num_constraints();

        if self.p.nrows() != n || self.p.ncols() != n {
            return Err(BenchError::InvalidInstance(format!(
                "P must be {}x{}, got {}x{}",
                n,
                n,
                self.p.nrows(),
                self.p.ncols()
            )));
        }

        if self.a.nrows() != m || self.a.ncols() != n {
            return Err(BenchError::InvalidInstance(format!(
                "A must be {}x{}, got {}x{}",
                m,
                n,
                self.a.nrows(),
                self.a.ncols()
            )));
        }

        if self.u.len() != m {
            return Err(BenchError::InvalidInstance(format!(
                "u length {} != l length {}",
                self.u.len(),
                m
            )));
        }

        if let Some(i) = (0..m).find(|&i| self.l[i] > self.u[i]) {
            return Err(BenchError::InvalidInstance(format!(
                "l[{}] = {} exceeds u[{}] = {}",
                i, self.l[i], i, self.u[i]
            )));
        }

        Ok(())
    }

    /// Bounds with `|v| > 9e19` replaced by infinities
    pub fn normalized_bounds(&self) -> (DVector<f64>, DVector<f64>) {
        let clamp = |v: f64| {
            if v > INFINITY_THRESHOLD {
                f64::INFINITY
            } else if v < -INFINITY_THRESHOLD {
                f64::NEG_INFINITY
            } else {
                v
            }
        };
        (self.l.map(clamp), self.u.map(clamp))
    }
}

fn count_nonzeros(mat: &DMatrix<f64>) -> usize {
    mat.iter().filter(|v| **v != 0.0).count()
}
