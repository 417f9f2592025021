use std::time::Instant;

use clarabel::algebra::CscMatrix;
use clarabel::solver::{DefaultSettings, DefaultSolver, IPSolver, SupportedConeT};
use nalgebra::DMatrix;
use qpbench_types::{Result, SolverSettings, Status};

use crate::backend::{Capabilities, RawSolution, SolverBackend};
use crate::qp_model::QpModel;

const STATUS_MAP: &[(&str, Status)] = &[
    ("Solved", Status::Optimal),
    ("MaxIterations", Status::MaxIterReached),
    ("PrimalInfeasible", Status::PrimalInfeasible),
    ("DualInfeasible", Status::DualInfeasible),
    ("MaxTime", Status::TimeLimit),
];

/// How one row of l <= Ax <= u was expanded into Clarabel cone rows
#[derive(Debug, Clone, Copy, PartialEq)]
enum RowSplit {
    /// l_i = u_i, one zero-cone row
    Equality(usize),
    /// Indices of the lower (-A_i) and upper (A_i) nonnegative rows
    Inequality { lower: Option<usize>, upper: Option<usize> },
}

/// Clarabel interior-point engine (pure Rust)
pub struct ClarabelSolver;

impl ClarabelSolver {
    pub fn new() -> Self {
        ClarabelSolver
    }
}

impl Default for ClarabelSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverBackend for ClarabelSolver {
    fn name(&self) -> &'static str {
        "clarabel"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            supports_concurrent_execution: true,
            native_time_limit: true,
            reports_polish: false,
            reports_phase_timings: true,
        }
    }

    fn status_map(&self) -> &'static [(&'static str, Status)] {
        STATUS_MAP
    }

    fn solve_qp(&self, model: &QpModel, settings: &SolverSettings) -> Result<RawSolution> {
        model.validate()?;

        let setup_start = Instant::now();
        let (l, u) = model.normalized_bounds();
        let m = model.num_constraints();

        // Clarabel format: Ax + s = b, s in K.
        //   equality      A_i x + s = u_i,   s in {0}
        //   lower bound  -A_i x + s = -l_i,  s >= 0
        //   upper bound   A_i x + s = u_i,   s >= 0
        let mut b = Vec::with_capacity(2 * m);
        let mut cones = Vec::with_capacity(2 * m);
        let mut rows: Vec<(usize, f64)> = Vec::with_capacity(2 * m);
        let mut splits = Vec::with_capacity(m);

        for i in 0..m {
            let (li, ui) = (l[i], u[i]);
            if li.is_finite() && li == ui {
                splits.push(RowSplit::Equality(b.len()));
                rows.push((i, 1.0));
                b.push(ui);
                cones.push(SupportedConeT::ZeroConeT(1));
                continue;
            }

            let lower = li.is_finite().then(|| {
                rows.push((i, -1.0));
                b.push(-li);
                cones.push(SupportedConeT::NonnegativeConeT(1));
                b.len() - 1
            });
            let upper = ui.is_finite().then(|| {
                rows.push((i, 1.0));
                b.push(ui);
                cones.push(SupportedConeT::NonnegativeConeT(1));
                b.len() - 1
            });
            splits.push(RowSplit::Inequality { lower, upper });
        }

        let p_csc = to_clarabel_csc_upper(&model.p);
        let a_ext_csc = to_clarabel_csc(&build_extended_a(&model.a, &rows));

        let mut clarabel_settings = DefaultSettings::default();
        clarabel_settings.verbose = settings.verbose;
        clarabel_settings.max_iter = settings.max_iter;
        clarabel_settings.tol_gap_abs = settings.eps_abs;
        clarabel_settings.tol_gap_rel = settings.eps_rel;
        clarabel_settings.tol_feas = settings.eps_abs;
        clarabel_settings.time_limit = settings.time_limit.unwrap_or(f64::INFINITY);

        let mut solver = DefaultSolver::new(
            &p_csc,
            model.q.as_slice(),
            &a_ext_csc,
            &b,
            &cones,
            clarabel_settings,
        );
        let setup_time = setup_start.elapsed().as_secs_f64();

        let solve_start = Instant::now();
        solver.solve();
        let solve_time = solve_start.elapsed().as_secs_f64();

        let status_code = format!("{:?}", solver.solution.status);
        let z = &solver.solution.z;

        // y_i = z_upper - z_lower recovers the l <= Ax <= u multiplier
        let y: Vec<f64> = splits
            .iter()
            .map(|split| match *split {
                RowSplit::Equality(k) => z[k],
                RowSplit::Inequality { lower, upper } => {
                    upper.map(|k| z[k]).unwrap_or(0.0) - lower.map(|k| z[k]).unwrap_or(0.0)
                }
            })
            .collect();

        Ok(RawSolution {
            status_code,
            x: Some(solver.solution.x.clone()),
            y: Some(y),
            obj_val: Some(solver.solution.obj_val),
            run_time: setup_time + solve_time,
            iterations: solver.info.iterations as u64,
            setup_time: Some(setup_time),
            solve_time: Some(solve_time),
            dual_obj_val: Some(solver.info.cost_dual),
            duality_gap: Some(solver.info.gap_abs),
            ..RawSolution::default()
        })
    }
}

/// Convert DMatrix to Clarabel CSC format (upper triangle only for P)
fn to_clarabel_csc_upper(mat: &DMatrix<f64>) -> CscMatrix<f64> {
    let mut colptr = vec![0];
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();

    for col in 0..mat.ncols() {
        for row in 0..=col.min(mat.nrows().saturating_sub(1)) {
            let val = mat[(row, col)];
            if val != 0.0 {
                rowval.push(row);
                nzval.push(val);
            }
        }
        colptr.push(nzval.len());
    }

    CscMatrix {
        m: mat.nrows(),
        n: mat.ncols(),
        colptr,
        rowval,
        nzval,
    }
}

/// Convert DMatrix to Clarabel CSC format (full matrix)
fn to_clarabel_csc(mat: &DMatrix<f64>) -> CscMatrix<f64> {
    let mut colptr = vec![0];
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();

    for col in 0..mat.ncols() {
        for row in 0..mat.nrows() {
            let val = mat[(row, col)];
            if val != 0.0 {
                rowval.push(row);
                nzval.push(val);
            }
        }
        colptr.push(nzval.len());
    }

    CscMatrix {
        m: mat.nrows(),
        n: mat.ncols(),
        colptr,
        rowval,
        nzval,
    }
}

/// Stack `sign * A_i` for every (i, sign) cone row
fn build_extended_a(a: &DMatrix<f64>, rows: &[(usize, f64)]) -> DMatrix<f64> {
    let mut a_ext = DMatrix::zeros(rows.len(), a.ncols());
    for (k, &(i, sign)) in rows.iter().enumerate() {
        for j in 0..a.ncols() {
            a_ext[(k, j)] = sign * a[(i, j)];
        }
    }
    a_ext
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DVector;
    use qpbench_types::CLARABEL_HIGH;

    fn settings() -> SolverSettings {
        SolverSettings::preset(CLARABEL_HIGH).unwrap()
    }

    #[test]
    fn test_simple_qp() {
        // Minimize: 0.5 * x^T [[2,0],[0,2]] x + [1,1]^T x
        // Subject to: x >= 0
        // Solution: x = [0, 0]
        let p = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 2.0]);
        let q = DVector::from_vec(vec![1.0, 1.0]);
        let a = DMatrix::identity(2, 2);
        let l = DVector::from_element(2, 0.0);
        let u = DVector::from_element(2, f64::INFINITY);

        let model = QpModel::new(p, q, a, l, u);
        let solution = ClarabelSolver::new().solve_qp(&model, &settings()).unwrap();

        assert_eq!(solution.status_code, "Solved");
        let x = solution.x.unwrap();
        assert!(x[0].abs() < 1e-4, "x[0] = {}", x[0]);
        assert!(x[1].abs() < 1e-4, "x[1] = {}", x[1]);

        // Both lower bounds active with multiplier -1 (y = z_upper - z_lower)
        let y = solution.y.unwrap();
        assert!((y[0] + 1.0).abs() < 1e-4, "y[0] = {}", y[0]);
        assert!((y[1] + 1.0).abs() < 1e-4, "y[1] = {}", y[1]);
    }

    #[test]
    fn test_equality_row() {
        // Minimize: 0.5 * (x0^2 + x1^2) subject to x0 + x1 = 1
        let p = DMatrix::identity(2, 2);
        let q = DVector::from_element(2, 0.0);
        let a = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        let l = DVector::from_element(1, 1.0);
        let u = DVector::from_element(1, 1.0);

        let model = QpModel::new(p, q, a, l, u);
        let solution = ClarabelSolver::new().solve_qp(&model, &settings()).unwrap();

        assert_eq!(solution.status_code, "Solved");
        let x = solution.x.unwrap();
        assert!((x[0] - 0.5).abs() < 1e-4);
        assert!((x[1] - 0.5).abs() < 1e-4);
        assert!((solution.y.unwrap()[0] + 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_infeasible_qp() {
        // x >= 1 and x <= 0 on separate rows
        let p = DMatrix::identity(1, 1);
        let q = DVector::from_element(1, 0.0);
        let a = DMatrix::from_row_slice(2, 1, &[1.0, 1.0]);
        let l = DVector::from_vec(vec![1.0, f64::NEG_INFINITY]);
        let u = DVector::from_vec(vec![f64::INFINITY, 0.0]);

        let model = QpModel::new(p, q, a, l, u);
        let solution = ClarabelSolver::new().solve_qp(&model, &settings()).unwrap();

        assert_eq!(solution.status_code, "PrimalInfeasible");
        assert_eq!(
            ClarabelSolver::new().map_status(&solution.status_code),
            Status::PrimalInfeasible
        );
    }
}
