use std::time::Instant;

use nalgebra::{Cholesky, DMatrix, DVector, Dyn};
use qpbench_types::{PolishStatus, Result, SolverSettings, Status};
use tracing::debug;

use crate::backend::{Capabilities, RawSolution, SolverBackend};
use crate::qp_model::QpModel;

const STATUS_MAP: &[(&str, Status)] = &[
    ("solved", Status::Optimal),
    ("maximum_iterations_reached", Status::MaxIterReached),
    ("primal_infeasible", Status::PrimalInfeasible),
    ("dual_infeasible", Status::DualInfeasible),
];

const RHO_MIN: f64 = 1e-6;
const RHO_MAX: f64 = 1e6;
/// Equality rows get a stiffer penalty
const RHO_EQ_SCALE: f64 = 1e3;
/// Rows with |u - l| below this count as equalities
const RHO_EQ_TOL: f64 = 1e-4;
/// Refactor only when the suggested rho moves by more than this factor
const RHO_ADAPT_FACTOR: f64 = 5.0;
const DIVISION_TOL: f64 = 1e-20;

/// Operator-splitting (ADMM) QP engine
///
/// Solves `min 0.5 x'Px + q'x s.t. l <= Ax <= u` by alternating a cached
/// linear solve with a projection onto the box `[l, u]`. Rho is adapted from
/// the ratio of primal to dual residuals, and a converged solution can be
/// polished by solving the equality-constrained KKT system on the guessed
/// active set.
pub struct AdmmSolver {
    sigma: f64,
    alpha: f64,
    check_interval: u32,
    eps_prim_inf: f64,
    eps_dual_inf: f64,
    polish_delta: f64,
    polish_refine_iter: usize,
}

impl AdmmSolver {
    pub fn new() -> Self {
        AdmmSolver {
            sigma: 1e-6,
            alpha: 1.6,
            check_interval: 25,
            eps_prim_inf: 1e-4,
            eps_dual_inf: 1e-4,
            polish_delta: 1e-6,
            polish_refine_iter: 3,
        }
    }

    pub fn with_params(sigma: f64, alpha: f64, check_interval: u32) -> Self {
        AdmmSolver {
            sigma,
            alpha,
            check_interval: check_interval.max(1),
            ..Self::new()
        }
    }

    fn rho_vector(&self, l: &DVector<f64>, u: &DVector<f64>, rho: f64) -> DVector<f64> {
        DVector::from_fn(l.len(), |i, _| {
            if !l[i].is_finite() && !u[i].is_finite() {
                RHO_MIN
            } else if (u[i] - l[i]).abs() < RHO_EQ_TOL {
                (RHO_EQ_SCALE * rho).min(RHO_MAX)
            } else {
                rho
            }
        })
    }

    /// Factor `P + sigma I + A' diag(rho) A`
    fn factorize(&self, model: &QpModel, rho: &DVector<f64>) -> Option<Cholesky<f64, Dyn>> {
        let n = model.num_vars();
        let scaled_a = DMatrix::from_fn(model.num_constraints(), n, |i, j| rho[i] * model.a[(i, j)]);
        let kkt = &model.p + DMatrix::identity(n, n) * self.sigma + model.a.transpose() * scaled_a;
        Cholesky::new(kkt)
    }

    fn is_primal_infeasible(
        &self,
        model: &QpModel,
        l: &DVector<f64>,
        u: &DVector<f64>,
        dy: &DVector<f64>,
    ) -> bool {
        let norm = inf_norm(dy);
        if norm <= DIVISION_TOL {
            return false;
        }
        let dy = dy / norm;

        let mut support = 0.0;
        for i in 0..dy.len() {
            if dy[i] > 0.0 {
                if !u[i].is_finite() {
                    if dy[i] > self.eps_prim_inf {
                        return false;
                    }
                    continue;
                }
                support += u[i] * dy[i];
            } else if dy[i] < 0.0 {
                if !l[i].is_finite() {
                    if dy[i] < -self.eps_prim_inf {
                        return false;
                    }
                    continue;
                }
                support += l[i] * dy[i];
            }
        }

        support < 0.0 && inf_norm(&(model.a.transpose() * dy)) < self.eps_prim_inf
    }

    fn is_dual_infeasible(
        &self,
        model: &QpModel,
        l: &DVector<f64>,
        u: &DVector<f64>,
        dx: &DVector<f64>,
    ) -> bool {
        let norm = inf_norm(dx);
        if norm <= DIVISION_TOL {
            return false;
        }
        let dx = dx / norm;

        if model.q.dot(&dx) >= -self.eps_dual_inf {
            return false;
        }
        if inf_norm(&(&model.p * &dx)) > self.eps_dual_inf {
            return false;
        }

        let adx = &model.a * &dx;
        (0..adx.len()).all(|i| {
            let lower_ok = !l[i].is_finite() || adx[i] >= -self.eps_dual_inf;
            let upper_ok = !u[i].is_finite() || adx[i] <= self.eps_dual_inf;
            lower_ok && upper_ok
        })
    }

    /// Solve the reduced KKT system on the active set guessed from (z, y)
    fn polish(
        &self,
        model: &QpModel,
        l: &DVector<f64>,
        u: &DVector<f64>,
        iterate: &Iterate,
        admm_residuals: &Residuals,
    ) -> (PolishStatus, Option<(DVector<f64>, DVector<f64>)>) {
        let n = model.num_vars();
        let m = model.num_constraints();

        let mut active: Vec<(usize, f64)> = Vec::new();
        for i in 0..m {
            let (z, y) = (iterate.z[i], iterate.y[i]);
            if l[i].is_finite() && z - l[i] < -y {
                active.push((i, l[i]));
            } else if u[i].is_finite() && u[i] - z < y {
                active.push((i, u[i]));
            }
        }

        let k = n + active.len();
        let mut kkt = DMatrix::zeros(k, k);
        kkt.view_mut((0, 0), (n, n)).copy_from(&model.p);
        for (r, &(row, _)) in active.iter().enumerate() {
            for j in 0..n {
                let a = model.a[(row, j)];
                kkt[(n + r, j)] = a;
                kkt[(j, n + r)] = a;
            }
        }

        let mut rhs = DVector::zeros(k);
        for j in 0..n {
            rhs[j] = -model.q[j];
        }
        for (r, &(_, target)) in active.iter().enumerate() {
            rhs[n + r] = target;
        }

        let mut regularized = kkt.clone();
        for j in 0..n {
            regularized[(j, j)] += self.polish_delta;
        }
        for r in n..k {
            regularized[(r, r)] -= self.polish_delta;
        }

        let lu = regularized.lu();
        let Some(mut sol) = lu.solve(&rhs) else {
            debug!(active = active.len(), "polish KKT system is singular");
            return (PolishStatus::Unsuccessful, None);
        };
        for _ in 0..self.polish_refine_iter {
            let residual = &rhs - &kkt * &sol;
            match lu.solve(&residual) {
                Some(step) => sol += step,
                None => break,
            }
        }

        let x = sol.rows(0, n).into_owned();
        let mut y = DVector::zeros(m);
        for (r, &(row, _)) in active.iter().enumerate() {
            y[row] = sol[n + r];
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return (PolishStatus::Unsuccessful, None);
        }

        let ax = &model.a * &x;
        let z = DVector::from_fn(m, |i, _| ax[i].clamp(l[i], u[i]));
        let polished = Residuals::compute(model, &x, &z, &y);

        let improved = (polished.prim < admm_residuals.prim && polished.dual < admm_residuals.dual)
            || (polished.prim < admm_residuals.prim && polished.dual < 1e-10)
            || (polished.dual < admm_residuals.dual && polished.prim < 1e-10);

        debug!(
            active = active.len(),
            prim = polished.prim,
            dual = polished.dual,
            improved,
            "polish finished"
        );

        if improved {
            (PolishStatus::Successful, Some((x, y)))
        } else {
            (PolishStatus::Unsuccessful, None)
        }
    }
}

impl Default for AdmmSolver {
    fn default() -> Self {
        Self::new()
    }
}

struct Iterate {
    x: DVector<f64>,
    z: DVector<f64>,
    y: DVector<f64>,
}

#[derive(Debug, Clone, Copy)]
struct Residuals {
    prim: f64,
    dual: f64,
    prim_scale: f64,
    dual_scale: f64,
}

impl Residuals {
    fn compute(model: &QpModel, x: &DVector<f64>, z: &DVector<f64>, y: &DVector<f64>) -> Self {
        let ax = &model.a * x;
        let px = &model.p * x;
        let aty = model.a.transpose() * y;

        Residuals {
            prim: inf_norm(&(&ax - z)),
            dual: inf_norm(&(&px + &model.q + &aty)),
            prim_scale: inf_norm(&ax).max(inf_norm(z)),
            dual_scale: inf_norm(&px).max(inf_norm(&aty)).max(inf_norm(&model.q)),
        }
    }

    fn converged(&self, eps_abs: f64, eps_rel: f64) -> bool {
        self.prim <= eps_abs + eps_rel * self.prim_scale
            && self.dual <= eps_abs + eps_rel * self.dual_scale
    }

    /// rho balancing the normalized primal and dual residuals
    fn suggest_rho(&self, rho: f64) -> f64 {
        let prim = self.prim / (self.prim_scale + DIVISION_TOL);
        let dual = self.dual / (self.dual_scale + DIVISION_TOL);
        (rho * (prim / (dual + DIVISION_TOL)).sqrt()).clamp(RHO_MIN, RHO_MAX)
    }
}

impl SolverBackend for AdmmSolver {
    fn name(&self) -> &'static str {
        "admm"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            supports_concurrent_execution: true,
            native_time_limit: false,
            reports_polish: true,
            reports_phase_timings: true,
        }
    }

    fn status_map(&self) -> &'static [(&'static str, Status)] {
        STATUS_MAP
    }

    fn solve_qp(&self, model: &QpModel, settings: &SolverSettings) -> Result<RawSolution> {
        model.validate()?;

        let n = model.num_vars();
        let m = model.num_constraints();

        let setup_start = Instant::now();
        let (l, u) = model.normalized_bounds();
        let mut rho = settings.rho.clamp(RHO_MIN, RHO_MAX);
        let mut rho_vec = self.rho_vector(&l, &u, rho);
        let Some(mut factor) = self.factorize(model, &rho_vec) else {
            debug!("KKT matrix is not positive definite");
            return Ok(RawSolution {
                status_code: "non_convex".to_string(),
                run_time: setup_start.elapsed().as_secs_f64(),
                ..RawSolution::default()
            });
        };
        let at = model.a.transpose();
        let setup_time = setup_start.elapsed().as_secs_f64();

        let solve_start = Instant::now();
        let mut it = Iterate {
            x: DVector::zeros(n),
            z: DVector::zeros(m),
            y: DVector::zeros(m),
        };
        let mut status_code = "maximum_iterations_reached";
        let mut iterations = 0u64;
        let mut rho_updates = 0u64;
        let mut update_time = 0.0;
        let mut residuals = Residuals::compute(model, &it.x, &it.z, &it.y);

        for iter in 1..=settings.max_iter {
            iterations = iter as u64;
            let x_prev = it.x.clone();
            let y_prev = it.y.clone();

            let rhs = &it.x * self.sigma - &model.q + &at * (rho_vec.component_mul(&it.z) - &it.y);
            let x_tilde = factor.solve(&rhs);
            let z_tilde = &model.a * &x_tilde;

            it.x = &x_tilde * self.alpha + &x_prev * (1.0 - self.alpha);
            let z_relaxed = &z_tilde * self.alpha + &it.z * (1.0 - self.alpha);
            let z_next =
                DVector::from_fn(m, |i, _| (z_relaxed[i] + it.y[i] / rho_vec[i]).clamp(l[i], u[i]));
            it.y = &it.y + (z_relaxed - &z_next).component_mul(&rho_vec);
            it.z = z_next;

            if it.x.iter().any(|v| !v.is_finite()) {
                status_code = "numerical_error";
                break;
            }

            if iter % self.check_interval != 0 && iter != settings.max_iter {
                continue;
            }

            residuals = Residuals::compute(model, &it.x, &it.z, &it.y);
            if residuals.converged(settings.eps_abs, settings.eps_rel) {
                status_code = "solved";
                break;
            }
            if self.is_primal_infeasible(model, &l, &u, &(&it.y - &y_prev)) {
                status_code = "primal_infeasible";
                break;
            }
            if self.is_dual_infeasible(model, &l, &u, &(&it.x - &x_prev)) {
                status_code = "dual_infeasible";
                break;
            }

            let suggested = residuals.suggest_rho(rho);
            if suggested > rho * RHO_ADAPT_FACTOR || suggested < rho / RHO_ADAPT_FACTOR {
                let update_start = Instant::now();
                let next_vec = self.rho_vector(&l, &u, suggested);
                if let Some(next) = self.factorize(model, &next_vec) {
                    debug!(iter, from = rho, to = suggested, "rho updated");
                    factor = next;
                    rho = suggested;
                    rho_vec = next_vec;
                    rho_updates += 1;
                }
                update_time += update_start.elapsed().as_secs_f64();
            }
        }
        let solve_time = solve_start.elapsed().as_secs_f64();

        let polish_start = Instant::now();
        let status_polish = if settings.polish && status_code == "solved" {
            let (status, polished) = self.polish(model, &l, &u, &it, &residuals);
            if let Some((x, y)) = polished {
                it.x = x;
                it.y = y;
            }
            status
        } else {
            PolishStatus::NotPerformed
        };
        let polish_time = polish_start.elapsed().as_secs_f64();

        let solution_present = matches!(status_code, "solved" | "maximum_iterations_reached");
        let obj_val = solution_present
            .then(|| 0.5 * it.x.dot(&(&model.p * &it.x)) + model.q.dot(&it.x));

        debug!(status = status_code, iterations, rho_updates, "admm finished");

        Ok(RawSolution {
            status_code: status_code.to_string(),
            x: solution_present.then(|| it.x.as_slice().to_vec()),
            y: solution_present.then(|| it.y.as_slice().to_vec()),
            obj_val,
            run_time: setup_time + solve_time + polish_time,
            iterations,
            status_polish: Some(status_polish),
            setup_time: Some(setup_time),
            solve_time: Some(solve_time),
            update_time: Some(update_time),
            rho_updates: Some(rho_updates),
            ..RawSolution::default()
        })
    }
}

fn inf_norm(v: &DVector<f64>) -> f64 {
    v.iter().fold(0.0, |acc: f64, x| acc.max(x.abs()))
}
