use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use qpbench_solver::QpModel;
use qpbench_types::{BenchError, Result};

use crate::class::ProblemClass;

/// Data points per feature for Lasso and Huber fits
pub const DATA_POINTS_PER_FEATURE: usize = 10;
/// Assets per risk factor in Portfolio
pub const ASSETS_PER_FACTOR: usize = 10;
/// Prediction horizon of Control
pub const CONTROL_HORIZON: usize = 10;

/// Fill-in probability of random sparse matrices
const DENSITY: f64 = 0.15;

/// Seeded generator for the random problem families
pub struct ProblemGenerator {
    seed: u64,
}

impl ProblemGenerator {
    pub fn new() -> Self {
        ProblemGenerator { seed: 1 }
    }

    pub fn with_seed(seed: u64) -> Self {
        ProblemGenerator { seed }
    }

    /// Build one instance of `class` at leading dimension `dimension`
    ///
    /// The same `(class, dimension, seed)` always yields the same instance.
    pub fn generate(&self, class: ProblemClass, dimension: usize) -> Result<QpModel> {
        if dimension == 0 {
            return Err(BenchError::InvalidInstance(format!(
                "{} needs a positive dimension",
                class
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let model = match class {
            ProblemClass::RandomQp => random_qp(&mut rng, dimension),
            ProblemClass::EqQp => eq_qp(&mut rng, dimension),
            ProblemClass::Portfolio => portfolio(&mut rng, dimension),
            ProblemClass::Lasso => lasso(&mut rng, dimension),
            ProblemClass::Huber => huber(&mut rng, dimension),
            ProblemClass::Control => control(&mut rng, dimension),
            ProblemClass::Svm => svm(&mut rng, dimension),
        };

        debug!(
            class = %class,
            dimension,
            seed = self.seed,
            n = model.num_vars(),
            m = model.num_constraints(),
            "generated instance"
        );
        Ok(model)
    }
}

impl Default for ProblemGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Instance `seed` of `class` at `dimension`
pub fn generate(class: ProblemClass, dimension: usize, seed: u64) -> Result<QpModel> {
    ProblemGenerator::with_seed(seed).generate(class, dimension)
}

/// minimize 0.5 x'Px + q'x  s.t.  l <= Ax <= u, with m = 10n random rows
fn random_qp(rng: &mut StdRng, n: usize) -> QpModel {
    let m = 10 * n;
    let p = random_pd(rng, n);
    let q = randn_vec(rng, n);
    let a = sprandn(rng, m, n, DENSITY);
    let l = DVector::from_fn(m, |_, _| -rng.random::<f64>());
    let u = DVector::from_fn(m, |_, _| rng.random::<f64>());
    QpModel::new(p, q, a, l, u)
}

/// minimize 0.5 x'Px + q'x  s.t.  Ax = b, with b = A x0 feasible
fn eq_qp(rng: &mut StdRng, n: usize) -> QpModel {
    let m = n.div_ceil(2);
    let p = random_pd(rng, n);
    let q = randn_vec(rng, n);
    let a = sprandn(rng, m, n, DENSITY);
    let x0 = randn_vec(rng, n);
    let b = &a * x0;
    QpModel::new(p, q, a, b.clone(), b)
}

/// Factor-model portfolio with `k` factors
///
/// minimize x'Dx + y'y - mu'x  s.t.  1'x = 1, F'x = y, 0 <= x <= 1
fn portfolio(rng: &mut StdRng, k: usize) -> QpModel {
    let n = ASSETS_PER_FACTOR * k;
    let f = sprandn(rng, n, k, 0.5);
    let d = DVector::from_fn(n, |_, _| rng.random::<f64>() * (k as f64).sqrt());
    let mu = randn_vec(rng, n);

    let nv = n + k;
    let mut p = DMatrix::zeros(nv, nv);
    for i in 0..n {
        p[(i, i)] = 2.0 * d[i];
    }
    set_identity(&mut p, n, n, k, 2.0);

    let mut q = DVector::zeros(nv);
    q.rows_mut(0, n).copy_from(&(-mu));

    let m = 1 + k + n;
    let mut a = DMatrix::zeros(m, nv);
    a.view_mut((0, 0), (1, n)).fill(1.0);
    set_block(&mut a, 1, 0, &f.transpose());
    set_identity(&mut a, 1, n, k, -1.0);
    set_identity(&mut a, 1 + k, 0, n, 1.0);

    let mut l = DVector::zeros(m);
    let mut u = DVector::zeros(m);
    l[0] = 1.0;
    u[0] = 1.0;
    u.rows_mut(1 + k, n).fill(1.0);

    QpModel::new(p, q, a, l, u)
}

/// minimize y'y + lambda 1't  s.t.  y = Ad x - b, -t <= x <= t
fn lasso(rng: &mut StdRng, n: usize) -> QpModel {
    let m = DATA_POINTS_PER_FEATURE * n;
    let ad = sprandn(rng, m, n, DENSITY);
    let scale = (n as f64).sqrt();
    let x_true = DVector::from_fn(n, |_, _| {
        let keep = rng.random::<f64>() > 0.5;
        let value = randn(rng) / scale;
        if keep {
            value
        } else {
            0.0
        }
    });
    let bd = &ad * x_true + randn_vec(rng, m);
    let lambda = 0.2 * (ad.transpose() * &bd).amax();

    // Variables (x, y, t)
    let nv = 2 * n + m;
    let mut p = DMatrix::zeros(nv, nv);
    set_identity(&mut p, n, n, m, 2.0);

    let mut q = DVector::zeros(nv);
    q.rows_mut(n + m, n).fill(lambda);

    let rows = m + 2 * n;
    let mut a = DMatrix::zeros(rows, nv);
    set_block(&mut a, 0, 0, &ad);
    set_identity(&mut a, 0, n, m, -1.0);
    set_identity(&mut a, m, 0, n, 1.0);
    set_identity(&mut a, m, n + m, n, -1.0);
    set_identity(&mut a, m + n, 0, n, 1.0);
    set_identity(&mut a, m + n, n + m, n, 1.0);

    let mut l = DVector::zeros(rows);
    let mut u = DVector::zeros(rows);
    l.rows_mut(0, m).copy_from(&bd);
    u.rows_mut(0, m).copy_from(&bd);
    l.rows_mut(m, n).fill(f64::NEG_INFINITY);
    u.rows_mut(m + n, n).fill(f64::INFINITY);

    QpModel::new(p, q, a, l, u)
}

/// Huber fitting with 5% outliers
///
/// minimize 0.5 z'z + 1'(r + s)  s.t.  Ad x - b - z = r - s, r >= 0, s >= 0
fn huber(rng: &mut StdRng, n: usize) -> QpModel {
    let m = DATA_POINTS_PER_FEATURE * n;
    let ad = sprandn(rng, m, n, DENSITY);
    let scale = (n as f64).sqrt();
    let x_true = DVector::from_fn(n, |_, _| randn(rng) / scale);
    let clean = &ad * x_true;
    let bd = DVector::from_fn(m, |i, _| {
        if rng.random::<f64>() < 0.95 {
            clean[i] + 0.5 * randn(rng)
        } else {
            clean[i] + 10.0 * rng.random::<f64>()
        }
    });

    // Variables (x, z, r, s)
    let nv = n + 3 * m;
    let mut p = DMatrix::zeros(nv, nv);
    set_identity(&mut p, n, n, m, 1.0);

    let mut q = DVector::zeros(nv);
    q.rows_mut(n + m, 2 * m).fill(1.0);

    let rows = 3 * m;
    let mut a = DMatrix::zeros(rows, nv);
    set_block(&mut a, 0, 0, &ad);
    set_identity(&mut a, 0, n, m, -1.0);
    set_identity(&mut a, 0, n + m, m, -1.0);
    set_identity(&mut a, 0, n + 2 * m, m, 1.0);
    set_identity(&mut a, m, n + m, 2 * m, 1.0);

    let mut l = DVector::zeros(rows);
    let mut u = DVector::from_element(rows, f64::INFINITY);
    l.rows_mut(0, m).copy_from(&bd);
    u.rows_mut(0, m).copy_from(&bd);

    QpModel::new(p, q, a, l, u)
}

/// Finite-horizon linear MPC with `nx` states and `nx / 2` inputs
///
/// minimize sum x_t'Qx_t + u_t'Ru_t  s.t.  x_{t+1} = A x_t + B u_t, x_0 given, |u_t| <= 1
fn control(rng: &mut StdRng, nx: usize) -> QpModel {
    let nu = (nx / 2).max(1);
    let horizon = CONTROL_HORIZON;

    let dynamics = DMatrix::identity(nx, nx) + sprandn(rng, nx, nx, DENSITY) * 0.1;
    let input = sprandn(rng, nx, nu, DENSITY);
    let state_cost = DVector::from_fn(nx, |_, _| rng.random::<f64>());
    let x0 = DVector::from_fn(nx, |_, _| 2.0 * rng.random::<f64>() - 1.0);
    let input_cost = 0.1;
    let input_bound = 1.0;

    // Variables (x_0..x_T, u_0..u_{T-1})
    let states = (horizon + 1) * nx;
    let nv = states + horizon * nu;
    let mut p = DMatrix::zeros(nv, nv);
    for t in 0..=horizon {
        for i in 0..nx {
            p[(t * nx + i, t * nx + i)] = 2.0 * state_cost[i];
        }
    }
    set_identity(&mut p, states, states, horizon * nu, 2.0 * input_cost);
    let q = DVector::zeros(nv);

    let m = states + horizon * nu;
    let mut a = DMatrix::zeros(m, nv);
    set_identity(&mut a, 0, 0, nx, -1.0);
    for t in 0..horizon {
        let row = (t + 1) * nx;
        set_block(&mut a, row, t * nx, &dynamics);
        set_identity(&mut a, row, (t + 1) * nx, nx, -1.0);
        set_block(&mut a, row, states + t * nu, &input);
    }
    set_identity(&mut a, states, states, horizon * nu, 1.0);

    let mut l = DVector::zeros(m);
    let mut u = DVector::zeros(m);
    l.rows_mut(0, nx).copy_from(&(-&x0));
    u.rows_mut(0, nx).copy_from(&(-&x0));
    l.rows_mut(states, horizon * nu).fill(-input_bound);
    u.rows_mut(states, horizon * nu).fill(input_bound);

    QpModel::new(p, q, a, l, u)
}

/// Hinge-loss support vector machine on two shifted point clouds
///
/// minimize x'x + lambda 1't  s.t.  t >= diag(b) Ad x + 1, t >= 0
fn svm(rng: &mut StdRng, n: usize) -> QpModel {
    let m = DATA_POINTS_PER_FEATURE * n;
    let half = m / 2;
    let lambda = 1.0;
    let scale = (n as f64).sqrt();

    // Rows of the first half lean towards +1/n, the rest towards -1/n
    let raw = sprandn(rng, m, n, DENSITY);
    let ad = DMatrix::from_fn(m, n, |i, j| {
        let v = raw[(i, j)];
        if v == 0.0 {
            0.0
        } else if i < half {
            v / scale + 1.0 / n as f64
        } else {
            v / scale - 1.0 / n as f64
        }
    });
    let b = DVector::from_fn(m, |i, _| if i < half { 1.0 } else { -1.0 });

    // Variables (x, t)
    let nv = n + m;
    let mut p = DMatrix::zeros(nv, nv);
    set_identity(&mut p, 0, 0, n, 2.0);

    let mut q = DVector::zeros(nv);
    q.rows_mut(n, m).fill(lambda);

    // t - diag(b) Ad x >= 1 and t >= 0
    let rows = 2 * m;
    let mut a = DMatrix::zeros(rows, nv);
    let signed = DMatrix::from_fn(m, n, |i, j| -b[i] * ad[(i, j)]);
    set_block(&mut a, 0, 0, &signed);
    set_identity(&mut a, 0, n, m, 1.0);
    set_identity(&mut a, m, n, m, 1.0);

    let mut l = DVector::zeros(rows);
    l.rows_mut(0, m).fill(1.0);
    let u = DVector::from_element(rows, f64::INFINITY);

    QpModel::new(p, q, a, l, u)
}

/// M M' + 1e-2 I with sparse random M
fn random_pd(rng: &mut StdRng, n: usize) -> DMatrix<f64> {
    let factor = sprandn(rng, n, n, DENSITY);
    let product = &factor * factor.transpose();
    (&product + product.transpose()) * 0.5 + DMatrix::identity(n, n) * 1e-2
}

/// Standard normal sample (Box-Muller)
fn randn(rng: &mut StdRng) -> f64 {
    let u1 = 1.0 - rng.random::<f64>();
    let u2 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

fn randn_vec(rng: &mut StdRng, n: usize) -> DVector<f64> {
    DVector::from_fn(n, |_, _| randn(rng))
}

/// Matrix whose entries are N(0, 1) with probability `density`, else zero
fn sprandn(rng: &mut StdRng, rows: usize, cols: usize, density: f64) -> DMatrix<f64> {
    DMatrix::from_fn(rows, cols, |_, _| {
        if rng.random_bool(density) {
            randn(rng)
        } else {
            0.0
        }
    })
}

fn set_block(target: &mut DMatrix<f64>, row: usize, col: usize, block: &DMatrix<f64>) {
    target.view_mut((row, col), block.shape()).copy_from(block);
}

fn set_identity(target: &mut DMatrix<f64>, row: usize, col: usize, size: usize, value: f64) {
    for i in 0..size {
        target[(row + i, col + i)] = value;
    }
}
