use nalgebra::DVector;
use qpbench_types::Accuracy;
use tracing::debug;

use crate::qp_model::QpModel;

/// Check a primal/dual pair against the residual criteria at `accuracy`
///
/// Bounds beyond `INFINITY_THRESHOLD` are treated as infinite, so they drop
/// out of the primal residual and the support-function term of the gap.
pub fn is_qp_solution_optimal(model: &QpModel, x: &[f64], y: &[f64], accuracy: Accuracy) -> bool {
    let eps_abs = accuracy.eps();
    let eps_rel = accuracy.eps();

    let n = model.num_vars();
    let m = model.num_constraints();
    if x.len() != n || y.len() != m {
        debug!(
            x_len = x.len(),
            y_len = y.len(),
            n,
            m,
            "solution dimensions do not match the instance"
        );
        return false;
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        debug!("solution contains non-finite entries");
        return false;
    }

    let x = DVector::from_column_slice(x);
    let y = DVector::from_column_slice(y);
    let (l, u) = model.normalized_bounds();

    let ax = &model.a * &x;
    let px = &model.p * &x;
    let aty = model.a.transpose() * &y;

    // Primal: distance of Ax from [l, u]
    let primal = (0..m)
        .map(|i| {
            if ax[i] < l[i] {
                l[i] - ax[i]
            } else if ax[i] > u[i] {
                ax[i] - u[i]
            } else {
                0.0
            }
        })
        .fold(0.0, f64::max);
    let primal_tol = eps_abs + eps_rel * inf_norm(&ax);
    if primal > primal_tol {
        debug!(residual = primal, tolerance = primal_tol, "primal residual too large");
        return false;
    }

    let dual = inf_norm(&(&px + &model.q + &aty));
    let dual_tol = eps_abs + eps_rel * inf_norm(&px).max(inf_norm(&model.q)).max(inf_norm(&aty));
    if dual > dual_tol {
        debug!(residual = dual, tolerance = dual_tol, "dual residual too large");
        return false;
    }

    // Support function of [l, u] at y, finite bounds only
    let support: f64 = (0..m)
        .map(|i| {
            let upper = if u[i].is_finite() { u[i] * y[i].max(0.0) } else { 0.0 };
            let lower = if l[i].is_finite() { l[i] * y[i].min(0.0) } else { 0.0 };
            upper + lower
        })
        .sum();
    let xpx = x.dot(&px);
    let qx = model.q.dot(&x);
    let gap = (xpx + qx + support).abs();
    let gap_tol = eps_abs + eps_rel * xpx.abs().max(qx.abs()).max(support.abs());
    if gap > gap_tol {
        debug!(gap, tolerance = gap_tol, "duality gap too large");
        return false;
    }

    true
}

fn inf_norm(v: &DVector<f64>) -> f64 {
    v.iter().fold(0.0, |acc: f64, x| acc.max(x.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    fn box_qp() -> QpModel {
        // minimize (x-1)^2 subject to 0 <= x <= 0.5, optimum x = 0.5, y = 1
        QpModel::new(
            DMatrix::from_element(1, 1, 2.0),
            DVector::from_element(1, -2.0),
            DMatrix::identity(1, 1),
            DVector::from_element(1, 0.0),
            DVector::from_element(1, 0.5),
        )
    }

    #[test]
    fn test_exact_solution_passes() {
        assert!(is_qp_solution_optimal(&box_qp(), &[0.5], &[1.0], Accuracy::High));
    }

    #[test]
    fn test_primal_violation_fails() {
        assert!(!is_qp_solution_optimal(&box_qp(), &[0.6], &[0.8], Accuracy::High));
    }

    #[test]
    fn test_wrong_multiplier_fails_dual() {
        assert!(!is_qp_solution_optimal(&box_qp(), &[0.5], &[0.0], Accuracy::High));
    }

    #[test]
    fn test_tolerance_tier() {
        // Dual residual 5e-4 passes at 1e-3 but not at 1e-6
        assert!(is_qp_solution_optimal(&box_qp(), &[0.5], &[1.0005], Accuracy::Low));
        assert!(!is_qp_solution_optimal(&box_qp(), &[0.5], &[1.0005], Accuracy::High));
    }

    #[test]
    fn test_dimension_mismatch_fails() {
        assert!(!is_qp_solution_optimal(&box_qp(), &[0.5, 0.0], &[1.0], Accuracy::Low));
        assert!(!is_qp_solution_optimal(&box_qp(), &[0.5], &[], Accuracy::Low));
    }

    #[test]
    fn test_large_bounds_are_infinite() {
        // minimize 0.5 x^2 with -1e20 <= x <= 1e20: bounds drop out of the gap
        let model = QpModel::new(
            DMatrix::identity(1, 1),
            DVector::from_element(1, 0.0),
            DMatrix::identity(1, 1),
            DVector::from_element(1, -1e20),
            DVector::from_element(1, 1e20),
        );
        assert!(is_qp_solution_optimal(&model, &[0.0], &[0.0], Accuracy::High));
    }
}
