mod qp_model;
mod backend;
mod optimality;
mod adapter;
mod registry;
mod admm_backend;
mod clarabel_backend;

pub use qp_model::{ObjectiveSense, QpModel, INFINITY_THRESHOLD};
pub use backend::{Capabilities, RawSolution, SolverBackend};
pub use optimality::is_qp_solution_optimal;
pub use adapter::{SolveOutcome, SolverAdapter};
pub use registry::SolverRegistry;
pub use admm_backend::AdmmSolver;
pub use clarabel_backend::ClarabelSolver;
