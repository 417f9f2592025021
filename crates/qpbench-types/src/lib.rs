mod error;
mod status;
mod settings;
mod record;
mod table;
mod hashing;

pub use error::{BenchError, Result};
pub use status::{Status, PolishStatus};
pub use settings::{
    standard_solvers, Accuracy, SolverSettings, ADMM, ADMM_HIGH, ADMM_POLISH, ADMM_POLISH_HIGH,
    CLARABEL, CLARABEL_HIGH, EPS_HIGH, EPS_LOW, TIME_LIMIT,
};
pub use record::{ProblemKey, ResultRecord, SolverExtras};
pub use table::{Column, ResultTable};
pub use hashing::{compute_hash, compute_json_hash, Fingerprint};

#[cfg(test)]
mod tests;
