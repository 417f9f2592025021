use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BenchError;

/// Canonical outcome of a solve attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Optimal,
    MaxIterReached,
    PrimalInfeasible,
    DualInfeasible,
    TimeLimit,
    SolverError,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Optimal,
        Status::MaxIterReached,
        Status::PrimalInfeasible,
        Status::DualInfeasible,
        Status::TimeLimit,
        Status::SolverError,
    ];

    /// Statuses for which the returned x/y are meaningful
    pub fn is_solution_present(self) -> bool {
        matches!(self, Status::Optimal | Status::MaxIterReached)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Optimal => "OPTIMAL",
            Status::MaxIterReached => "MAX_ITER_REACHED",
            Status::PrimalInfeasible => "PRIMAL_INFEASIBLE",
            Status::DualInfeasible => "DUAL_INFEASIBLE",
            Status::TimeLimit => "TIME_LIMIT",
            Status::SolverError => "SOLVER_ERROR",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| BenchError::Parse(format!("unknown status '{}'", s)))
    }
}

/// Outcome of the optional post-solve polishing step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolishStatus {
    Successful,
    Unsuccessful,
    NotPerformed,
}

impl PolishStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PolishStatus::Successful => "successful",
            PolishStatus::Unsuccessful => "unsuccessful",
            PolishStatus::NotPerformed => "not_performed",
        }
    }
}

impl fmt::Display for PolishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolishStatus {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "successful" => Ok(PolishStatus::Successful),
            "unsuccessful" => Ok(PolishStatus::Unsuccessful),
            "not_performed" => Ok(PolishStatus::NotPerformed),
            other => Err(BenchError::Parse(format!("unknown polish status '{}'", other))),
        }
    }
}
