use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use qpbench_types::BenchError;

/// Randomly generated problem families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProblemClass {
    #[serde(rename = "Random QP")]
    RandomQp,
    #[serde(rename = "Eq QP")]
    EqQp,
    Portfolio,
    Lasso,
    Huber,
    Control,
    #[serde(rename = "SVM")]
    Svm,
}

impl ProblemClass {
    pub const ALL: [ProblemClass; 7] = [
        ProblemClass::RandomQp,
        ProblemClass::EqQp,
        ProblemClass::Portfolio,
        ProblemClass::Lasso,
        ProblemClass::Huber,
        ProblemClass::Control,
        ProblemClass::Svm,
    ];

    /// Name used in result tables and output directories
    pub fn name(self) -> &'static str {
        match self {
            ProblemClass::RandomQp => "Random QP",
            ProblemClass::EqQp => "Eq QP",
            ProblemClass::Portfolio => "Portfolio",
            ProblemClass::Lasso => "Lasso",
            ProblemClass::Huber => "Huber",
            ProblemClass::Control => "Control",
            ProblemClass::Svm => "SVM",
        }
    }

    /// `(min, limit)` of the dimension sweep in the standard suite
    ///
    /// Instances are stored densely, so the largest ones stay in the low
    /// thousands of variables and rows.
    pub fn dimension_range(self) -> (usize, usize) {
        match self {
            ProblemClass::RandomQp | ProblemClass::EqQp => (10, 400),
            ProblemClass::Portfolio => (5, 50),
            ProblemClass::Lasso | ProblemClass::Huber | ProblemClass::Svm => (10, 100),
            ProblemClass::Control => (10, 50),
        }
    }
}

impl fmt::Display for ProblemClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProblemClass {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProblemClass::ALL
            .iter()
            .copied()
            .find(|class| class.name() == s)
            .ok_or_else(|| BenchError::ProblemNotFound(format!("unknown problem class: {}", s)))
    }
}
