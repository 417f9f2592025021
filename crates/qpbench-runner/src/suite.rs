use std::path::Path;

use serde::{Deserialize, Serialize};

use qpbench_problems::{discover_qplib, gen_int_log_space, ProblemClass};
use qpbench_types::Result;

use crate::task::ProblemSpec;

/// Random families swept over dimensions, `n_instances` seeds per dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParametricSet {
    pub name: String,
    /// Classes in run order, each with its dimensions in run order
    pub classes: Vec<(ProblemClass, Vec<usize>)>,
    pub n_instances: u64,
}

impl ParametricSet {
    pub fn new(name: impl Into<String>, n_instances: u64) -> Self {
        ParametricSet {
            name: name.into(),
            classes: Vec::new(),
            n_instances,
        }
    }

    pub fn with_class(mut self, class: ProblemClass, dimensions: Vec<usize>) -> Self {
        self.classes.push((class, dimensions));
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Every family, each with `n_dim` log-spaced dimensions over its range
    pub fn standard(n_dim: usize, n_instances: u64) -> Self {
        ProblemClass::ALL
            .iter()
            .fold(Self::new("benchmark_problems", n_instances), |set, &class| {
                let (min, limit) = class.dimension_range();
                set.with_class(class, gen_int_log_space(min, limit, n_dim))
            })
    }

    /// Number of task units per solver
    pub fn unit_count(&self) -> usize {
        self.classes.iter().map(|(_, dims)| dims.len()).sum()
    }
}

/// Fixed list of named problems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSet {
    pub name: String,
    pub problems: Vec<ProblemSpec>,
}

impl NamedSet {
    pub fn new(name: impl Into<String>, problems: Vec<ProblemSpec>) -> Self {
        NamedSet {
            name: name.into(),
            problems,
        }
    }

    /// One problem per `*.qplib` file in `dir`, sorted by name
    pub fn from_qplib_dir(name: impl Into<String>, dir: &Path) -> Result<Self> {
        let problems = discover_qplib(dir)?
            .into_iter()
            .map(|file| ProblemSpec::named(file.name, file.path))
            .collect();
        Ok(Self::new(name, problems))
    }
}
