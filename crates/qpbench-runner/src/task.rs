use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use qpbench_problems::{generate, load_qplib, ProblemClass};
use qpbench_solver::{QpModel, SolverRegistry};
use qpbench_types::{ResultRecord, Result, SolverSettings};

/// Identity of one problem instance and how to build it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProblemSpec {
    /// Instance `instance` (the generator seed) of a random family
    Parametric {
        class: ProblemClass,
        dimension: usize,
        instance: u64,
    },
    /// Problem loaded from a QPLIB file
    Named { name: String, path: PathBuf },
}

impl ProblemSpec {
    pub fn named(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        ProblemSpec::Named {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Value of the `problem` column
    pub fn problem(&self) -> &str {
        match self {
            ProblemSpec::Parametric { class, .. } => class.name(),
            ProblemSpec::Named { name, .. } => name,
        }
    }

    pub fn materialize(&self) -> Result<QpModel> {
        match self {
            ProblemSpec::Parametric {
                class,
                dimension,
                instance,
            } => generate(*class, *dimension, *instance),
            ProblemSpec::Named { path, .. } => load_qplib(path),
        }
    }
}

impl fmt::Display for ProblemSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemSpec::Parametric {
                class,
                dimension,
                instance,
            } => write!(f, "{} n={} instance={}", class, dimension, instance),
            ProblemSpec::Named { name, .. } => f.write_str(name),
        }
    }
}

/// Build, solve and record one problem with one solver identity
///
/// Shares no mutable state with other calls, so units can run on any worker.
pub fn run_task(
    spec: &ProblemSpec,
    settings: &SolverSettings,
    registry: &SolverRegistry,
) -> Result<ResultRecord> {
    let model = spec.materialize()?;
    let adapter = registry.adapter(settings)?;

    debug!(solver = %settings.solver, problem = %spec, "solving");
    let outcome = adapter.solve(&model)?;

    let (dimension, instance) = match spec {
        ProblemSpec::Parametric {
            dimension,
            instance,
            ..
        } => (Some(*dimension), Some(*instance)),
        ProblemSpec::Named { .. } => (None, None),
    };

    Ok(ResultRecord {
        problem: spec.problem().to_string(),
        dimension,
        instance,
        solver: settings.solver.clone(),
        status: outcome.status,
        run_time: outcome.run_time,
        iter: outcome.iterations,
        obj_val: outcome.obj_val.map(|obj| model.original_objective(obj)),
        n: model.num_vars(),
        m: model.num_constraints(),
        nnz: model.nnz(),
        extras: outcome.extras,
    })
}
