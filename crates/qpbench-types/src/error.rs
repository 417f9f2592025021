use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("Invalid instance: {0}")]
    InvalidInstance(String),

    #[error("Unknown solver: {0}")]
    UnknownSolver(String),

    #[error("Problem not found: {0}")]
    ProblemNotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Task failed for solver {solver} on {problem}: {source}")]
    TaskFailed {
        solver: String,
        problem: String,
        #[source]
        source: Box<BenchError>,
    },
}

impl BenchError {
    /// Wrap an error with the solver/problem pair that produced it
    pub fn task_failed(solver: impl Into<String>, problem: impl Into<String>, source: BenchError) -> Self {
        BenchError::TaskFailed {
            solver: solver.into(),
            problem: problem.into(),
            source: Box::new(source),
        }
    }
}

impl From<serde_json::Error> for BenchError {
    fn from(e: serde_json::Error) -> Self {
        BenchError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
