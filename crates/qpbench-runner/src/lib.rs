mod config;
mod task;
mod cache;
mod pool;
mod suite;
mod report;
mod runner;

pub use config::RunConfig;
pub use task::{run_task, ProblemSpec};
pub use cache::{load_cached, CacheLayout, UnitKey, FINGERPRINT_PREFIX_LEN};
pub use pool::WorkerPool;
pub use suite::{NamedSet, ParametricSet};
pub use report::{RunReport, UnitOutcome, UnitReport};
pub use runner::BenchmarkRunner;

#[cfg(test)]
mod tests;
