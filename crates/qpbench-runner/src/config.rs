use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use qpbench_types::{standard_solvers, BenchError, Result, SolverSettings};

/// Settings of one benchmark run, built once and shared by reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Root of all result files
    pub output_dir: PathBuf,

    /// Fan task units out on the worker pool
    pub parallel: bool,

    /// Requested worker count, capped by the machine
    pub desired_parallelism: usize,

    /// Use the `_high` solver identities
    pub high_accuracy: bool,

    /// Suffix unit file names with the settings fingerprint
    pub fingerprint_cache: bool,

    /// Let engines print their own progress
    pub verbose: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("results"),
            parallel: false,
            desired_parallelism: available_parallelism(),
            high_accuracy: false,
            fingerprint_cache: false,
            verbose: false,
        }
    }
}

impl RunConfig {
    /// Load from JSON; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| BenchError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&text)
            .map_err(|e| BenchError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_desired_parallelism(mut self, workers: usize) -> Self {
        self.desired_parallelism = workers;
        self
    }

    pub fn with_high_accuracy(mut self, high_accuracy: bool) -> Self {
        self.high_accuracy = high_accuracy;
        self
    }

    pub fn with_fingerprint_cache(mut self, fingerprint_cache: bool) -> Self {
        self.fingerprint_cache = fingerprint_cache;
        self
    }

    /// min(desired, available), never below one
    pub fn pool_size(&self) -> usize {
        self.desired_parallelism.min(available_parallelism()).max(1)
    }

    /// Output folder of a benchmark family, e.g. "benchmark_problems_high_accuracy"
    pub fn set_name(&self, base: &str) -> String {
        if self.high_accuracy {
            format!("{}_high_accuracy", base)
        } else {
            base.to_string()
        }
    }

    /// Settings of the standard solver identities for this run's accuracy tier
    pub fn standard_settings(&self) -> Result<Vec<SolverSettings>> {
        standard_solvers(self.high_accuracy)
            .into_iter()
            .map(|solver| self.settings_for(solver))
            .collect()
    }

    /// Preset for `solver` with the run's verbosity applied
    pub fn settings_for(&self, solver: &str) -> Result<SolverSettings> {
        Ok(SolverSettings::preset(solver)?.with_verbose(self.verbose))
    }
}

fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("results"));
        assert!(!config.parallel);
        assert!(!config.fingerprint_cache);
        assert!(config.pool_size() >= 1);
    }

    #[test]
    fn test_pool_size_bounds() {
        assert_eq!(RunConfig::default().with_desired_parallelism(0).pool_size(), 1);
        assert_eq!(RunConfig::default().with_desired_parallelism(1).pool_size(), 1);
        let huge = RunConfig::default().with_desired_parallelism(100_000);
        assert_eq!(huge.pool_size(), available_parallelism());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        fs::write(&path, r#"{ "parallel": true, "high_accuracy": true }"#).unwrap();

        let config = RunConfig::from_json_file(&path).unwrap();
        assert!(config.parallel);
        assert!(config.high_accuracy);
        assert_eq!(config.output_dir, PathBuf::from("results"));
        assert_eq!(config.set_name("qplib_problems"), "qplib_problems_high_accuracy");
    }

    #[test]
    fn test_bad_json_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        fs::write(&path, "{ parallel: yes").unwrap();
        assert!(matches!(RunConfig::from_json_file(&path), Err(BenchError::Config(_))));
        assert!(matches!(
            RunConfig::from_json_file(&dir.path().join("missing.json")),
            Err(BenchError::Config(_))
        ));
    }

    #[test]
    fn test_standard_settings_follow_tier() {
        let low = RunConfig::default().standard_settings().unwrap();
        let high = RunConfig::default().with_high_accuracy(true).standard_settings().unwrap();
        assert_eq!(low.len(), 3);
        assert!(high.iter().all(|s| s.solver.ends_with("_high")));
    }
}
