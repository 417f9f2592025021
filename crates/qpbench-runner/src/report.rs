use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How a task unit was satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitOutcome {
    /// Result file already existed and was reused
    Cached,
    /// Solved in this run and written to disk
    Computed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitReport {
    pub solver: String,
    /// Class and dimension, or problem name
    pub unit: String,
    pub outcome: UnitOutcome,
    pub records: usize,
}

/// What a run did, unit by unit, in enumeration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub set_name: String,
    pub set_dir: PathBuf,
    pub units: Vec<UnitReport>,
    /// Aggregate table written for each solver, in solver order
    pub results: Vec<(String, PathBuf)>,
}

impl RunReport {
    pub fn new(set_name: impl Into<String>, set_dir: PathBuf) -> Self {
        RunReport {
            set_name: set_name.into(),
            set_dir,
            units: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn count(&self, outcome: UnitOutcome) -> usize {
        self.units.iter().filter(|u| u.outcome == outcome).count()
    }

    pub fn cached(&self) -> usize {
        self.count(UnitOutcome::Cached)
    }

    pub fn computed(&self) -> usize {
        self.count(UnitOutcome::Computed)
    }

    /// Outcomes of one solver's units
    pub fn outcomes_for(&self, solver: &str) -> Vec<(&str, UnitOutcome)> {
        self.units
            .iter()
            .filter(|u| u.solver == solver)
            .map(|u| (u.unit.as_str(), u.outcome))
            .collect()
    }

    pub fn results_file(&self, solver: &str) -> Option<&PathBuf> {
        self.results
            .iter()
            .find(|(s, _)| s == solver)
            .map(|(_, path)| path)
    }
}
