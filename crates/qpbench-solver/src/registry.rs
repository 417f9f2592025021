use std::collections::BTreeMap;
use std::sync::Arc;

use qpbench_types::{BenchError, Result, SolverSettings};
use tracing::debug;

use crate::adapter::SolverAdapter;
use crate::admm_backend::AdmmSolver;
use crate::backend::SolverBackend;
use crate::clarabel_backend::ClarabelSolver;

/// Engines available to a run, keyed by `SolverBackend::name`
#[derive(Clone, Default)]
pub struct SolverRegistry {
    engines: BTreeMap<String, Arc<dyn SolverBackend>>,
}

impl SolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in `clarabel` and `admm` engines
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ClarabelSolver::new()));
        registry.register(Arc::new(AdmmSolver::new()));
        registry
    }

    /// Add an engine, replacing any engine registered under the same name
    pub fn register(&mut self, backend: Arc<dyn SolverBackend>) {
        debug!(engine = backend.name(), "registering engine");
        self.engines.insert(backend.name().to_string(), backend);
    }

    pub fn get(&self, engine: &str) -> Option<Arc<dyn SolverBackend>> {
        self.engines.get(engine).cloned()
    }

    pub fn engines(&self) -> impl Iterator<Item = &str> {
        self.engines.keys().map(String::as_str)
    }

    /// Bind settings to their engine
    pub fn adapter(&self, settings: &SolverSettings) -> Result<SolverAdapter> {
        let backend = self
            .get(&settings.engine)
            .ok_or_else(|| BenchError::UnknownSolver(settings.engine.clone()))?;
        Ok(SolverAdapter::new(backend, settings.clone()))
    }
}

impl std::fmt::Debug for SolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.engines.keys()).finish()
    }
}
