use std::time::Instant;

use tracing::{debug, info};

use qpbench_solver::SolverRegistry;
use qpbench_types::{BenchError, ResultRecord, ResultTable, Result, SolverSettings};

use crate::cache::{load_cached, CacheLayout, UnitKey};
use crate::config::RunConfig;
use crate::pool::WorkerPool;
use crate::report::{RunReport, UnitOutcome, UnitReport};
use crate::suite::{NamedSet, ParametricSet};
use crate::task::{run_task, ProblemSpec};

/// Drives every task unit of a benchmark set, solver by solver
///
/// Each unit's table is cached on disk; a unit whose file already exists is
/// read back instead of solved, so an interrupted run resumes where it
/// stopped. Merged tables follow enumeration order.
pub struct BenchmarkRunner {
    config: RunConfig,
    registry: SolverRegistry,
    pool: WorkerPool,
}

impl BenchmarkRunner {
    pub fn new(config: RunConfig, registry: SolverRegistry) -> Result<Self> {
        let pool = WorkerPool::new(config.pool_size())?;
        Ok(Self {
            config,
            registry,
            pool,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn registry(&self) -> &SolverRegistry {
        &self.registry
    }

    /// Run a parametric set for every solver in order
    pub fn run_parametric(&self, set: &ParametricSet, solvers: &[SolverSettings]) -> Result<RunReport> {
        let layout = CacheLayout::new(&self.config.output_dir, &set.name);
        let mut report = RunReport::new(&set.name, layout.set_dir().to_path_buf());

        info!(
            set = %set.name,
            solvers = solvers.len(),
            units = set.unit_count(),
            instances = set.n_instances,
            "running parametric set"
        );

        for settings in solvers {
            let parallel = self.parallel_for(settings)?;
            let fingerprint = self.fingerprint(settings)?;
            let solver = settings.solver.as_str();
            let started = Instant::now();

            let mut class_tables = Vec::with_capacity(set.classes.len());
            for (class, dimensions) in &set.classes {
                let mut unit_tables = Vec::with_capacity(dimensions.len());

                for &dimension in dimensions {
                    let unit = UnitKey::Parametric {
                        class: *class,
                        dimension,
                    };
                    let path = layout.unit_file(solver, &unit, fingerprint.as_deref());

                    let (table, outcome) = match load_cached(&path)
                        .map_err(|e| BenchError::task_failed(solver, unit.to_string(), e))?
                    {
                        Some(table) => (table, UnitOutcome::Cached),
                        None => {
                            let specs: Vec<ProblemSpec> = (0..set.n_instances)
                                .map(|instance| ProblemSpec::Parametric {
                                    class: *class,
                                    dimension,
                                    instance,
                                })
                                .collect();
                            let results = self
                                .pool
                                .map(&specs, parallel, |spec| run_task(spec, settings, &self.registry));
                            let records = collect_records(solver, &specs, results)?;

                            let table = ResultTable::new(records);
                            table.write_csv(&path)?;
                            (table, UnitOutcome::Computed)
                        }
                    };

                    debug!(solver, unit = %unit, ?outcome, records = table.len(), "unit done");
                    report.units.push(UnitReport {
                        solver: solver.to_string(),
                        unit: unit.to_string(),
                        outcome,
                        records: table.len(),
                    });
                    unit_tables.push(table);
                }

                let class_table = ResultTable::concat(unit_tables);
                class_table.write_csv(&layout.class_file(solver, *class))?;
                class_tables.push(class_table);
            }

            let merged = ResultTable::concat(class_tables);
            let results_file = layout.results_file(solver);
            merged.write_csv(&results_file)?;

            info!(
                solver,
                records = merged.len(),
                elapsed_s = started.elapsed().as_secs_f64(),
                "solver finished"
            );
            report.results.push((solver.to_string(), results_file));
        }

        Ok(report)
    }

    /// Run a named set for every solver in order
    ///
    /// Pending problems fan out on the pool; each unit file is written as
    /// soon as its solve completes.
    pub fn run_named(&self, set: &NamedSet, solvers: &[SolverSettings]) -> Result<RunReport> {
        let layout = CacheLayout::new(&self.config.output_dir, &set.name);
        let mut report = RunReport::new(&set.name, layout.set_dir().to_path_buf());

        info!(
            set = %set.name,
            solvers = solvers.len(),
            problems = set.problems.len(),
            "running named set"
        );

        for settings in solvers {
            let parallel = self.parallel_for(settings)?;
            let fingerprint = self.fingerprint(settings)?;
            let solver = settings.solver.as_str();
            let started = Instant::now();

            let mut tables: Vec<Option<ResultTable>> = Vec::with_capacity(set.problems.len());
            let mut pending = Vec::new();
            for (index, spec) in set.problems.iter().enumerate() {
                let unit = UnitKey::Named {
                    name: spec.problem().to_string(),
                };
                let path = layout.unit_file(solver, &unit, fingerprint.as_deref());
                let cached = load_cached(&path)
                    .map_err(|e| BenchError::task_failed(solver, spec.to_string(), e))?;
                if cached.is_none() {
                    pending.push((index, spec, path));
                }
                tables.push(cached);
            }

            let computed = self.pool.map(&pending, parallel, |(_, spec, path)| {
                let record = run_task(spec, settings, &self.registry)?;
                let table = ResultTable::new(vec![record]);
                table.write_csv(path)?;
                Ok::<_, BenchError>(table)
            });

            for ((index, spec, _), result) in pending.iter().zip(computed) {
                let table = result.map_err(|e| BenchError::task_failed(solver, spec.to_string(), e))?;
                tables[*index] = Some(table);
            }

            let pending_indices: Vec<usize> = pending.iter().map(|(index, _, _)| *index).collect();
            let mut ordered = Vec::with_capacity(tables.len());
            for (index, (spec, table)) in set.problems.iter().zip(tables).enumerate() {
                let table = table.ok_or_else(|| {
                    BenchError::task_failed(solver, spec.to_string(), BenchError::Engine("unit produced no table".to_string()))
                })?;
                let outcome = if pending_indices.contains(&index) {
                    UnitOutcome::Computed
                } else {
                    UnitOutcome::Cached
                };
                report.units.push(UnitReport {
                    solver: solver.to_string(),
                    unit: spec.to_string(),
                    outcome,
                    records: table.len(),
                });
                ordered.push(table);
            }

            let merged = ResultTable::concat(ordered);
            let results_file = layout.results_file(solver);
            merged.write_csv(&results_file)?;

            info!(
                solver,
                records = merged.len(),
                computed = pending.len(),
                elapsed_s = started.elapsed().as_secs_f64(),
                "solver finished"
            );
            report.results.push((solver.to_string(), results_file));
        }

        Ok(report)
    }

    /// Parallel only when the run asks for it and the engine tolerates it
    fn parallel_for(&self, settings: &SolverSettings) -> Result<bool> {
        let capabilities = self.registry.adapter(settings)?.capabilities();
        if self.config.parallel && !capabilities.supports_concurrent_execution {
            info!(solver = %settings.solver, "engine not safe for concurrent use, running serially");
        }
        Ok(self.config.parallel && capabilities.supports_concurrent_execution)
    }

    fn fingerprint(&self, settings: &SolverSettings) -> Result<Option<String>> {
        if !self.config.fingerprint_cache {
            return Ok(None);
        }
        Ok(Some(settings.fingerprint()?))
    }
}

/// Records in task order, or the first failure in task order
fn collect_records(
    solver: &str,
    specs: &[ProblemSpec],
    results: Vec<Result<ResultRecord>>,
) -> Result<Vec<ResultRecord>> {
    specs
        .iter()
        .zip(results)
        .map(|(spec, result)| result.map_err(|e| BenchError::task_failed(solver, spec.to_string(), e)))
        .collect()
}
