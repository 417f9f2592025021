// Task, report and runner wiring tests

#[cfg(test)]
mod tests {
    use crate::*;
    use qpbench_problems::ProblemClass;
    use qpbench_solver::SolverRegistry;
    use qpbench_types::{BenchError, SolverSettings, Status, ADMM, CLARABEL, CLARABEL_HIGH};
    use std::path::PathBuf;

    #[test]
    fn test_run_task_fills_record() {
        let registry = SolverRegistry::with_defaults();
        let settings = SolverSettings::preset(CLARABEL_HIGH).unwrap();
        let spec = ProblemSpec::Parametric {
            class: ProblemClass::Lasso,
            dimension: 4,
            instance: 2,
        };

        let record = run_task(&spec, &settings, &registry).unwrap();

        assert_eq!(record.problem, "Lasso");
        assert_eq!(record.solver, CLARABEL_HIGH);
        assert_eq!(record.dimension, Some(4));
        assert_eq!(record.instance, Some(2));
        assert_eq!(record.status, Status::Optimal);
        assert!(record.obj_val.is_some());

        let model = spec.materialize().unwrap();
        assert_eq!(record.n, model.num_vars());
        assert_eq!(record.m, model.num_constraints());
        assert_eq!(record.nnz, model.nnz());
    }

    #[test]
    fn test_run_task_unknown_engine() {
        let registry = SolverRegistry::with_defaults();
        let settings = SolverSettings::new("GUROBI", "gurobi", qpbench_types::Accuracy::Low);
        let spec = ProblemSpec::Parametric {
            class: ProblemClass::RandomQp,
            dimension: 3,
            instance: 0,
        };

        assert!(matches!(
            run_task(&spec, &settings, &registry),
            Err(BenchError::UnknownSolver(engine)) if engine == "gurobi"
        ));
    }

    #[test]
    fn test_run_task_missing_named_problem() {
        let registry = SolverRegistry::with_defaults();
        let settings = SolverSettings::preset(ADMM).unwrap();
        let spec = ProblemSpec::named("QPLIB_0000", "/nonexistent/QPLIB_0000.qplib");

        assert!(matches!(
            run_task(&spec, &settings, &registry),
            Err(BenchError::ProblemNotFound(_))
        ));
    }

    #[test]
    fn test_spec_display_and_problem_column() {
        let spec = ProblemSpec::Parametric {
            class: ProblemClass::EqQp,
            dimension: 10,
            instance: 3,
        };
        assert_eq!(spec.problem(), "Eq QP");
        assert_eq!(spec.to_string(), "Eq QP n=10 instance=3");

        let named = ProblemSpec::named("QPLIB_8790", "qplib/QPLIB_8790.qplib");
        assert_eq!(named.problem(), "QPLIB_8790");
        assert_eq!(named.to_string(), "QPLIB_8790");
    }

    #[test]
    fn test_report_counts() {
        let mut report = RunReport::new("set", PathBuf::from("results/set"));
        for (unit, outcome) in [("a", UnitOutcome::Cached), ("b", UnitOutcome::Computed), ("c", UnitOutcome::Computed)] {
            report.units.push(UnitReport {
                solver: ADMM.to_string(),
                unit: unit.to_string(),
                outcome,
                records: 1,
            });
        }
        report.results.push((ADMM.to_string(), PathBuf::from("results/set/ADMM/results.csv")));

        assert_eq!(report.cached(), 1);
        assert_eq!(report.computed(), 2);
        assert_eq!(report.outcomes_for(ADMM)[0], ("a", UnitOutcome::Cached));
        assert!(report.outcomes_for(CLARABEL).is_empty());
        assert_eq!(
            report.results_file(ADMM),
            Some(&PathBuf::from("results/set/ADMM/results.csv"))
        );
        assert_eq!(report.results_file(CLARABEL), None);
    }

    #[test]
    fn test_runner_rejects_unknown_engine_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig::default().with_output_dir(dir.path());
        let runner = BenchmarkRunner::new(config, SolverRegistry::with_defaults()).unwrap();
        let set = ParametricSet::new("set", 1).with_class(ProblemClass::RandomQp, vec![3]);
        let settings = SolverSettings::new("NOPE", "nope", qpbench_types::Accuracy::Low);

        assert!(matches!(
            runner.run_parametric(&set, &[settings]),
            Err(BenchError::UnknownSolver(_))
        ));
        assert!(!dir.path().join("set").exists());
    }
}
