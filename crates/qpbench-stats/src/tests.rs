// Aggregation tests

#[cfg(test)]
mod tests {
    use crate::*;
    use proptest::prelude::*;
    use qpbench_types::{
        BenchError, PolishStatus, ResultRecord, ResultTable, SolverExtras, Status, ADMM,
        ADMM_POLISH, CLARABEL,
    };
    use std::fs;

    fn record(solver: &str, problem: usize, status: Status, run_time: f64) -> ResultRecord {
        ResultRecord {
            problem: "Random QP".to_string(),
            dimension: Some(10),
            instance: Some(problem as u64),
            solver: solver.to_string(),
            status,
            run_time,
            iter: 10,
            obj_val: status.is_solution_present().then_some(1.0),
            n: 10,
            m: 100,
            nnz: 160,
            extras: SolverExtras::default(),
        }
    }

    fn table(solver: &str, runs: &[(Status, f64)]) -> SolverTable {
        let records = runs
            .iter()
            .enumerate()
            .map(|(p, &(status, t))| record(solver, p, status, t))
            .collect();
        (solver.to_string(), ResultTable::new(records))
    }

    /// A always optimal; B times out on the last problem
    fn scenario_ab() -> Vec<SolverTable> {
        vec![
            table("A", &[(Status::Optimal, 1.0), (Status::Optimal, 2.0), (Status::Optimal, 4.0)]),
            table(
                "B",
                &[(Status::Optimal, 1.0), (Status::Optimal, 2.0), (Status::TimeLimit, 1000.0)],
            ),
        ]
    }

    #[test]
    fn test_failure_rates_scenario() {
        let rates = failure_rates(&scenario_ab());
        assert_eq!(rates[0], ("A".to_string(), 0.0));
        assert_eq!(rates[1].0, "B");
        assert!((rates[1].1 - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_failure_rate_counts_max_iter_as_solved() {
        let (_, t) = table(
            "S",
            &[(Status::MaxIterReached, 1.0), (Status::SolverError, 1.0), (Status::DualInfeasible, 1.0), (Status::Optimal, 1.0)],
        );
        assert_eq!(failure_rate(&t), 0.5);
        assert_eq!(failure_rate(&ResultTable::default()), 0.0);
    }

    #[test]
    fn test_profile_scenario() {
        let profile = performance_profiles(&scenario_ab(), &ProfileOptions::default()).unwrap();
        assert_eq!(profile.tau.len(), 1000);
        assert_eq!(profile.tau[0], 1.0);
        assert!((profile.tau[999] - 1e4).abs() < 1e-6);

        let a = profile.curve("A").unwrap();
        let b = profile.curve("B").unwrap();

        // Ties at the best time count as ratio 1
        assert_eq!(a[0], 1.0);
        assert!((b[0] - 2.0 / 3.0).abs() < 1e-12);

        // The timeout is pinned to the sentinel, far beyond the last threshold
        assert_eq!(*a.last().unwrap(), 1.0);
        assert!((b.last().unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!(b.iter().all(|&rho| rho < 1.0));
    }

    #[test]
    fn test_profile_problem_failed_by_all() {
        let tables = vec![
            table("A", &[(Status::SolverError, 3.0), (Status::Optimal, 1.0)]),
            table("B", &[(Status::TimeLimit, 9.0), (Status::Optimal, 2.0)]),
        ];
        let profile = performance_profiles(&tables, &ProfileOptions::default()).unwrap();

        // Both charged the sentinel, so both sit at ratio 1 on the first problem
        assert_eq!(profile.curve("A").unwrap()[0], 1.0);
        assert_eq!(profile.curve("B").unwrap()[0], 0.5);
        assert_eq!(*profile.curve("B").unwrap().last().unwrap(), 1.0);
    }

    #[test]
    fn test_profile_csv_layout() {
        let options = ProfileOptions {
            points: 3,
            ..ProfileOptions::default()
        };
        let profile = performance_profiles(&scenario_ab(), &options).unwrap();
        let mut writer = csv::Writer::from_writer(Vec::new());
        profile.to_csv(&mut writer).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "tau,A,B");
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("1,1,"));
    }

    #[test]
    fn test_misaligned_tables_rejected() {
        let short = vec![
            table("A", &[(Status::Optimal, 1.0), (Status::Optimal, 1.0)]),
            table("B", &[(Status::Optimal, 1.0)]),
        ];
        assert!(matches!(
            performance_profiles(&short, &ProfileOptions::default()),
            Err(BenchError::Precondition(_))
        ));

        let mut swapped = scenario_ab();
        swapped[1].1.records.swap(0, 1);
        assert!(matches!(
            shifted_geometric_means(&swapped, DEFAULT_SHIFT),
            Err(BenchError::Precondition(_))
        ));

        assert!(matches!(check_aligned(&[]), Err(BenchError::Precondition(_))));
    }

    #[test]
    fn test_empty_problem_list_rejected() {
        let tables = vec![table("A", &[]), table("B", &[])];
        assert_eq!(check_aligned(&tables).unwrap(), 0);
        assert!(matches!(
            performance_profiles(&tables, &ProfileOptions::default()),
            Err(BenchError::Precondition(_))
        ));
    }

    #[test]
    fn test_shifted_geometric_mean_value() {
        // Constant times give back the time itself
        let g = shifted_geometric_mean(&[2.0, 2.0, 2.0], 10.0).unwrap();
        assert!((g - 2.0).abs() < 1e-12);

        // exp(mean(ln(11), ln(14))) - 10 = sqrt(154) - 10
        let g = shifted_geometric_mean(&[1.0, 4.0], 10.0).unwrap();
        assert!((g - (154f64.sqrt() - 10.0)).abs() < 1e-12);

        assert_eq!(shifted_geometric_mean(&[], 10.0), None);
    }

    #[test]
    fn test_geometric_means_scenario() {
        let means = shifted_geometric_means(&scenario_ab(), DEFAULT_SHIFT).unwrap();
        assert_eq!(means[0], ("A".to_string(), 1.0));
        assert!(means[1].1 > 1.0);
    }

    #[test]
    fn test_geometric_mean_does_not_overflow() {
        let runs: Vec<(Status, f64)> = (0..5000).map(|_| (Status::TimeLimit, 1.0)).collect();
        let tables = vec![table("A", &runs), table("B", &runs)];
        let means = shifted_geometric_means(&tables, DEFAULT_SHIFT).unwrap();
        assert_eq!(means[0].1, 1.0);
        assert_eq!(means[1].1, 1.0);

        let g = shifted_geometric_mean(&vec![MAX_TIMING; 5000], DEFAULT_SHIFT).unwrap();
        assert!((g - MAX_TIMING).abs() / MAX_TIMING < 1e-9);
    }

    fn polished_table(runs: &[(Status, f64, PolishStatus)]) -> SolverTable {
        let records = runs
            .iter()
            .enumerate()
            .map(|(p, &(status, t, polish))| {
                let mut r = record(ADMM_POLISH, p, status, t);
                r.extras.status_polish = Some(polish);
                r
            })
            .collect();
        (ADMM_POLISH.to_string(), ResultTable::new(records))
    }

    #[test]
    fn test_polish_statistics_only_base_optimal() {
        let base = table(
            ADMM,
            &[(Status::Optimal, 1.0), (Status::MaxIterReached, 1.0), (Status::Optimal, 2.0), (Status::SolverError, 1.0)],
        );
        let polished = polished_table(&[
            (Status::Optimal, 1.5, PolishStatus::Successful),
            (Status::Optimal, 9.0, PolishStatus::Successful),
            (Status::Optimal, 2.0, PolishStatus::Unsuccessful),
            (Status::Optimal, 9.0, PolishStatus::Successful),
        ]);

        let stats = polish_statistics(&base, &polished).unwrap();
        assert_eq!(stats.base, ADMM);
        assert_eq!(stats.polished, ADMM_POLISH);
        assert_eq!(stats.problems, 2);
        assert_eq!(stats.success_rate, Some(0.5));
        // ratios 1.5 and 1.0
        assert_eq!(stats.median_time_ratio, Some(1.25));
    }

    #[test]
    fn test_polish_statistics_without_optimal_base() {
        let base = table(ADMM, &[(Status::SolverError, 1.0)]);
        let polished = polished_table(&[(Status::Optimal, 1.0, PolishStatus::Successful)]);
        let stats = polish_statistics(&base, &polished).unwrap();
        assert_eq!(stats.problems, 0);
        assert_eq!(stats.median_time_ratio, None);
        assert_eq!(stats.success_rate, None);
    }

    #[test]
    fn test_phase_timing_ratios() {
        let (_, mut t) = table(
            CLARABEL,
            &[(Status::Optimal, 1.0), (Status::Optimal, 1.0), (Status::SolverError, 1.0), (Status::Optimal, 1.0)],
        );
        let phases = [(0.1, 0.9), (0.3, 0.3), (5.0, 1.0), (1.0, 0.0)];
        for (r, &(setup, solve)) in t.records.iter_mut().zip(&phases) {
            r.extras.setup_time = Some(setup);
            r.extras.solve_time = Some(solve);
        }

        let phase = phase_timing_ratios(CLARABEL, &t).unwrap();
        assert_eq!(phase.records, 2);
        assert!((phase.mean_ratio - (1.0 / 9.0 + 1.0) / 2.0).abs() < 1e-12);
        assert!((phase.median_ratio - phase.mean_ratio).abs() < 1e-12);

        let (_, plain) = table(ADMM, &[(Status::Optimal, 1.0)]);
        assert_eq!(phase_timing_ratios(ADMM, &plain), None);
    }

    #[test]
    fn test_compute_stats_info_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let base = table(ADMM, &[(Status::Optimal, 1.0), (Status::Optimal, 2.0)]);
        let polished = polished_table(&[
            (Status::Optimal, 1.0, PolishStatus::Successful),
            (Status::Optimal, 3.0, PolishStatus::Successful),
        ]);
        let clarabel = table(CLARABEL, &[(Status::Optimal, 0.5), (Status::PrimalInfeasible, 0.5)]);

        for (solver, t) in [&base, &polished, &clarabel] {
            t.write_csv(&dir.path().join(solver).join("results.csv")).unwrap();
        }

        let solvers = vec![ADMM.to_string(), ADMM_POLISH.to_string(), CLARABEL.to_string()];
        let report = compute_stats_info(dir.path(), &solvers, false).unwrap();

        assert_eq!(report.problems, 2);
        assert_eq!(report.inputs.len(), 3);
        assert!(report.inputs.iter().all(|(_, digest)| digest.len() == 64));
        assert_eq!(report.polish.as_ref().unwrap().problems, 2);
        assert_eq!(report.failure_rates[2], (CLARABEL.to_string(), 0.5));

        for file in [FAILURE_RATES_FILE, PROFILES_FILE, GEOM_MEAN_FILE, POLISH_FILE, PHASE_TIMING_FILE, SUMMARY_FILE] {
            assert!(dir.path().join(file).is_file(), "missing {}", file);
        }
        let rates = fs::read_to_string(dir.path().join(FAILURE_RATES_FILE)).unwrap();
        assert_eq!(rates, "solver,failure_rate\nADMM,0\nADMM_polish,0\nCLARABEL,0.5\n");

        let summary = fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap();
        assert!(summary.contains("Problems: 2"));
        assert!(summary.contains("ADMM_polish vs ADMM"));
        assert_eq!(summary, report.to_string());
        let sections: Vec<usize> = ["Failure rates", "Shifted geometric means", "Polish (", "Inputs"]
            .iter()
            .map(|header| summary.find(header).unwrap())
            .collect();
        assert!(sections.windows(2).all(|w| w[0] < w[1]), "{}", summary);

        // Same inputs, same outputs
        let again = compute_stats_info(dir.path(), &solvers, false).unwrap();
        assert_eq!(again, report);
    }

    #[test]
    fn test_compute_stats_info_missing_solver() {
        let dir = tempfile::tempdir().unwrap();
        let err = compute_stats_info(dir.path(), &[CLARABEL.to_string()], true).unwrap_err();
        assert!(matches!(err, BenchError::ProblemNotFound(_)));
    }

    fn status_strategy() -> impl Strategy<Value = Status> {
        prop::sample::select(Status::ALL.to_vec())
    }

    fn tables_strategy() -> impl Strategy<Value = Vec<SolverTable>> {
        (1usize..12, 1usize..4).prop_flat_map(|(problems, solvers)| {
            prop::collection::vec(
                prop::collection::vec((status_strategy(), 1e-4f64..1e3), problems),
                solvers,
            )
            .prop_map(|runs| {
                runs.iter()
                    .enumerate()
                    .map(|(s, r)| table(&format!("S{}", s), r))
                    .collect()
            })
        })
    }

    proptest! {
        #[test]
        fn prop_profiles_non_decreasing_and_bounded(tables in tables_strategy()) {
            let options = ProfileOptions { points: 50, ..ProfileOptions::default() };
            let profile = performance_profiles(&tables, &options).unwrap();
            for (_, curve) in &profile.curves {
                for pair in curve.windows(2) {
                    prop_assert!(pair[0] <= pair[1]);
                }
                prop_assert!(curve.iter().all(|&rho| (0.0..=1.0).contains(&rho)));
            }
            // Some solver holds the best time of every problem
            let at_one: f64 = profile.curves.iter().map(|(_, c)| c[0]).sum();
            prop_assert!(at_one >= 1.0 - 1e-12);
        }

        #[test]
        fn prop_geometric_means_normalized(tables in tables_strategy()) {
            let means = shifted_geometric_means(&tables, DEFAULT_SHIFT).unwrap();
            let best = means.iter().map(|(_, g)| *g).fold(f64::INFINITY, f64::min);
            prop_assert_eq!(best, 1.0);
            prop_assert!(means.iter().all(|(_, g)| *g >= 1.0));
        }

        #[test]
        fn prop_failure_rate_bounds(tables in tables_strategy()) {
            for ((_, rate), (_, t)) in failure_rates(&tables).iter().zip(&tables) {
                prop_assert!((0.0..=1.0).contains(rate));
                prop_assert_eq!(*rate == 0.0, t.iter().all(|r| r.is_solution_present()));
            }
        }
    }
}
