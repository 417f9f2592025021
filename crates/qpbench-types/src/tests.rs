// Integration tests for the types crate

#[cfg(test)]
mod tests {
    use crate::*;

    fn parametric(instance: u64, status: Status, run_time: f64) -> ResultRecord {
        ResultRecord {
            problem: "Portfolio".to_string(),
            dimension: Some(10),
            instance: Some(instance),
            solver: ADMM.to_string(),
            status,
            run_time,
            iter: 42,
            obj_val: Some(-1.25),
            n: 1010,
            m: 1021,
            nnz: 5000,
            extras: SolverExtras::default(),
        }
    }

    fn named(name: &str) -> ResultRecord {
        ResultRecord {
            problem: name.to_string(),
            dimension: None,
            instance: None,
            solver: CLARABEL.to_string(),
            status: Status::Optimal,
            run_time: 0.003,
            iter: 9,
            obj_val: None,
            n: 3,
            m: 5,
            nnz: 7,
            extras: SolverExtras::default(),
        }
    }

    #[test]
    fn test_solution_present_subset() {
        let present: Vec<Status> = Status::ALL
            .iter()
            .copied()
            .filter(|s| s.is_solution_present())
            .collect();
        assert_eq!(present, vec![Status::Optimal, Status::MaxIterReached]);
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in Status::ALL {
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
        }
        assert!("optimal inaccurate".parse::<Status>().is_err());
    }

    #[test]
    fn test_extra_columns_only_when_present() {
        let plain = ResultTable::new(vec![named("A"), named("B")]);
        let names: Vec<&str> = plain.columns().iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec!["problem", "solver", "status", "run_time", "iter", "obj_val", "n", "m", "N"]
        );

        let mut polished = parametric(0, Status::Optimal, 0.5);
        polished.extras.status_polish = Some(PolishStatus::Successful);
        polished.extras.setup_time = Some(0.1);
        let table = ResultTable::new(vec![polished, parametric(1, Status::Optimal, 0.4)]);
        let names: Vec<&str> = table.columns().iter().map(|c| c.name()).collect();
        assert!(names.contains(&"dimension"));
        assert!(names.contains(&"instance"));
        assert!(names.contains(&"status_polish"));
        assert!(names.contains(&"setup_time"));
        assert!(!names.contains(&"solve_time"));
        assert!(!names.contains(&"restarts"));
    }

    #[test]
    fn test_csv_rewrite_is_byte_identical() {
        let mut r = parametric(3, Status::MaxIterReached, 0.1 + 0.2);
        r.extras.duality_gap = Some(1.0 / 3.0);
        let table = ResultTable::new(vec![r, parametric(4, Status::SolverError, 1e-7)]);

        let first = table.to_csv_string().unwrap();
        let reloaded = ResultTable::from_csv_str(&first).unwrap();
        assert_eq!(reloaded, table);
        assert_eq!(reloaded.to_csv_string().unwrap(), first);
    }

    #[test]
    fn test_empty_table_has_header_only() {
        let csv = ResultTable::default().to_csv_string().unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert!(ResultTable::from_csv_str(&csv).unwrap().is_empty());
    }

    #[test]
    fn test_missing_base_column_rejected() {
        let data = "problem,solver,status\nA,ADMM,OPTIMAL\n";
        assert!(matches!(
            ResultTable::from_csv_str(data),
            Err(BenchError::Parse(_))
        ));
    }

    #[test]
    fn test_read_by_header_name() {
        // Column order and unknown columns do not matter, empty cells are absent values
        let data = "N,m,n,obj_val,iter,run_time,status,solver,problem,status_polish,comment\n\
                    12,30,3,,1000,1000,TIME_LIMIT,ADMM,Random QP,not_performed,resumed\n";
        let table = ResultTable::from_csv_str(data).unwrap();
        let record = &table.records[0];
        assert_eq!(record.problem, "Random QP");
        assert_eq!(record.status, Status::TimeLimit);
        assert_eq!(record.obj_val, None);
        assert_eq!(record.dimension, None);
        assert_eq!((record.n, record.m, record.nnz), (3, 30, 12));
        assert_eq!(record.extras.status_polish, Some(PolishStatus::NotPerformed));
    }

    #[test]
    fn test_bad_cell_reports_line() {
        let data = "problem,solver,status,run_time,iter,obj_val,n,m,N\n\
                    A,ADMM,OPTIMAL,0.5,3,1.0,2,2,4\n\
                    B,ADMM,SOLVED,0.5,3,1.0,2,2,4\n";
        match ResultTable::from_csv_str(data) {
            Err(BenchError::Parse(msg)) => assert!(msg.contains("line: 3"), "{}", msg),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_write_csv_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("n10.csv");
        ResultTable::new(vec![parametric(0, Status::Optimal, 1.0)])
            .write_csv(&path)
            .unwrap();

        assert!(path.exists());
        let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(ResultTable::read_csv(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_presets_are_distinct_identities() {
        let low = SolverSettings::preset(ADMM).unwrap();
        let high = SolverSettings::preset(ADMM_HIGH).unwrap();
        assert_eq!(low.engine, high.engine);
        assert_ne!(low.fingerprint().unwrap(), high.fingerprint().unwrap());
        assert_eq!(high.eps_abs, EPS_HIGH);
        assert!(SolverSettings::preset(ADMM_POLISH).unwrap().polish);
        assert!(matches!(
            SolverSettings::preset("GUROBI"),
            Err(BenchError::UnknownSolver(_))
        ));
    }

    #[test]
    fn test_fingerprint_stable() {
        let a = SolverSettings::preset(CLARABEL_HIGH).unwrap();
        let b = SolverSettings::preset(CLARABEL_HIGH).unwrap();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        let c = b.with_time_limit(Some(5.0));
        assert_ne!(a.fingerprint().unwrap(), c.fingerprint().unwrap());
    }

    #[test]
    fn test_fingerprint_ignores_verbose() {
        let quiet = SolverSettings::preset(ADMM).unwrap();
        let loud = quiet.clone().with_verbose(true);
        assert_eq!(quiet.fingerprint().unwrap(), loud.fingerprint().unwrap());
        assert_ne!(
            quiet.fingerprint().unwrap(),
            quiet.clone().with_polish(true).fingerprint().unwrap()
        );
    }

    proptest::proptest! {
        // Cached units are re-merged from disk, so timings must survive exactly
        #[test]
        fn prop_csv_keeps_floats_exact(
            run_time in 0.0f64..1e8,
            obj_val in proptest::num::f64::NORMAL,
            gap in proptest::option::of(0.0f64..1.0),
        ) {
            let mut record = parametric(0, Status::Optimal, run_time);
            record.obj_val = Some(obj_val);
            record.extras.duality_gap = gap;

            let table = ResultTable::new(vec![record]);
            let back = ResultTable::from_csv_str(&table.to_csv_string().unwrap()).unwrap();
            proptest::prop_assert_eq!(back, table);
        }
    }
}
