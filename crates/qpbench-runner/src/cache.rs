use std::fmt;
use std::path::{Path, PathBuf};

use qpbench_problems::ProblemClass;
use qpbench_types::{ResultTable, Result};

/// Hex digits of the settings fingerprint kept in unit file names
pub const FINGERPRINT_PREFIX_LEN: usize = 12;

/// Granularity at which results are cached on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitKey {
    /// All instances of one class at one dimension
    Parametric {
        class: ProblemClass,
        dimension: usize,
    },
    /// One named problem
    Named { name: String },
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKey::Parametric { class, dimension } => write!(f, "{} n={}", class, dimension),
            UnitKey::Named { name } => f.write_str(name),
        }
    }
}

/// File layout of one benchmark set under the output directory
///
/// ```text
/// {set}/{solver}/{class}/n{dim}.csv     parametric unit
/// {set}/{solver}/{class}/full.csv       one class, all dimensions
/// {set}/{solver}/problems/{name}.csv    named unit
/// {set}/{solver}/results.csv            aggregate table
/// ```
#[derive(Debug, Clone)]
pub struct CacheLayout {
    set_dir: PathBuf,
}

impl CacheLayout {
    pub fn new(output_dir: &Path, set_name: &str) -> Self {
        CacheLayout {
            set_dir: output_dir.join(set_name),
        }
    }

    pub fn set_dir(&self) -> &Path {
        &self.set_dir
    }

    pub fn solver_dir(&self, solver: &str) -> PathBuf {
        self.set_dir.join(solver)
    }

    pub fn unit_file(&self, solver: &str, unit: &UnitKey, fingerprint: Option<&str>) -> PathBuf {
        let suffix = fingerprint
            .map(|fp| format!("-{}", &fp[..fp.len().min(FINGERPRINT_PREFIX_LEN)]))
            .unwrap_or_default();
        match unit {
            UnitKey::Parametric { class, dimension } => self
                .solver_dir(solver)
                .join(class.name())
                .join(format!("n{}{}.csv", dimension, suffix)),
            UnitKey::Named { name } => self
                .solver_dir(solver)
                .join("problems")
                .join(format!("{}{}.csv", name, suffix)),
        }
    }

    pub fn class_file(&self, solver: &str, class: ProblemClass) -> PathBuf {
        self.solver_dir(solver).join(class.name()).join("full.csv")
    }

    pub fn results_file(&self, solver: &str) -> PathBuf {
        self.solver_dir(solver).join("results.csv")
    }
}

/// Table stored at `path`, or `None` when the unit still has to run
pub fn load_cached(path: &Path) -> Result<Option<ResultTable>> {
    if path.is_file() {
        ResultTable::read_csv(path).map(Some)
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = CacheLayout::new(Path::new("results"), "benchmark_problems");
        let unit = UnitKey::Parametric {
            class: ProblemClass::RandomQp,
            dimension: 20,
        };

        assert_eq!(
            layout.unit_file("ADMM", &unit, None),
            PathBuf::from("results/benchmark_problems/ADMM/Random QP/n20.csv")
        );
        assert_eq!(
            layout.class_file("ADMM", ProblemClass::RandomQp),
            PathBuf::from("results/benchmark_problems/ADMM/Random QP/full.csv")
        );
        assert_eq!(
            layout.results_file("ADMM"),
            PathBuf::from("results/benchmark_problems/ADMM/results.csv")
        );

        let named = UnitKey::Named {
            name: "QPLIB_0018".to_string(),
        };
        assert_eq!(
            layout.unit_file("CLARABEL", &named, None),
            PathBuf::from("results/benchmark_problems/CLARABEL/problems/QPLIB_0018.csv")
        );
    }

    #[test]
    fn test_fingerprint_suffix() {
        let layout = CacheLayout::new(Path::new("out"), "set");
        let unit = UnitKey::Parametric {
            class: ProblemClass::Lasso,
            dimension: 5,
        };
        let path = layout.unit_file("ADMM", &unit, Some("0123456789abcdef0123"));
        assert_eq!(path, PathBuf::from("out/set/ADMM/Lasso/n5-0123456789ab.csv"));
    }

    #[test]
    fn test_missing_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_cached(&dir.path().join("n10.csv")).unwrap().is_none());
    }
}
