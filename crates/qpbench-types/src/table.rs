use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{BenchError, Result};
use crate::record::{ProblemKey, ResultRecord, SolverExtras};
use crate::status::{PolishStatus, Status};

/// Columns of a result table, in file order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Problem,
    Dimension,
    Instance,
    Solver,
    Status,
    RunTime,
    Iter,
    ObjVal,
    N,
    M,
    Nnz,
    StatusPolish,
    SetupTime,
    SolveTime,
    UpdateTime,
    RhoUpdates,
    DualObjVal,
    DualityGap,
    Restarts,
}

impl Column {
    pub const ALL: [Column; 19] = [
        Column::Problem,
        Column::Dimension,
        Column::Instance,
        Column::Solver,
        Column::Status,
        Column::RunTime,
        Column::Iter,
        Column::ObjVal,
        Column::N,
        Column::M,
        Column::Nnz,
        Column::StatusPolish,
        Column::SetupTime,
        Column::SolveTime,
        Column::UpdateTime,
        Column::RhoUpdates,
        Column::DualObjVal,
        Column::DualityGap,
        Column::Restarts,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::Problem => "problem",
            Column::Dimension => "dimension",
            Column::Instance => "instance",
            Column::Solver => "solver",
            Column::Status => "status",
            Column::RunTime => "run_time",
            Column::Iter => "iter",
            Column::ObjVal => "obj_val",
            Column::N => "n",
            Column::M => "m",
            Column::Nnz => "N",
            Column::StatusPolish => "status_polish",
            Column::SetupTime => "setup_time",
            Column::SolveTime => "solve_time",
            Column::UpdateTime => "update_time",
            Column::RhoUpdates => "rho_updates",
            Column::DualObjVal => "dual_obj_val",
            Column::DualityGap => "duality_gap",
            Column::Restarts => "restarts",
        }
    }

    fn from_name(name: &str) -> Option<Column> {
        Column::ALL.iter().copied().find(|c| c.name() == name)
    }

    /// Base columns are always written; the rest only when some record has them
    pub fn is_base(self) -> bool {
        matches!(
            self,
            Column::Problem
                | Column::Solver
                | Column::Status
                | Column::RunTime
                | Column::Iter
                | Column::ObjVal
                | Column::N
                | Column::M
                | Column::Nnz
        )
    }

    fn present_in(self, r: &ResultRecord) -> bool {
        let e = &r.extras;
        match self {
            Column::Dimension => r.dimension.is_some(),
            Column::Instance => r.instance.is_some(),
            Column::StatusPolish => e.status_polish.is_some(),
            Column::SetupTime => e.setup_time.is_some(),
            Column::SolveTime => e.solve_time.is_some(),
            Column::UpdateTime => e.update_time.is_some(),
            Column::RhoUpdates => e.rho_updates.is_some(),
            Column::DualObjVal => e.dual_obj_val.is_some(),
            Column::DualityGap => e.duality_gap.is_some(),
            Column::Restarts => e.restarts.is_some(),
            _ => true,
        }
    }

    fn format(self, r: &ResultRecord) -> String {
        let e = &r.extras;
        match self {
            Column::Problem => r.problem.clone(),
            Column::Dimension => opt(r.dimension),
            Column::Instance => opt(r.instance),
            Column::Solver => r.solver.clone(),
            Column::Status => r.status.to_string(),
            Column::RunTime => r.run_time.to_string(),
            Column::Iter => r.iter.to_string(),
            Column::ObjVal => opt(r.obj_val),
            Column::N => r.n.to_string(),
            Column::M => r.m.to_string(),
            Column::Nnz => r.nnz.to_string(),
            Column::StatusPolish => opt(e.status_polish),
            Column::SetupTime => opt(e.setup_time),
            Column::SolveTime => opt(e.solve_time),
            Column::UpdateTime => opt(e.update_time),
            Column::RhoUpdates => opt(e.rho_updates),
            Column::DualObjVal => opt(e.dual_obj_val),
            Column::DualityGap => opt(e.duality_gap),
            Column::Restarts => opt(e.restarts),
        }
    }
}

// f64 Display is the shortest string that parses back to the same value,
// which keeps rewritten tables byte-identical.
fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// One row of a result table as it appears on disk
#[derive(Debug, Deserialize)]
struct CsvRow {
    problem: String,
    #[serde(default)]
    dimension: Option<usize>,
    #[serde(default)]
    instance: Option<u64>,
    solver: String,
    status: Status,
    run_time: f64,
    iter: u64,
    #[serde(default)]
    obj_val: Option<f64>,
    n: usize,
    m: usize,
    #[serde(rename = "N")]
    nnz: usize,
    #[serde(default)]
    status_polish: Option<PolishStatus>,
    #[serde(default)]
    setup_time: Option<f64>,
    #[serde(default)]
    solve_time: Option<f64>,
    #[serde(default)]
    update_time: Option<f64>,
    #[serde(default)]
    rho_updates: Option<u64>,
    #[serde(default)]
    dual_obj_val: Option<f64>,
    #[serde(default)]
    duality_gap: Option<f64>,
    #[serde(default)]
    restarts: Option<u64>,
}

impl From<CsvRow> for ResultRecord {
    fn from(row: CsvRow) -> Self {
        ResultRecord {
            problem: row.problem,
            dimension: row.dimension,
            instance: row.instance,
            solver: row.solver,
            status: row.status,
            run_time: row.run_time,
            iter: row.iter,
            obj_val: row.obj_val,
            n: row.n,
            m: row.m,
            nnz: row.nnz,
            extras: SolverExtras {
                status_polish: row.status_polish,
                setup_time: row.setup_time,
                solve_time: row.solve_time,
                update_time: row.update_time,
                rho_updates: row.rho_updates,
                dual_obj_val: row.dual_obj_val,
                duality_gap: row.duality_gap,
                restarts: row.restarts,
            },
        }
    }
}

// Bad values are table content errors, anything else stays a csv error
fn row_error(err: csv::Error) -> BenchError {
    match err.kind() {
        csv::ErrorKind::Deserialize { .. } => BenchError::Parse(err.to_string()),
        _ => BenchError::Csv(err),
    }
}

/// Ordered collection of result records for one solver (or one unit)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    pub records: Vec<ResultRecord>,
}

impl ResultTable {
    pub fn new(records: Vec<ResultRecord>) -> Self {
        ResultTable { records }
    }

    /// Concatenate tables in the given order
    pub fn concat<I: IntoIterator<Item = ResultTable>>(tables: I) -> Self {
        ResultTable {
            records: tables.into_iter().flat_map(|t| t.records).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultRecord> {
        self.records.iter()
    }

    pub fn keys(&self) -> Vec<ProblemKey> {
        self.records.iter().map(ResultRecord::key).collect()
    }

    /// Base columns plus every optional column some record carries
    pub fn columns(&self) -> Vec<Column> {
        Column::ALL
            .iter()
            .copied()
            .filter(|c| c.is_base() || self.records.iter().any(|r| c.present_in(r)))
            .collect()
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        self.write_to(&mut writer)?;
        let bytes = writer
            .into_inner()
            .map_err(|e| BenchError::Serialization(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| BenchError::Serialization(e.to_string()))
    }

    fn write_to<W: std::io::Write>(&self, writer: &mut csv::Writer<W>) -> Result<()> {
        let columns = self.columns();
        writer.write_record(columns.iter().map(|c| c.name()))?;
        for record in &self.records {
            writer.write_record(columns.iter().map(|c| c.format(record)))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write the table so that `path` only ever holds a complete file
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = std::path::PathBuf::from(tmp);
        {
            let mut writer = csv::Writer::from_path(&tmp)?;
            self.write_to(&mut writer)?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn read_csv(path: &Path) -> Result<Self> {
        let reader = csv::Reader::from_path(path)?;
        Self::read_from(reader)
    }

    pub fn from_csv_str(data: &str) -> Result<Self> {
        Self::read_from(csv::Reader::from_reader(data.as_bytes()))
    }

    fn read_from<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let headers: Vec<Column> = reader.headers()?.iter().filter_map(Column::from_name).collect();
        if let Some(missing) = Column::ALL
            .iter()
            .find(|c| c.is_base() && !headers.contains(*c))
        {
            return Err(BenchError::Parse(format!("missing column '{}'", missing.name())));
        }

        let records = reader
            .deserialize::<CsvRow>()
            .map(|row| row.map(ResultRecord::from).map_err(row_error))
            .collect::<Result<Vec<_>>>()?;
        Ok(ResultTable { records })
    }
}

impl IntoIterator for ResultTable {
    type Item = ResultRecord;
    type IntoIter = std::vec::IntoIter<ResultRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
