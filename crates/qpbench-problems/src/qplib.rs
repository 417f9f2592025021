use std::fs;
use std::path::{Path, PathBuf};

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use qpbench_solver::{ObjectiveSense, QpModel};
use qpbench_types::{BenchError, Result};

pub const QPLIB_EXTENSION: &str = "qplib";

/// A `.qplib` file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QplibFile {
    /// File stem, e.g. "QPLIB_8790"
    pub name: String,
    pub path: PathBuf,
}

/// All `*.qplib` files directly inside `dir`, sorted by name
pub fn discover_qplib(dir: &Path) -> Result<Vec<QplibFile>> {
    if !dir.is_dir() {
        return Err(BenchError::ProblemNotFound(format!(
            "QPLIB directory {} does not exist",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(QPLIB_EXTENSION) {
            continue;
        }
        if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
            files.push(QplibFile {
                name: name.to_string(),
                path: path.clone(),
            });
        }
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));

    debug!(dir = %dir.display(), count = files.len(), "discovered QPLIB problems");
    Ok(files)
}

/// Load a QPLIB file; variable bounds become extra identity rows of A
pub fn load_qplib(path: &Path) -> Result<QpModel> {
    let text = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            BenchError::ProblemNotFound(path.display().to_string())
        } else {
            BenchError::Io(e)
        }
    })?;
    parse_qplib(&text).map_err(|e| match e {
        BenchError::Parse(msg) => BenchError::Parse(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Parse QPLIB text
///
/// Layout: name, problem type, objective sense, then counts, sparse entries
/// and default-plus-exceptions vectors for q, A, l, u, lx and ux. Anything
/// after ux (starting points) is ignored.
pub fn parse_qplib(text: &str) -> Result<QpModel> {
    let mut lines = Lines::new(text);

    lines.next_line("problem name")?;
    lines.next_line("problem type")?;
    let sense = if lines.next_line("objective sense")?.1.contains("minimize") {
        ObjectiveSense::Minimize
    } else {
        ObjectiveSense::Maximize
    };

    let n = lines.count_line("number of variables", Some("variables"))?;
    let m = if lines.peek_contains(&["constraints"]) {
        lines.count_line("number of constraints", None)?
    } else {
        0
    };

    let mut p = DMatrix::zeros(n, n);
    if lines.peek_contains(&["quadratic", "objective"]) {
        let nnz = lines.count_line("quadratic objective terms", None)?;
        for _ in 0..nnz {
            // Lower triangle stored as "i j v" with i >= j
            let (i, j, v) = lines.triplet(n, n)?;
            p[(j, i)] += v;
            if i != j {
                p[(i, j)] += v;
            }
        }
    }

    let mut q = lines.vector(n, "q")?;
    let mut offset = lines.float_line("objective constant")?;

    let mut a = DMatrix::zeros(m, n);
    if m > 0 {
        let nnz = lines.count_line("constraint nonzeros", None)?;
        for _ in 0..nnz {
            let (i, j, v) = lines.triplet(m, n)?;
            a[(i, j)] += v;
        }
    }

    let infinity = lines.float_line("infinity value")?.abs();

    let (l, u) = if m > 0 {
        (lines.vector(m, "l")?, lines.vector(m, "u")?)
    } else {
        (DVector::zeros(0), DVector::zeros(0))
    };
    let lx = lines.vector(n, "lx")?;
    let ux = lines.vector(n, "ux")?;

    // Stack variable bounds under the constraints: [A; I], [l; lx], [u; ux]
    let mut a_full = DMatrix::zeros(m + n, n);
    a_full.view_mut((0, 0), (m, n)).copy_from(&a);
    a_full.view_mut((m, 0), (n, n)).fill_with_identity();
    let to_inf = |v: f64| {
        if v >= infinity {
            f64::INFINITY
        } else if v <= -infinity {
            f64::NEG_INFINITY
        } else {
            v
        }
    };
    let l_full = DVector::from_iterator(m + n, l.iter().chain(lx.iter()).map(|&v| to_inf(v)));
    let u_full = DVector::from_iterator(m + n, u.iter().chain(ux.iter()).map(|&v| to_inf(v)));

    if sense == ObjectiveSense::Maximize {
        p.neg_mut();
        q.neg_mut();
        offset = -offset;
    }

    Ok(QpModel::new(p, q, a_full, l_full, u_full)
        .with_offset(offset)
        .with_sense(sense))
}

/// Line cursor over QPLIB text; values are the leading token of each line
struct Lines<'a> {
    lines: std::iter::Peekable<std::iter::Enumerate<std::str::Lines<'a>>>,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Lines {
            lines: text.lines().enumerate().peekable(),
        }
    }

    fn skip_blank(&mut self) {
        while matches!(self.lines.peek(), Some((_, line)) if line.trim().is_empty()) {
            self.lines.next();
        }
    }

    fn next_line(&mut self, what: &str) -> Result<(usize, &'a str)> {
        self.skip_blank();
        self.lines
            .next()
            .map(|(i, line)| (i + 1, line))
            .ok_or_else(|| BenchError::Parse(format!("unexpected end of file, expected {}", what)))
    }

    fn peek_contains(&mut self, words: &[&str]) -> bool {
        self.skip_blank();
        match self.lines.peek() {
            Some((_, line)) => {
                let tokens: Vec<&str> = line.split_whitespace().collect();
                words.iter().all(|w| tokens.contains(w))
            }
            None => false,
        }
    }

    fn tokens(&mut self, what: &str, count: usize) -> Result<(usize, Vec<&'a str>)> {
        let (line_no, line) = self.next_line(what)?;
        let tokens: Vec<&str> = line.split_whitespace().take(count).collect();
        if tokens.len() < count {
            return Err(BenchError::Parse(format!(
                "line {}: expected {} value(s) for {}",
                line_no, count, what
            )));
        }
        Ok((line_no, tokens))
    }

    fn count_line(&mut self, what: &str, marker: Option<&str>) -> Result<usize> {
        if let Some(marker) = marker {
            if !self.peek_contains(&[marker]) {
                return Err(BenchError::Parse(format!("no {} recognized", what)));
            }
        }
        let (line_no, tokens) = self.tokens(what, 1)?;
        parse_index(tokens[0], line_no, what)
    }

    fn float_line(&mut self, what: &str) -> Result<f64> {
        let (line_no, tokens) = self.tokens(what, 1)?;
        parse_float(tokens[0], line_no, what)
    }

    /// 1-based "i j v" entry, returned 0-based and range-checked
    fn triplet(&mut self, rows: usize, cols: usize) -> Result<(usize, usize, f64)> {
        let (line_no, tokens) = self.tokens("matrix entry", 3)?;
        let i = parse_index(tokens[0], line_no, "row index")?;
        let j = parse_index(tokens[1], line_no, "column index")?;
        let v = parse_float(tokens[2], line_no, "matrix value")?;
        if i == 0 || j == 0 || i > rows || j > cols {
            return Err(BenchError::Parse(format!(
                "line {}: entry ({}, {}) outside {}x{}",
                line_no, i, j, rows, cols
            )));
        }
        Ok((i - 1, j - 1, v))
    }

    /// Default value, exception count, then "i v" exceptions
    fn vector(&mut self, len: usize, what: &str) -> Result<DVector<f64>> {
        let default = self.float_line(what)?;
        let exceptions = self.count_line(what, None)?;
        let mut vector = DVector::from_element(len, default);
        for _ in 0..exceptions {
            let (line_no, tokens) = self.tokens(what, 2)?;
            let i = parse_index(tokens[0], line_no, what)?;
            if i == 0 || i > len {
                return Err(BenchError::Parse(format!(
                    "line {}: index {} outside {} of length {}",
                    line_no, i, what, len
                )));
            }
            vector[i - 1] = parse_float(tokens[1], line_no, what)?;
        }
        Ok(vector)
    }
}

fn parse_index(token: &str, line_no: usize, what: &str) -> Result<usize> {
    token
        .parse()
        .map_err(|_| BenchError::Parse(format!("line {}: invalid {} '{}'", line_no, what, token)))
}

fn parse_float(token: &str, line_no: usize, what: &str) -> Result<f64> {
    token
        .parse()
        .map_err(|_| BenchError::Parse(format!("line {}: invalid {} '{}'", line_no, what, token)))
}
