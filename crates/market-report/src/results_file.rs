//! Results File
//!
//! Append-only CSV of aggregate rows, one line per parameter point:
//! parameter, random mean, random stderr, preferential mean, preferential
//! stderr, ratio mean, ratio stderr. Each row goes out in a single append
//! write so concurrent sweeps writing the same file never interleave
//! within a line.

use market_events::ResultRow;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ReportError;

/// Handle to a results CSV on disk
#[derive(Debug, Clone)]
pub struct ResultsFile {
    path: PathBuf,
}

impl ResultsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row, creating the file and its directory if needed.
    pub fn append(&self, row: &ResultRow) -> Result<(), ReportError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let line = format_row(row);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        tracing::debug!(path = %self.path.display(), param = row.param, "Appended result row");
        Ok(())
    }

    /// Read every row back, ordered by parameter value.
    pub fn read(&self) -> Result<ResultTable, ReportError> {
        let content = fs::read_to_string(&self.path)?;
        parse_table(&content)
    }
}

/// Rows keyed by parameter value, ascending. A parameter written more than
/// once keeps its last row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn insert(&mut self, row: ResultRow) {
        match self
            .rows
            .binary_search_by(|r| r.param.total_cmp(&row.param))
        {
            Ok(i) => self.rows[i] = row,
            Err(i) => self.rows.insert(i, row),
        }
    }

    pub fn get(&self, param: f64) -> Option<&ResultRow> {
        self.rows
            .binary_search_by(|r| r.param.total_cmp(&param))
            .ok()
            .map(|i| &self.rows[i])
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn params(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(|r| r.param)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// CSV line for one row, newline included.
pub fn format_row(row: &ResultRow) -> String {
    let columns: Vec<String> = row.to_columns().iter().map(|v| v.to_string()).collect();
    format!("{}\n", columns.join(","))
}

/// Parse CSV content into a table. Blank lines are ignored; quoted fields
/// are unquoted.
pub fn parse_table(content: &str) -> Result<ResultTable, ReportError> {
    let mut table = ResultTable::default();
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        table.insert(parse_row(index + 1, line)?);
    }
    Ok(table)
}

fn parse_row(line_no: usize, line: &str) -> Result<ResultRow, ReportError> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != ResultRow::COLUMNS {
        return Err(ReportError::MalformedRow {
            line: line_no,
            reason: format!(
                "expected {} columns, found {}",
                ResultRow::COLUMNS,
                fields.len()
            ),
        });
    }

    let mut columns = [0.0; ResultRow::COLUMNS];
    for (slot, field) in columns.iter_mut().zip(&fields) {
        let field = field.trim().trim_matches('"');
        *slot = field.parse().map_err(|_| ReportError::MalformedRow {
            line: line_no,
            reason: format!("'{}' is not a number", field),
        })?;
    }
    Ok(ResultRow::from_columns(columns))
}
