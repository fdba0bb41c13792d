//! Aggregate result rows, one per swept parameter value.

use serde::{Deserialize, Serialize};

/// Random vs. preferential targeting statistics at one parameter point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Value of the swept parameter
    pub param: f64,
    pub random_mean: f64,
    pub random_stderr: f64,
    pub preferential_mean: f64,
    pub preferential_stderr: f64,
    /// Mean of per-run preferential/random quality ratios
    pub ratio_mean: f64,
    pub ratio_stderr: f64,
}

impl ResultRow {
    /// Number of columns in the tabular form.
    pub const COLUMNS: usize = 7;

    /// Values in column order.
    pub fn to_columns(&self) -> [f64; Self::COLUMNS] {
        [
            self.param,
            self.random_mean,
            self.random_stderr,
            self.preferential_mean,
            self.preferential_stderr,
            self.ratio_mean,
            self.ratio_stderr,
        ]
    }

    /// Builds a row from values in column order.
    pub fn from_columns(c: [f64; Self::COLUMNS]) -> Self {
        Self {
            param: c[0],
            random_mean: c[1],
            random_stderr: c[2],
            preferential_mean: c[3],
            preferential_stderr: c[4],
            ratio_mean: c[5],
            ratio_stderr: c[6],
        }
    }
}
