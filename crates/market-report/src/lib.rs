//! Result aggregation and export.
//!
//! Turns batches of simulation runs into the per-parameter rows of a
//! results file and writes annotated networks as GML.
//!
//! # Modules
//!
//! - [`stats`]: mean and standard error of per-run samples
//! - [`aggregate`]: random vs. preferential comparison at one parameter point
//! - [`results_file`]: append-only results CSV
//! - [`gml`]: GML network export

pub mod aggregate;
pub mod error;
pub mod gml;
pub mod results_file;
pub mod stats;

pub use aggregate::{compare, paired_ratios};
pub use error::ReportError;
pub use gml::{export_to_path, to_gml_string, write_gml};
pub use results_file::{format_row, parse_table, ResultTable, ResultsFile};
pub use stats::SampleStats;
