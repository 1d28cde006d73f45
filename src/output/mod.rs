//! Output module for writing harvest results
//!
//! This module handles:
//! - Sanitizing text fields
//! - Projecting categories and products into table rows
//! - Writing the tables as CSV files
//! - Reporting run statistics

mod csv_output;
pub mod rows;
mod sanitize;
pub mod stats;
mod traits;

pub use csv_output::CsvOutput;
pub use sanitize::sanitize_text;
pub use stats::{print_statistics, HarvestStats};
pub use traits::{Cell, OutputError, OutputHandler, OutputResult, Row, Table, TableKind};
