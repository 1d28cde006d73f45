//! Output handler traits and types
//!
//! This module defines the trait interface for output handlers and the
//! tables they receive.

use super::sanitize::sanitize_text;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// The tables produced by a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// Every category visited while resolving the scrape scope
    Categories,
    /// The leaf categories selected for scraping
    CategoriesToParse,
    /// One row per enriched product
    Products,
}

impl TableKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            TableKind::Categories => "categories.csv",
            TableKind::CategoriesToParse => "categories_to_parse.csv",
            TableKind::Products => "products.csv",
        }
    }
}

/// A single output value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Absent value, rendered as an empty field
    Null,
    /// Already sanitized and quoted text
    Text(String),
    Int(i64),
    /// Rendered with two decimals
    Decimal(f64),
}

impl Cell {
    /// Sanitized text; text that is empty after cleaning becomes `Null`
    pub fn text(value: &str) -> Self {
        sanitize_text(value).map_or(Cell::Null, Cell::Text)
    }

    pub fn opt_text(value: Option<&str>) -> Self {
        value.map_or(Cell::Null, Cell::text)
    }

    /// Whole quantities render as integers, fractional ones with two decimals
    pub fn quantity(value: f64) -> Self {
        if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            Cell::Int(value as i64)
        } else {
            Cell::Decimal(value)
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn render(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Text(text) => text.clone(),
            Cell::Int(value) => value.to_string(),
            Cell::Decimal(value) => format!("{:.2}", value),
        }
    }
}

pub type Row = Vec<Cell>;

/// A header plus rows of equal width
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(header: &[&str]) -> Self {
        Self {
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a header column
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }
}

/// Trait for output handlers
///
/// Output handlers persist the tables of a run. Implementations must be
/// thread-safe.
pub trait OutputHandler: Send + Sync {
    /// Writes (or replaces) one table
    ///
    /// # Arguments
    ///
    /// * `kind` - Which table is being written
    /// * `table` - Header and rows
    fn write_table(&self, kind: TableKind, table: &Table) -> OutputResult<()>;
}
