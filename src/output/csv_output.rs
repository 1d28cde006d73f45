//! CSV output handler implementation
//!
//! Writes every table as a `;`-separated file in the output directory. Text
//! cells arrive already quoted by the sanitizer, so the writer never adds
//! quotes of its own.

use crate::output::traits::{Cell, OutputError, OutputHandler, OutputResult, Table, TableKind};
use csv::{QuoteStyle, WriterBuilder};
use std::fs;
use std::path::{Path, PathBuf};

pub const DELIMITER: u8 = b';';

/// File-backed output handler
#[derive(Debug, Clone)]
pub struct CsvOutput {
    directory: PathBuf,
}

impl CsvOutput {
    /// Creates a new CSV output handler
    ///
    /// # Arguments
    ///
    /// * `directory` - Directory receiving the tables; created on first write
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Location of a table's file
    pub fn path_for(&self, kind: TableKind) -> PathBuf {
        self.directory.join(kind.file_name())
    }
}

impl OutputHandler for CsvOutput {
    fn write_table(&self, kind: TableKind, table: &Table) -> OutputResult<()> {
        let width = table.header.len();
        if let Some(index) = table.rows.iter().position(|row| row.len() != width) {
            return Err(OutputError::Write(format!(
                "row {} of {} has {} fields, expected {}",
                index,
                kind.file_name(),
                table.rows[index].len(),
                width
            )));
        }

        fs::create_dir_all(&self.directory)?;
        let path = self.path_for(kind);
        tracing::info!("Saving {} rows to '{}'", table.len(), path.display());

        let mut writer = WriterBuilder::new()
            .delimiter(DELIMITER)
            .quote_style(QuoteStyle::Never)
            .from_path(&path)?;

        writer.write_record(&table.header)?;
        for row in &table.rows {
            writer.write_record(row.iter().map(Cell::render))?;
        }
        writer.flush()?;

        Ok(())
    }
}
