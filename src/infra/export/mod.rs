//! File exporters for extracted records.

mod csv_writer;
mod json_writer;

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::{Local, NaiveDate};
use thiserror::Error;

use crate::{domain::record::ExportRecord, infra::contracts::Exporter};

/// Delimiter for list values flattened into a single CSV cell.
pub const LIST_DELIMITER: &str = ", ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    /// Comma separated values, one row per record.
    Csv,
    /// Pretty printed JSON array.
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export")]
    NoRecords,
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes `<base_name>_<YYYY-MM-DD>.<ext>` files under one directory.
#[derive(Debug, Clone)]
pub struct FileExporter {
    output_dir: PathBuf,
    date: Option<NaiveDate>,
}

impl FileExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            date: None,
        }
    }

    /// Pins the date stamped into file names.
    #[cfg(test)]
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn target_path(&self, base_name: &str, format: ExportFormat) -> PathBuf {
        let date = self.date.unwrap_or_else(|| Local::now().date_naive());
        self.output_dir.join(format!(
            "{base_name}_{}.{}",
            date.format("%Y-%m-%d"),
            format.extension()
        ))
    }
}

impl Exporter for FileExporter {
    fn export(
        &self,
        records: &[ExportRecord],
        base_name: &str,
        format: ExportFormat,
    ) -> Result<PathBuf, ExportError> {
        if records.is_empty() {
            return Err(ExportError::NoRecords);
        }

        let bytes = match format {
            ExportFormat::Csv => csv_writer::encode(records)?,
            ExportFormat::Json => json_writer::encode(records)?,
        };

        let path = self.target_path(base_name, format);
        write_atomically(&path, &bytes)?;

        tracing::info!(
            path = %path.display(),
            records = records.len(),
            format = format.extension(),
            "export written"
        );

        Ok(path)
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let io_error = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }

    let tmp_path = path.with_extension("partial");
    fs::write(&tmp_path, bytes).map_err(io_error)?;
    fs::rename(&tmp_path, path).map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        io_error(source)
    })
}
