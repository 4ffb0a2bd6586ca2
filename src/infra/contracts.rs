use std::path::PathBuf;

use crate::{
    domain::record::ExportRecord,
    infra::{config::AppConfig, error::AppError, export::ExportError, export::ExportFormat},
};

pub trait ConfigAdapter {
    fn load(&self) -> Result<AppConfig, AppError>;
}

/// Writes flat records to a destination selected by `format`.
pub trait Exporter: Send + Sync {
    fn export(
        &self,
        records: &[ExportRecord],
        base_name: &str,
        format: ExportFormat,
    ) -> Result<PathBuf, ExportError>;
}
