use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::infra::error::AppError;

const API_HASH_PLACEHOLDER: &str = "replace-me";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppConfig {
    pub logging: LogConfig,
    pub telegram: TelegramConfig,
    pub export: ExportConfig,
    pub resolver: ResolverConfig,
    pub startup: StartupConfig,
}

impl AppConfig {
    /// Rejects settings the extractor cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.telegram.api_id <= 0 {
            return Err(invalid("telegram.api_id", "must be a positive number"));
        }

        let api_hash = self.telegram.api_hash.trim();
        if api_hash.is_empty() || api_hash == API_HASH_PLACEHOLDER {
            return Err(invalid(
                "telegram.api_hash",
                "must be set to the hash issued for your api_id",
            ));
        }

        if let Some(phone) = self.telegram.phone_number.as_deref() {
            if !is_valid_phone(phone) {
                return Err(invalid(
                    "telegram.phone_number",
                    "use + followed by 8-15 digits",
                ));
            }
        }

        if self.export.master_list_name.trim().is_empty() {
            return Err(invalid("export.master_list_name", "must not be empty"));
        }

        if self.export.folder_name.trim().is_empty() {
            return Err(invalid("export.folder_name", "must not be empty"));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> AppError {
    AppError::ConfigInvalid {
        field,
        reason: reason.to_owned(),
    }
}

pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or_default();
    phone.starts_with('+')
        && (8..=15).contains(&digits.len())
        && digits.chars().all(|ch| ch.is_ascii_digit())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TelegramConfig {
    pub api_id: i32,
    pub api_hash: String,
    pub phone_number: Option<String>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_id: 0,
            api_hash: API_HASH_PLACEHOLDER.to_owned(),
            phone_number: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub master_list_name: String,
    pub folder_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            master_list_name: "telegram_master_list".to_owned(),
            folder_name: "telegram_folders".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolverConfig {
    pub concurrency: usize,
}

impl ResolverConfig {
    pub fn normalized_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { concurrency: 16 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartupConfig {
    pub folder_sync_timeout_ms: u64,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            folder_sync_timeout_ms: 3_000,
        }
    }
}
