use std::path::PathBuf;

use serde::Deserialize;

use crate::infra::config::{
    AppConfig, ExportConfig, LogConfig, ResolverConfig, StartupConfig, TelegramConfig,
};

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub logging: Option<FileLogConfig>,
    pub telegram: Option<FileTelegramConfig>,
    pub export: Option<FileExportConfig>,
    pub resolver: Option<FileResolverConfig>,
    pub startup: Option<FileStartupConfig>,
}

impl FileConfig {
    pub fn merge_into(self, config: &mut AppConfig) {
        if let Some(logging) = self.logging {
            logging.merge_into(&mut config.logging);
        }

        if let Some(telegram) = self.telegram {
            telegram.merge_into(&mut config.telegram);
        }

        if let Some(export) = self.export {
            export.merge_into(&mut config.export);
        }

        if let Some(resolver) = self.resolver {
            resolver.merge_into(&mut config.resolver);
        }

        if let Some(startup) = self.startup {
            startup.merge_into(&mut config.startup);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileLogConfig {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

impl FileLogConfig {
    fn merge_into(self, config: &mut LogConfig) {
        if let Some(level) = self.level {
            config.level = level;
        }

        if let Some(file) = self.file {
            config.file = Some(file);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileTelegramConfig {
    pub api_id: Option<i32>,
    pub api_hash: Option<String>,
    pub phone_number: Option<String>,
}

impl FileTelegramConfig {
    fn merge_into(self, config: &mut TelegramConfig) {
        if let Some(api_id) = self.api_id {
            config.api_id = api_id;
        }

        if let Some(api_hash) = self.api_hash {
            config.api_hash = api_hash;
        }

        if let Some(phone_number) = self.phone_number {
            let trimmed = phone_number.trim();
            config.phone_number = (!trimmed.is_empty()).then(|| trimmed.to_owned());
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileExportConfig {
    pub output_dir: Option<PathBuf>,
    pub master_list_name: Option<String>,
    pub folder_name: Option<String>,
}

impl FileExportConfig {
    fn merge_into(self, config: &mut ExportConfig) {
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }

        if let Some(name) = self.master_list_name {
            config.master_list_name = name;
        }

        if let Some(name) = self.folder_name {
            config.folder_name = name;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileResolverConfig {
    pub concurrency: Option<usize>,
}

impl FileResolverConfig {
    fn merge_into(self, config: &mut ResolverConfig) {
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileStartupConfig {
    pub folder_sync_timeout_ms: Option<u64>,
}

impl FileStartupConfig {
    fn merge_into(self, config: &mut StartupConfig) {
        if let Some(timeout_ms) = self.folder_sync_timeout_ms {
            config.folder_sync_timeout_ms = timeout_ms;
        }
    }
}
