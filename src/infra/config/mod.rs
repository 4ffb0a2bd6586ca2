mod adapter;
mod app_config;
mod file_config;
mod loader;

pub use adapter::FileConfigAdapter;
pub use app_config::{
    is_valid_phone, AppConfig, ExportConfig, LogConfig, ResolverConfig, StartupConfig,
    TelegramConfig,
};
pub use loader::load;
