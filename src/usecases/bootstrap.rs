use std::path::Path;

use crate::{
    infra::{self, config::FileConfigAdapter, contracts::ConfigAdapter, error::AppError},
    usecases::context::AppContext,
};

pub fn bootstrap(config_path: Option<&Path>) -> Result<AppContext, AppError> {
    let mut context = build_context(config_path)?;
    context.logging = Some(infra::logging::init(&context.config.logging)?);

    tracing::debug!(
        concurrency = context.config.resolver.normalized_concurrency(),
        output_dir = %context.config.export.output_dir.display(),
        "configuration loaded"
    );

    Ok(context)
}

fn build_context(config_path: Option<&Path>) -> Result<AppContext, AppError> {
    let config_adapter = FileConfigAdapter::new(config_path);
    let config = config_adapter.load()?;

    Ok(AppContext::new(config))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("config.toml");
        fs::write(&path, body).expect("write config");
        path
    }

    #[test]
    fn missing_file_asks_for_api_credentials() {
        let err = build_context(Some(Path::new("./missing-config.toml")))
            .expect_err("defaults carry no api credentials");

        assert!(matches!(
            err,
            AppError::ConfigInvalid {
                field: "telegram.api_id",
                ..
            }
        ));
    }

    #[test]
    fn builds_context_from_valid_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_config(
            dir.path(),
            "[telegram]\napi_id = 42\napi_hash = \"abcdef\"\n[resolver]\nconcurrency = 4\n",
        );

        let context = build_context(Some(&path)).expect("context should build");

        assert_eq!(context.config.telegram.api_id, 42);
        assert_eq!(context.config.resolver.concurrency, 4);
        assert!(context.logging.is_none());
    }

    #[test]
    fn invalid_values_stop_bootstrap() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_config(
            dir.path(),
            "[telegram]\napi_id = 42\napi_hash = \"abcdef\"\nphone_number = \"12345\"\n",
        );

        let err = build_context(Some(&path)).expect_err("bad phone should be rejected");

        assert!(matches!(
            err,
            AppError::ConfigInvalid {
                field: "telegram.phone_number",
                ..
            }
        ));
    }
}
