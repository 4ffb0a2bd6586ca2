//! Non-interactive extraction commands for scripting.

use std::{collections::BTreeSet, path::PathBuf};

use anyhow::{bail, Context};

use crate::{
    domain::{chat_list::ChatTypeSelection, record::ExportRecord},
    infra::export::ExportFormat,
    usecases::{
        context::{ExtractionSettings, RunContext, Services},
        extract::{extract_folders, extract_master_list, fetch_folders, FolderSelection},
    },
};

/// Extracts the master list and writes it. `None` means nothing matched.
pub async fn export_chats(
    services: Services<'_>,
    settings: &ExtractionSettings,
    selection: &ChatTypeSelection,
    format: ExportFormat,
) -> anyhow::Result<Option<PathBuf>> {
    let entries = extract_master_list(services.dialogs, selection).await?;
    if entries.is_empty() {
        return Ok(None);
    }

    let records: Vec<ExportRecord> = entries.iter().map(ExportRecord::from).collect();
    let path = services
        .exporter
        .export(&records, &settings.master_list_name, format)
        .context("EXPORT_FAILED")?;

    Ok(Some(path))
}

/// Resolves the selected folders (all when `positions` is empty) and writes
/// them. `None` means the account has no folders.
pub async fn export_folders(
    services: Services<'_>,
    settings: &ExtractionSettings,
    positions: &[usize],
    format: ExportFormat,
) -> anyhow::Result<Option<PathBuf>> {
    let folders = fetch_folders(services.folders).await?;
    if folders.is_empty() {
        return Ok(None);
    }

    let selection = folder_selection(positions, folders.len())?;
    let chosen = selection.apply(folders);

    let ctx = RunContext::new("folders", settings.resolve_concurrency);
    let resolved = extract_folders(&ctx, services.dialogs, &chosen).await?;
    if ctx.unresolved_peers() > 0 {
        tracing::warn!(
            unresolved = ctx.unresolved_peers(),
            "some chats were exported as placeholders"
        );
    }

    let records: Vec<ExportRecord> = resolved.iter().map(ExportRecord::from).collect();
    let path = services
        .exporter
        .export(&records, &settings.folder_export_name, format)
        .context("EXPORT_FAILED")?;

    Ok(Some(path))
}

fn folder_selection(positions: &[usize], available: usize) -> anyhow::Result<FolderSelection> {
    if positions.is_empty() {
        return Ok(FolderSelection::All);
    }

    if let Some(bad) = positions
        .iter()
        .find(|position| !(1..=available).contains(*position))
    {
        bail!("FOLDER_SELECTION_INVALID: {bad} is outside 1..={available}");
    }

    Ok(FolderSelection::Positions(
        positions.iter().copied().collect::<BTreeSet<_>>(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            dialog::{
                fixtures::{channel, group},
                ChatType,
            },
            folder::FolderDefinition,
        },
        infra::stubs::{RecordingExporter, StubAccount},
    };

    fn settings() -> ExtractionSettings {
        ExtractionSettings {
            master_list_name: "master".to_owned(),
            folder_export_name: "folders".to_owned(),
            resolve_concurrency: 2,
        }
    }

    fn folder(id: i32, title: &str) -> FolderDefinition {
        FolderDefinition {
            id,
            title: title.to_owned(),
            ..FolderDefinition::default()
        }
    }

    #[tokio::test]
    async fn chats_command_exports_selected_types() {
        let account = StubAccount::with_dialogs(vec![group(1, "Team"), channel(2, "News")]);
        let exporter = RecordingExporter::default();
        let services = Services {
            dialogs: &account,
            folders: &account,
            exporter: &exporter,
        };

        let path = export_chats(
            services,
            &settings(),
            &ChatTypeSelection::only([ChatType::Channel]),
            ExportFormat::Csv,
        )
        .await
        .expect("command should succeed");

        assert_eq!(path, Some(PathBuf::from("master.csv")));
        assert_eq!(exporter.exported()[0].2.len(), 1);
    }

    #[tokio::test]
    async fn chats_command_without_matches_writes_nothing() {
        let account = StubAccount::with_dialogs(vec![group(1, "Team")]);
        let exporter = RecordingExporter::default();
        let services = Services {
            dialogs: &account,
            folders: &account,
            exporter: &exporter,
        };

        let path = export_chats(
            services,
            &settings(),
            &ChatTypeSelection::only([ChatType::Bot]),
            ExportFormat::Json,
        )
        .await
        .expect("command should succeed");

        assert_eq!(path, None);
        assert!(exporter.exported().is_empty());
    }

    #[tokio::test]
    async fn folders_command_honours_positions() {
        let mut account = StubAccount::default();
        account.folders = vec![folder(4, "A"), folder(5, "B"), folder(6, "C")];
        let exporter = RecordingExporter::default();
        let services = Services {
            dialogs: &account,
            folders: &account,
            exporter: &exporter,
        };

        export_folders(services, &settings(), &[3, 1], ExportFormat::Json)
            .await
            .expect("command should succeed");

        let exported = exporter.exported();
        let titles: Vec<_> = exported[0]
            .2
            .iter()
            .map(|record| record.get("folder_name").cloned())
            .collect();
        assert_eq!(titles.len(), 2);
        assert_eq!(
            titles[0],
            Some(crate::domain::record::FieldValue::Text("A".to_owned()))
        );
    }

    #[tokio::test]
    async fn folders_command_rejects_out_of_range_positions() {
        let mut account = StubAccount::default();
        account.folders = vec![folder(4, "A")];
        let exporter = RecordingExporter::default();
        let services = Services {
            dialogs: &account,
            folders: &account,
            exporter: &exporter,
        };

        let err = export_folders(services, &settings(), &[2], ExportFormat::Csv)
            .await
            .expect_err("position 2 does not exist");

        assert!(err.to_string().starts_with("FOLDER_SELECTION_INVALID"));
        assert!(exporter.exported().is_empty());
    }

    #[tokio::test]
    async fn export_failure_carries_a_code() {
        let account = StubAccount::with_dialogs(vec![group(1, "Team")]);
        let exporter = RecordingExporter::failing(1);
        let services = Services {
            dialogs: &account,
            folders: &account,
            exporter: &exporter,
        };

        let err = export_chats(services, &settings(), &ChatTypeSelection::all(), ExportFormat::Csv)
            .await
            .expect_err("export should fail");

        assert_eq!(err.to_string(), "EXPORT_FAILED");
    }
}
