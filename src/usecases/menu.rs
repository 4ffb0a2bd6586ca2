use std::{collections::BTreeSet, io};

use crate::{
    domain::{chat_list::ChatTypeSelection, dialog::ChatType, record::ExportRecord},
    infra::export::{ExportError, ExportFormat},
    usecases::{
        context::{ExtractionSettings, RunContext, Services},
        extract::{extract_folders, extract_master_list, fetch_folders, parse_choices, FolderSelection},
        terminal::Terminal,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Exit,
}

/// Interactive main loop. Returns when the user picks exit or input ends.
pub async fn run_menu(
    terminal: &mut dyn Terminal,
    services: Services<'_>,
    settings: &ExtractionSettings,
) -> io::Result<()> {
    loop {
        terminal.print_line("")?;
        terminal.print_line("=== Telegram Folder Extractor ===")?;
        terminal.print_line("1. Extract master chat list")?;
        terminal.print_line("2. Extract chat folder information")?;
        terminal.print_line("3. Exit")?;

        let Some(choice) = terminal.prompt_line("Choice: ")? else {
            break;
        };

        let step = match choice.as_str() {
            "1" => master_list_flow(terminal, services, settings).await?,
            "2" => folder_flow(terminal, services, settings).await?,
            "3" => Step::Exit,
            _ => {
                terminal.print_line("Invalid choice. Enter 1, 2 or 3.")?;
                Step::Continue
            }
        };

        if step == Step::Exit {
            break;
        }
    }

    terminal.print_line("Goodbye.")?;
    Ok(())
}

/// Maps menu positions `1..=4` to chat types; `5` selects all four of them.
pub fn selection_from_choices(choices: &BTreeSet<usize>) -> ChatTypeSelection {
    const ALL: usize = ChatTypeSelection::SELECTABLE.len() + 1;

    if choices.contains(&ALL) {
        return ChatTypeSelection::named();
    }

    ChatTypeSelection::only(
        choices
            .iter()
            .filter_map(|choice| ChatTypeSelection::SELECTABLE.get(choice - 1).copied()),
    )
}

async fn master_list_flow(
    terminal: &mut dyn Terminal,
    services: Services<'_>,
    settings: &ExtractionSettings,
) -> io::Result<Step> {
    let Some(selection) = prompt_chat_types(terminal)? else {
        return Ok(Step::Exit);
    };

    terminal.print_line("Fetching chats...")?;
    let entries = match extract_master_list(services.dialogs, &selection).await {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(code = err.code(), "master list extraction failed");
            terminal.print_line(&err.to_string())?;
            return Ok(Step::Continue);
        }
    };

    if entries.is_empty() {
        terminal.print_line("No chats found matching your criteria.")?;
        return Ok(Step::Continue);
    }

    terminal.print_line(&format!("Found {} chats.", entries.len()))?;
    let records: Vec<ExportRecord> = entries.iter().map(ExportRecord::from).collect();
    export_flow(terminal, services, &records, &settings.master_list_name)
}

fn prompt_chat_types(terminal: &mut dyn Terminal) -> io::Result<Option<ChatTypeSelection>> {
    let all_position = ChatTypeSelection::SELECTABLE.len() + 1;

    terminal.print_line("Select chat types to include (comma separated):")?;
    for (index, chat_type) in ChatTypeSelection::SELECTABLE.iter().enumerate() {
        terminal.print_line(&format!("{}. {}", index + 1, chat_type_title(*chat_type)))?;
    }
    terminal.print_line(&format!("{all_position}. All"))?;

    loop {
        let Some(input) = terminal.prompt_line("Types: ")? else {
            return Ok(None);
        };

        match parse_choices(&input, all_position) {
            Some(choices) => return Ok(Some(selection_from_choices(&choices))),
            None => terminal.print_line(&format!(
                "Invalid selection. Enter numbers between 1 and {all_position}, e.g. 1,3."
            ))?,
        }
    }
}

fn chat_type_title(chat_type: ChatType) -> &'static str {
    match chat_type {
        ChatType::Personal => "Personal chats",
        ChatType::Group => "Groups",
        ChatType::Channel => "Channels",
        ChatType::Bot => "Bots",
        ChatType::Unknown => "Unknown",
    }
}

async fn folder_flow(
    terminal: &mut dyn Terminal,
    services: Services<'_>,
    settings: &ExtractionSettings,
) -> io::Result<Step> {
    terminal.print_line("Fetching chat folders...")?;
    let folders = match fetch_folders(services.folders).await {
        Ok(folders) => folders,
        Err(err) => {
            tracing::warn!(code = err.code(), "folder listing failed");
            terminal.print_line(&err.to_string())?;
            return Ok(Step::Continue);
        }
    };

    if folders.is_empty() {
        terminal.print_line("No chat folders found in your account.")?;
        return Ok(Step::Continue);
    }

    terminal.print_line("Available folders:")?;
    for (index, folder) in folders.iter().enumerate() {
        let emoticon = folder
            .emoticon
            .as_deref()
            .map(|emoticon| format!(" {emoticon}"))
            .unwrap_or_default();
        terminal.print_line(&format!(
            "{}. {}{} (ID: {})",
            index + 1,
            folder.title,
            emoticon,
            folder.id
        ))?;
    }
    let all_position = folders.len() + 1;
    terminal.print_line(&format!("{all_position}. All Folders"))?;

    let selection = loop {
        let Some(input) = terminal.prompt_line("Folders to extract (comma separated): ")? else {
            return Ok(Step::Exit);
        };

        match parse_choices(&input, all_position) {
            Some(choices) if choices.contains(&all_position) => break FolderSelection::All,
            Some(choices) => break FolderSelection::Positions(choices),
            None => terminal.print_line(&format!(
                "Invalid selection. Enter numbers between 1 and {all_position}."
            ))?,
        }
    };

    let chosen = selection.apply(folders);
    let ctx = RunContext::new("folders", settings.resolve_concurrency);

    terminal.print_line(&format!("Resolving {} folder(s)...", chosen.len()))?;
    let resolved = match extract_folders(&ctx, services.dialogs, &chosen).await {
        Ok(resolved) => resolved,
        Err(err) => {
            tracing::warn!(code = err.code(), "folder extraction failed");
            terminal.print_line(&err.to_string())?;
            return Ok(Step::Continue);
        }
    };

    for record in &resolved {
        terminal.print_line(&format!(
            "{}: {} pinned, {} included, {} excluded",
            record.title,
            record.pinned.len(),
            record.included.len(),
            record.excluded.len()
        ))?;
    }

    let unresolved = ctx.unresolved_peers();
    if unresolved > 0 {
        terminal.print_line(&format!(
            "Note: {unresolved} chat(s) could not be resolved and are listed as placeholders."
        ))?;
    }

    let records: Vec<ExportRecord> = resolved.iter().map(ExportRecord::from).collect();
    export_flow(terminal, services, &records, &settings.folder_export_name)
}

/// Asks for a format and writes the records, offering a retry on failure.
/// The records stay in memory across retries.
fn export_flow(
    terminal: &mut dyn Terminal,
    services: Services<'_>,
    records: &[ExportRecord],
    base_name: &str,
) -> io::Result<Step> {
    let Some(format) = prompt_format(terminal)? else {
        return Ok(Step::Exit);
    };

    loop {
        match services.exporter.export(records, base_name, format) {
            Ok(path) => {
                terminal.print_line(&format!(
                    "Exported {} record(s) to {}",
                    records.len(),
                    path.display()
                ))?;
                return Ok(Step::Continue);
            }
            Err(ExportError::NoRecords) => {
                terminal.print_line("Nothing to export.")?;
                return Ok(Step::Continue);
            }
            Err(err) => {
                tracing::warn!(error = %err, "export failed");
                terminal.print_line(&format!("EXPORT_FAILED: {err}"))?;
            }
        }

        let Some(answer) = terminal.prompt_line("Retry export? [y/N]: ")? else {
            return Ok(Step::Exit);
        };
        if !answer.eq_ignore_ascii_case("y") {
            terminal.print_line("Export skipped.")?;
            return Ok(Step::Continue);
        }
    }
}

fn prompt_format(terminal: &mut dyn Terminal) -> io::Result<Option<ExportFormat>> {
    terminal.print_line("Export format:")?;
    terminal.print_line("1. CSV")?;
    terminal.print_line("2. JSON")?;

    loop {
        let Some(input) = terminal.prompt_line("Format: ")? else {
            return Ok(None);
        };

        match input.to_ascii_lowercase().as_str() {
            "1" | "csv" => return Ok(Some(ExportFormat::Csv)),
            "2" | "json" => return Ok(Some(ExportFormat::Json)),
            _ => terminal.print_line("Invalid format. Enter 1 or 2.")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            dialog::fixtures::{channel, dialog, group, user},
            folder::{FolderDefinition, FolderRules},
            peer::PeerRef,
            record::FieldValue,
        },
        infra::stubs::{RecordingExporter, StubAccount},
        usecases::{contracts::SourceError, terminal::fake::FakeTerminal},
    };

    fn settings() -> ExtractionSettings {
        ExtractionSettings {
            master_list_name: "master".to_owned(),
            folder_export_name: "folders".to_owned(),
            resolve_concurrency: 4,
        }
    }

    fn services<'a>(account: &'a StubAccount, exporter: &'a RecordingExporter) -> Services<'a> {
        Services {
            dialogs: account,
            folders: account,
            exporter,
        }
    }

    fn work_folder() -> FolderDefinition {
        FolderDefinition {
            id: 2,
            title: "Work".to_owned(),
            emoticon: Some("💼".to_owned()),
            include_peers: vec![PeerRef::User(10)],
            rules: FolderRules {
                groups: true,
                ..FolderRules::default()
            },
            ..FolderDefinition::default()
        }
    }

    #[test]
    fn all_choice_overrides_individual_types() {
        assert_eq!(
            selection_from_choices(&BTreeSet::from([1, 5])),
            ChatTypeSelection::named()
        );
        assert_eq!(
            selection_from_choices(&BTreeSet::from([2, 4])),
            ChatTypeSelection::only([ChatType::Group, ChatType::Bot])
        );
    }

    #[tokio::test]
    async fn master_list_is_exported_in_chosen_format() {
        let account = StubAccount::with_dialogs(vec![
            user(1, "Ann", true, false),
            group(2, "Team"),
            channel(3, "News"),
        ]);
        let exporter = RecordingExporter::default();
        let mut terminal =
            FakeTerminal::new(vec![Some("1"), Some("9"), Some("2,3"), Some("2"), Some("3")]);

        run_menu(&mut terminal, services(&account, &exporter), &settings())
            .await
            .expect("menu should run");

        let exported = exporter.exported();
        assert_eq!(exported.len(), 1);
        let (base_name, format, records) = &exported[0];
        assert_eq!(base_name, "master");
        assert_eq!(*format, ExportFormat::Json);
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[1].get("chat_type"),
            Some(&FieldValue::Text("Channel".to_owned()))
        );
        assert!(terminal.joined().contains("Invalid selection"));
    }

    #[tokio::test]
    async fn all_types_choice_leaves_out_unknown_dialogs() {
        let account = StubAccount::with_dialogs(vec![
            user(1, "Ann", true, false),
            dialog(2, "Ghost"),
            channel(3, "News"),
        ]);
        let exporter = RecordingExporter::default();
        let mut terminal = FakeTerminal::new(vec![Some("1"), Some("5"), Some("1"), Some("3")]);

        run_menu(&mut terminal, services(&account, &exporter), &settings())
            .await
            .expect("menu should run");

        let exported = exporter.exported();
        let names: Vec<_> = exported[0]
            .2
            .iter()
            .map(|record| record.get("chat_name").cloned())
            .collect();
        assert_eq!(
            names,
            [
                Some(FieldValue::Text("Ann".to_owned())),
                Some(FieldValue::Text("News".to_owned())),
            ]
        );
    }

    #[tokio::test]
    async fn empty_master_list_skips_export() {
        let account = StubAccount::with_dialogs(vec![group(2, "Team")]);
        let exporter = RecordingExporter::default();
        let mut terminal = FakeTerminal::new(vec![Some("1"), Some("4"), Some("3")]);

        run_menu(&mut terminal, services(&account, &exporter), &settings())
            .await
            .expect("menu should run");

        assert!(exporter.exported().is_empty());
        assert!(terminal
            .joined()
            .contains("No chats found matching your criteria."));
    }

    #[tokio::test]
    async fn dialog_fetch_failure_returns_to_menu() {
        let account = StubAccount {
            dialogs_error: Some(SourceError::Unavailable("timeout".to_owned())),
            ..StubAccount::default()
        };
        let exporter = RecordingExporter::default();
        let mut terminal = FakeTerminal::new(vec![Some("1"), Some("5"), Some("3")]);

        run_menu(&mut terminal, services(&account, &exporter), &settings())
            .await
            .expect("menu should run");

        let output = terminal.joined();
        assert!(output.contains("FETCH_DIALOGS_FAILED"));
        assert!(output.ends_with("Goodbye."));
        assert!(exporter.exported().is_empty());
    }

    #[tokio::test]
    async fn folders_are_resolved_and_exported() {
        let mut account = StubAccount::with_dialogs(vec![group(1, "Team")]).user(10, "Zed");
        account.folders = vec![work_folder()];
        let exporter = RecordingExporter::default();
        let mut terminal = FakeTerminal::new(vec![Some("2"), Some("2"), Some("1"), Some("3")]);

        run_menu(&mut terminal, services(&account, &exporter), &settings())
            .await
            .expect("menu should run");

        let output = terminal.joined();
        assert!(output.contains("1. Work 💼 (ID: 2)"));
        assert!(output.contains("2. All Folders"));
        assert!(output.contains("Work: 0 pinned, 2 included, 0 excluded"));

        let exported = exporter.exported();
        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0].0, "folders");
        assert_eq!(exported[0].1, ExportFormat::Csv);
        assert_eq!(
            exported[0].2[0].get("included_chats"),
            Some(&FieldValue::List(vec!["Team".to_owned(), "Zed".to_owned()]))
        );
    }

    #[tokio::test]
    async fn unresolved_peers_are_reported() {
        let mut account = StubAccount::with_dialogs(vec![]);
        account.folders = vec![work_folder()];
        let exporter = RecordingExporter::default();
        let mut terminal = FakeTerminal::new(vec![Some("2"), Some("1"), Some("2"), Some("3")]);

        run_menu(&mut terminal, services(&account, &exporter), &settings())
            .await
            .expect("menu should run");

        assert!(terminal
            .joined()
            .contains("Note: 1 chat(s) could not be resolved"));
        assert_eq!(
            exporter.exported()[0].2[0].get("included_chats"),
            Some(&FieldValue::List(vec![
                "Unknown/Inaccessible Entity (ID: 10)".to_owned()
            ]))
        );
    }

    #[tokio::test]
    async fn account_without_folders_is_reported() {
        let account = StubAccount::default();
        let exporter = RecordingExporter::default();
        let mut terminal = FakeTerminal::new(vec![Some("2"), Some("3")]);

        run_menu(&mut terminal, services(&account, &exporter), &settings())
            .await
            .expect("menu should run");

        assert!(terminal
            .joined()
            .contains("No chat folders found in your account."));
    }

    #[tokio::test]
    async fn folder_listing_failure_is_one_line() {
        let account = StubAccount {
            folders_error: Some(SourceError::Unauthorized),
            ..StubAccount::default()
        };
        let exporter = RecordingExporter::default();
        let mut terminal = FakeTerminal::new(vec![Some("2"), Some("3")]);

        run_menu(&mut terminal, services(&account, &exporter), &settings())
            .await
            .expect("menu should run");

        let failure: Vec<_> = terminal
            .output
            .iter()
            .filter(|line| line.contains("FETCH_FOLDERS_FAILED"))
            .collect();
        assert_eq!(failure.len(), 1);
        assert!(!failure[0].contains('\n'));
    }

    #[tokio::test]
    async fn failed_export_can_be_retried() {
        let account = StubAccount::with_dialogs(vec![group(2, "Team")]);
        let exporter = RecordingExporter::failing(1);
        let mut terminal = FakeTerminal::new(vec![
            Some("1"),
            Some("5"),
            Some("1"),
            Some("y"),
            Some("3"),
        ]);

        run_menu(&mut terminal, services(&account, &exporter), &settings())
            .await
            .expect("menu should run");

        assert!(terminal.joined().contains("EXPORT_FAILED"));
        assert_eq!(exporter.exported().len(), 1);
    }

    #[tokio::test]
    async fn eof_exits_from_any_prompt() {
        let account = StubAccount::with_dialogs(vec![group(2, "Team")]);
        let exporter = RecordingExporter::default();
        let mut terminal = FakeTerminal::new(vec![Some("1"), Some("5")]);

        run_menu(&mut terminal, services(&account, &exporter), &settings())
            .await
            .expect("menu should run");

        assert!(exporter.exported().is_empty());
        assert!(terminal.joined().ends_with("Goodbye."));
    }
}
