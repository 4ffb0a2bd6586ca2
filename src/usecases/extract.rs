use std::collections::BTreeSet;

use thiserror::Error;
use tracing::Instrument;

use crate::{
    domain::{
        chat_list::{ChatListEntry, ChatTypeSelection},
        folder::{FolderDefinition, ResolvedFolderRecord},
    },
    usecases::{
        context::RunContext,
        contracts::{DialogSource, FolderSource, SourceError},
        resolve_folder::resolve_folder,
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("FETCH_FOLDERS_FAILED: could not fetch chat folders ({0})")]
    Folders(#[source] SourceError),
    #[error("FETCH_DIALOGS_FAILED: could not fetch dialogs ({0})")]
    Dialogs(#[source] SourceError),
}

impl ExtractionError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Folders(_) => "FETCH_FOLDERS_FAILED",
            Self::Dialogs(_) => "FETCH_DIALOGS_FAILED",
        }
    }
}

/// Which of the listed folders to extract, by 1-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderSelection {
    All,
    Positions(BTreeSet<usize>),
}

impl FolderSelection {
    pub fn apply(&self, folders: Vec<FolderDefinition>) -> Vec<FolderDefinition> {
        match self {
            Self::All => folders,
            Self::Positions(positions) => folders
                .into_iter()
                .enumerate()
                .filter(|(index, _)| positions.contains(&(index + 1)))
                .map(|(_, folder)| folder)
                .collect(),
        }
    }
}

/// Parses comma separated choices such as `1, 3,4`. Every choice has to be
/// within `1..=max`; anything else rejects the whole input.
pub fn parse_choices(input: &str, max: usize) -> Option<BTreeSet<usize>> {
    let choices = input
        .split(',')
        .map(|part| part.trim().parse::<usize>().ok())
        .collect::<Option<BTreeSet<_>>>()?;

    let in_range = choices.iter().all(|choice| (1..=max).contains(choice));
    (in_range && !choices.is_empty()).then_some(choices)
}

pub async fn extract_master_list(
    source: &dyn DialogSource,
    selection: &ChatTypeSelection,
) -> Result<Vec<ChatListEntry>, ExtractionError> {
    tracing::info!(types = ?selection.labels(), "fetching chats");

    let dialogs = source.list_dialogs().await.map_err(ExtractionError::Dialogs)?;
    let entries: Vec<ChatListEntry> = dialogs
        .iter()
        .map(ChatListEntry::from)
        .filter(|entry| selection.accepts(entry.chat_type))
        .collect();

    tracing::info!(
        total = dialogs.len(),
        matched = entries.len(),
        "master chat list extracted"
    );

    Ok(entries)
}

pub async fn fetch_folders(
    source: &dyn FolderSource,
) -> Result<Vec<FolderDefinition>, ExtractionError> {
    let folders = source.list_folders().await.map_err(ExtractionError::Folders)?;
    tracing::info!(folders = folders.len(), "chat folders fetched");
    Ok(folders)
}

/// Resolves the given folders one after another against a single dialog
/// snapshot fetched up front.
pub async fn extract_folders(
    ctx: &RunContext,
    source: &dyn DialogSource,
    folders: &[FolderDefinition],
) -> Result<Vec<ResolvedFolderRecord>, ExtractionError> {
    async {
        tracing::info!("prefetching dialogs for rule matching");
        let dialogs = source.list_dialogs().await.map_err(ExtractionError::Dialogs)?;
        tracing::info!(dialogs = dialogs.len(), "dialog snapshot ready");

        let mut records = Vec::with_capacity(folders.len());
        for folder in folders {
            tracing::info!(folder_id = folder.id, title = %folder.title, "processing folder");
            records.push(resolve_folder(ctx, source, folder, &dialogs).await);
        }

        Ok(records)
    }
    .instrument(ctx.span().clone())
    .await
}
