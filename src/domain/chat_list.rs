use std::collections::BTreeSet;

use super::{
    dialog::{ChatType, Dialog},
    record::ExportRecord,
};

/// One row of the master chat list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatListEntry {
    pub chat_name: String,
    pub chat_type: ChatType,
    pub chat_id: i64,
    pub is_archived: bool,
}

impl From<&Dialog> for ChatListEntry {
    fn from(dialog: &Dialog) -> Self {
        Self {
            chat_name: dialog.name.clone(),
            chat_type: dialog.classify(),
            chat_id: dialog.id,
            is_archived: dialog.archived,
        }
    }
}

impl From<&ChatListEntry> for ExportRecord {
    fn from(entry: &ChatListEntry) -> Self {
        ExportRecord::new()
            .text("chat_name", entry.chat_name.clone())
            .text("chat_type", entry.chat_type.as_label())
            .integer("chat_id", entry.chat_id)
            .flag("is_archived", entry.is_archived)
    }
}

/// Chat categories to keep in the master list. Empty keeps everything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatTypeSelection {
    types: BTreeSet<ChatType>,
}

impl ChatTypeSelection {
    pub const SELECTABLE: [ChatType; 4] = [
        ChatType::Personal,
        ChatType::Group,
        ChatType::Channel,
        ChatType::Bot,
    ];

    pub fn all() -> Self {
        Self::default()
    }

    /// The four menu categories; dialogs of unknown type are left out.
    pub fn named() -> Self {
        Self::only(Self::SELECTABLE)
    }

    pub fn only(types: impl IntoIterator<Item = ChatType>) -> Self {
        Self {
            types: types.into_iter().collect(),
        }
    }

    pub fn accepts(&self, chat_type: ChatType) -> bool {
        self.types.is_empty() || self.types.contains(&chat_type)
    }

    pub fn labels(&self) -> Vec<&'static str> {
        if self.types.is_empty() {
            return vec!["All"];
        }

        self.types.iter().map(|chat_type| chat_type.as_label()).collect()
    }
}
