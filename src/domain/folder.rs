use super::{peer::PeerRef, record::ExportRecord};

/// Declarative membership rules of a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FolderRules {
    pub contacts: bool,
    pub non_contacts: bool,
    pub groups: bool,
    pub broadcasts: bool,
    pub bots: bool,
    pub exclude_muted: bool,
    pub exclude_read: bool,
    pub exclude_archived: bool,
}

/// Folder as defined on the account: explicit peer lists plus rules.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FolderDefinition {
    pub id: i32,
    pub title: String,
    pub emoticon: Option<String>,
    pub pinned_peers: Vec<PeerRef>,
    pub include_peers: Vec<PeerRef>,
    pub exclude_peers: Vec<PeerRef>,
    pub rules: FolderRules,
}

/// Final, resolved membership of one folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFolderRecord {
    pub folder_id: i32,
    pub title: String,
    pub emoticon: Option<String>,
    /// Platform order; may contain placeholders for unresolved peers.
    pub pinned: Vec<String>,
    /// Sorted and duplicate-free.
    pub included: Vec<String>,
    /// Platform order.
    pub excluded: Vec<String>,
    pub rules: FolderRules,
}

impl From<&ResolvedFolderRecord> for ExportRecord {
    fn from(record: &ResolvedFolderRecord) -> Self {
        let rules = record.rules;

        ExportRecord::new()
            .text("folder_name", record.title.clone())
            .integer("folder_id", i64::from(record.folder_id))
            .text(
                "emoticon",
                record.emoticon.clone().unwrap_or_else(|| "None".to_owned()),
            )
            .list("pinned_chats", record.pinned.clone())
            .list("included_chats", record.included.clone())
            .list("excluded_chats", record.excluded.clone())
            .flag("rule_contacts", rules.contacts)
            .flag("rule_non_contacts", rules.non_contacts)
            .flag("rule_groups", rules.groups)
            .flag("rule_channels", rules.broadcasts)
            .flag("rule_bots", rules.bots)
            .flag("rule_exclude_muted", rules.exclude_muted)
            .flag("rule_exclude_read", rules.exclude_read)
            .flag("rule_exclude_archived", rules.exclude_archived)
    }
}
