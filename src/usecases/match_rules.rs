use std::collections::BTreeSet;

use crate::domain::{dialog::Dialog, folder::FolderRules};

/// Names of the dialogs a folder picks up through its rules alone.
///
/// Exclusion rules are checked first and drop a dialog outright; only the
/// survivors are tested against the inclusion rules. Dialogs sharing a name
/// collapse into one entry.
pub fn match_rules(rules: &FolderRules, dialogs: &[Dialog]) -> BTreeSet<String> {
    dialogs
        .iter()
        .filter(|dialog| !is_excluded(rules, dialog))
        .filter(|dialog| is_included(rules, dialog))
        .map(|dialog| dialog.name.clone())
        .collect()
}

fn is_excluded(rules: &FolderRules, dialog: &Dialog) -> bool {
    (rules.exclude_muted && dialog.muted)
        || (rules.exclude_read && dialog.is_read())
        || (rules.exclude_archived && dialog.archived)
}

fn is_included(rules: &FolderRules, dialog: &Dialog) -> bool {
    (rules.contacts && dialog.is_contact())
        || (rules.groups && dialog.is_group)
        || (rules.broadcasts && dialog.is_channel)
        || (rules.bots && dialog.is_bot())
        || (rules.non_contacts && dialog.is_personal_noncontact())
}
