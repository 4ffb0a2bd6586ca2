use std::collections::{BTreeSet, HashSet};

use crate::{
    domain::{
        dialog::Dialog,
        folder::{FolderDefinition, ResolvedFolderRecord},
    },
    usecases::{
        context::RunContext, contracts::DialogSource, match_rules::match_rules,
        resolve_names::resolve_names,
    },
};

/// Computes the concrete membership of one folder against a dialog snapshot.
pub async fn resolve_folder(
    ctx: &RunContext,
    source: &dyn DialogSource,
    folder: &FolderDefinition,
    dialogs: &[Dialog],
) -> ResolvedFolderRecord {
    let (pinned, explicitly_included, excluded) = futures::join!(
        resolve_names(ctx, source, &folder.pinned_peers),
        resolve_names(ctx, source, &folder.include_peers),
        resolve_names(ctx, source, &folder.exclude_peers),
    );

    let rule_based = match_rules(&folder.rules, dialogs);
    let included = merge_membership(&explicitly_included, rule_based, &excluded);

    tracing::debug!(
        folder_id = folder.id,
        pinned = pinned.len(),
        included = included.len(),
        excluded = excluded.len(),
        "folder membership resolved"
    );

    ResolvedFolderRecord {
        folder_id: folder.id,
        title: folder.title.clone(),
        emoticon: folder.emoticon.clone(),
        pinned,
        included,
        excluded,
        rules: folder.rules,
    }
}

/// `(explicit ∪ rule_based) − excluded`, sorted and duplicate-free.
/// Explicit exclusion wins over both kinds of inclusion.
pub fn merge_membership(
    explicitly_included: &[String],
    rule_based: BTreeSet<String>,
    excluded: &[String],
) -> Vec<String> {
    let excluded: HashSet<&str> = excluded.iter().map(String::as_str).collect();

    let mut combined = rule_based;
    combined.extend(explicitly_included.iter().cloned());
    combined.retain(|name| !excluded.contains(name.as_str()));

    combined.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            dialog::fixtures::{channel, group, user},
            folder::FolderRules,
            peer::PeerRef,
        },
        infra::stubs::StubAccount,
    };

    fn owned(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    fn team_dialogs() -> Vec<Dialog> {
        let mut beta = group(2, "Team Beta");
        beta.archived = true;
        vec![group(1, "Team Alpha"), beta, channel(3, "News")]
    }

    #[test]
    fn merge_unions_explicit_and_rule_based_members() {
        let rule_based: BTreeSet<String> = owned(&["Rule Only", "Both"]).into_iter().collect();

        let merged = merge_membership(&owned(&["Explicit Only", "Both"]), rule_based, &[]);

        assert_eq!(merged, ["Both", "Explicit Only", "Rule Only"]);
    }

    #[test]
    fn merge_lets_exclusion_override_every_inclusion() {
        let rule_based: BTreeSet<String> = owned(&["Shared", "Kept"]).into_iter().collect();

        let merged = merge_membership(
            &owned(&["Shared", "Also Kept"]),
            rule_based,
            &owned(&["Shared"]),
        );

        assert_eq!(merged, ["Also Kept", "Kept"]);
    }

    #[test]
    fn merge_output_is_sorted_and_duplicate_free() {
        let merged = merge_membership(&owned(&["b", "a", "b", "c", "a"]), BTreeSet::new(), &[]);

        assert_eq!(merged, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn archived_and_explicitly_excluded_groups_leave_folder_empty() {
        let account = StubAccount::with_dialogs(team_dialogs()).group(1, "Team Alpha");
        let folder = FolderDefinition {
            id: 2,
            title: "Teams".to_owned(),
            exclude_peers: vec![PeerRef::Chat(1)],
            rules: FolderRules {
                groups: true,
                exclude_archived: true,
                ..FolderRules::default()
            },
            ..FolderDefinition::default()
        };
        let ctx = RunContext::new("test", 4);

        let record = resolve_folder(&ctx, &account, &folder, &account.dialogs).await;

        assert!(record.included.is_empty());
        assert_eq!(record.excluded, ["Team Alpha"]);
    }

    #[tokio::test]
    async fn group_rule_without_exclusions_lists_all_groups_sorted() {
        let account = StubAccount::with_dialogs(team_dialogs());
        let folder = FolderDefinition {
            id: 2,
            title: "Teams".to_owned(),
            rules: FolderRules {
                groups: true,
                ..FolderRules::default()
            },
            ..FolderDefinition::default()
        };
        let ctx = RunContext::new("test", 4);

        let record = resolve_folder(&ctx, &account, &folder, &account.dialogs).await;

        assert_eq!(record.included, ["Team Alpha", "Team Beta"]);
    }

    #[tokio::test]
    async fn explicit_members_join_rule_members_and_keep_list_order() {
        let mut dialogs = team_dialogs();
        dialogs.push(user(10, "Zed", false, false));
        let account = StubAccount::with_dialogs(dialogs)
            .user(10, "Zed")
            .channel(3, "News")
            .user(11, "Amy");
        let folder = FolderDefinition {
            id: 5,
            title: "Mixed".to_owned(),
            emoticon: Some("🗂".to_owned()),
            pinned_peers: vec![PeerRef::User(10), PeerRef::Channel(3)],
            include_peers: vec![PeerRef::User(10), PeerRef::User(11)],
            exclude_peers: vec![PeerRef::Channel(404)],
            rules: FolderRules {
                broadcasts: true,
                ..FolderRules::default()
            },
        };
        let ctx = RunContext::new("test", 4);

        let record = resolve_folder(&ctx, &account, &folder, &account.dialogs).await;

        assert_eq!(record.pinned, ["Zed", "News"]);
        assert_eq!(record.included, ["Amy", "News", "Zed"]);
        assert_eq!(record.excluded, [PeerRef::Channel(404).placeholder_name()]);
        assert_eq!(record.emoticon.as_deref(), Some("🗂"));
        assert_eq!(ctx.unresolved_peers(), 1);
    }

    #[tokio::test]
    async fn name_in_both_explicit_lists_is_not_included() {
        let account = StubAccount::default().user(7, "Both Ways");
        let folder = FolderDefinition {
            include_peers: vec![PeerRef::User(7)],
            exclude_peers: vec![PeerRef::User(7)],
            ..FolderDefinition::default()
        };
        let ctx = RunContext::new("test", 4);

        let record = resolve_folder(&ctx, &account, &folder, &[]).await;

        assert!(record.included.is_empty());
    }
}
