/// Semantic category of a dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChatType {
    /// Private 1-to-1 conversation with a human user.
    Personal,
    /// Group chat (basic group or supergroup).
    Group,
    /// Broadcast channel.
    Channel,
    /// Private conversation with a bot account.
    Bot,
    Unknown,
}

impl ChatType {
    pub fn as_label(self) -> &'static str {
        match self {
            Self::Personal => "Personal",
            Self::Group => "Group",
            Self::Channel => "Channel",
            Self::Bot => "Bot",
            Self::Unknown => "Unknown",
        }
    }
}

/// User-like entity behind a private dialog or a user peer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserEntity {
    pub id: i64,
    pub first_name: Option<String>,
    pub contact: bool,
    pub bot: bool,
}

/// Group or channel entity; both carry a title.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TitledEntity {
    pub id: i64,
    pub title: Option<String>,
}

/// Resolved account entity. Contact and bot attributes exist only on users;
/// every other shape reports them as false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    User(UserEntity),
    Group(TitledEntity),
    Channel(TitledEntity),
}

impl Entity {
    pub fn id(&self) -> i64 {
        match self {
            Self::User(user) => user.id,
            Self::Group(chat) | Self::Channel(chat) => chat.id,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Self::User(_) => None,
            Self::Group(chat) | Self::Channel(chat) => chat.title.as_deref(),
        }
    }

    pub fn first_name(&self) -> Option<&str> {
        match self {
            Self::User(user) => user.first_name.as_deref(),
            Self::Group(_) | Self::Channel(_) => None,
        }
    }

    pub fn is_contact(&self) -> bool {
        matches!(self, Self::User(user) if user.contact)
    }

    pub fn is_bot(&self) -> bool {
        matches!(self, Self::User(user) if user.bot)
    }

    /// Title first, then first name, then a synthesized `User <id>`.
    pub fn display_name(&self) -> String {
        self.title()
            .filter(|title| !title.is_empty())
            .or_else(|| self.first_name().filter(|name| !name.is_empty()))
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| format!("User {}", self.id()))
    }
}

/// Read-only snapshot of one conversation as listed by the account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub id: i64,
    pub name: String,
    pub is_group: bool,
    pub is_channel: bool,
    pub is_user: bool,
    pub muted: bool,
    pub unread_count: u32,
    /// Manually marked as unread.
    pub unread_mark: bool,
    pub archived: bool,
    pub entity: Option<Entity>,
}

impl Dialog {
    /// Classifies the dialog. Group wins over channel, and channel over user,
    /// when the platform sets more than one flag.
    pub fn classify(&self) -> ChatType {
        if self.is_group {
            ChatType::Group
        } else if self.is_channel {
            ChatType::Channel
        } else if self.is_user {
            if self.is_bot() {
                ChatType::Bot
            } else {
                ChatType::Personal
            }
        } else {
            ChatType::Unknown
        }
    }

    pub fn is_contact(&self) -> bool {
        self.entity.as_ref().is_some_and(Entity::is_contact)
    }

    pub fn is_bot(&self) -> bool {
        self.entity.as_ref().is_some_and(Entity::is_bot)
    }

    /// A user dialog that is neither a saved contact nor a bot.
    pub fn is_personal_noncontact(&self) -> bool {
        self.is_user && !self.is_contact() && !self.is_bot()
    }

    /// No unread messages and no manual unread mark.
    pub fn is_read(&self) -> bool {
        self.unread_count == 0 && !self.unread_mark
    }
}


#[cfg(test)]
mod tests {
    use super::{fixtures::*, *};

    #[test]
    fn classifies_each_dialog_shape() {
        assert_eq!(group(1, "Team").classify(), ChatType::Group);
        assert_eq!(channel(2, "News").classify(), ChatType::Channel);
        assert_eq!(user(3, "Ann", true, false).classify(), ChatType::Personal);
        assert_eq!(user(4, "Helper", false, true).classify(), ChatType::Bot);
        assert_eq!(dialog(5, "Ghost").classify(), ChatType::Unknown);
    }

    #[test]
    fn group_flag_takes_precedence_over_channel_flag() {
        let mut megagroup = group(1, "Mega");
        megagroup.is_channel = true;

        assert_eq!(megagroup.classify(), ChatType::Group);
    }

    #[test]
    fn user_without_entity_is_personal() {
        let mut bare = dialog(7, "Bare");
        bare.is_user = true;

        assert_eq!(bare.classify(), ChatType::Personal);
        assert!(!bare.is_contact());
        assert!(bare.is_personal_noncontact());
    }

    #[test]
    fn personal_noncontact_excludes_contacts_and_bots() {
        assert!(user(1, "Stranger", false, false).is_personal_noncontact());
        assert!(!user(2, "Friend", true, false).is_personal_noncontact());
        assert!(!user(3, "Bot", false, true).is_personal_noncontact());
        assert!(!group(4, "Team").is_personal_noncontact());
    }

    #[test]
    fn read_state_honors_manual_unread_mark() {
        let mut chat = user(1, "Ann", true, false);
        chat.unread_count = 0;
        assert!(chat.is_read());

        chat.unread_mark = true;
        assert!(!chat.is_read());
    }

    #[test]
    fn display_name_prefers_title_then_first_name_then_id() {
        let titled = Entity::Channel(TitledEntity {
            id: 10,
            title: Some("News".to_owned()),
        });
        let named = Entity::User(UserEntity {
            id: 11,
            first_name: Some("Ann".to_owned()),
            ..UserEntity::default()
        });
        let anonymous = Entity::User(UserEntity {
            id: 12,
            first_name: Some(String::new()),
            ..UserEntity::default()
        });

        assert_eq!(titled.display_name(), "News");
        assert_eq!(named.display_name(), "Ann");
        assert_eq!(anonymous.display_name(), "User 12");
    }

    #[test]
    fn labels_match_export_vocabulary() {
        let labels: Vec<_> = [
            ChatType::Personal,
            ChatType::Group,
            ChatType::Channel,
            ChatType::Bot,
            ChatType::Unknown,
        ]
        .into_iter()
        .map(ChatType::as_label)
        .collect();

        assert_eq!(labels, ["Personal", "Group", "Channel", "Bot", "Unknown"]);
    }
}
