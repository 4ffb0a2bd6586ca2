//! Mirrors of the TDLib objects the extractor reads.
//!
//! Responses are decoded from their JSON form instead of the generated
//! structs so that fields which moved or changed type between TDLib releases
//! (folder titles, int64 encoding) keep decoding.

use serde::{de, Deserialize, Deserializer};

use crate::domain::{
    dialog::{Dialog, Entity, TitledEntity, UserEntity},
    folder::{FolderDefinition, FolderRules},
    peer::PeerRef,
};

/// Chat ids at or below this bound belong to supergroups and channels.
const CHANNEL_ID_OFFSET: i64 = 1_000_000_000_000;

/// TDLib int64, sent either as a JSON number or as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) struct Int64(pub i64);

impl<'de> Deserialize<'de> for Int64 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(i64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(Self(value)),
            Repr::Text(text) => text.parse().map(Self).map_err(de::Error::custom),
        }
    }
}

/// Any object of which only the `@type` discriminator matters.
#[derive(Debug, Clone, Default, Deserialize)]
pub(super) struct Typed {
    #[serde(rename = "@type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "@type")]
pub(super) enum ChatTypeDto {
    #[serde(rename = "chatTypePrivate")]
    Private { user_id: Int64 },
    #[serde(rename = "chatTypeSecret")]
    Secret { user_id: Int64 },
    #[serde(rename = "chatTypeBasicGroup")]
    BasicGroup { basic_group_id: Int64 },
    #[serde(rename = "chatTypeSupergroup")]
    Supergroup {
        supergroup_id: Int64,
        #[serde(default)]
        is_channel: bool,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(super) struct NotificationSettingsDto {
    #[serde(default = "default_true")]
    pub use_default_mute_for: bool,
    #[serde(default)]
    pub mute_for: i64,
}

fn default_true() -> bool {
    true
}

/// `scopeNotificationSettings`; only the mute interval matters here.
#[derive(Debug, Clone, Default, Deserialize)]
pub(super) struct ScopeNotificationSettingsDto {
    #[serde(default)]
    pub mute_for: i64,
}

/// Notification scopes a chat can inherit its mute interval from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum MuteScope {
    Private,
    Group,
    Channel,
}

/// Account-wide mute intervals per scope, read once per dialog snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) struct ScopeMuteDefaults {
    pub private: i64,
    pub group: i64,
    pub channel: i64,
}

impl ScopeMuteDefaults {
    pub fn set(&mut self, scope: MuteScope, mute_for: i64) {
        match scope {
            MuteScope::Private => self.private = mute_for,
            MuteScope::Group => self.group = mute_for,
            MuteScope::Channel => self.channel = mute_for,
        }
    }

    fn mute_for(&self, scope: MuteScope) -> i64 {
        match scope {
            MuteScope::Private => self.private,
            MuteScope::Group => self.group,
            MuteScope::Channel => self.channel,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ChatPositionDto {
    #[serde(default)]
    pub list: Typed,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ChatDto {
    pub id: Int64,
    #[serde(rename = "type")]
    pub kind: ChatTypeDto,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub positions: Vec<ChatPositionDto>,
    #[serde(default)]
    pub unread_count: i64,
    #[serde(default)]
    pub is_marked_as_unread: bool,
    #[serde(default)]
    pub notification_settings: NotificationSettingsDto,
}

impl ChatDto {
    /// User behind a private or secret chat.
    pub fn private_user_id(&self) -> Option<i64> {
        match self.kind {
            ChatTypeDto::Private { user_id } | ChatTypeDto::Secret { user_id } => Some(user_id.0),
            _ => None,
        }
    }

    fn has_archive_position(&self) -> bool {
        self.positions
            .iter()
            .any(|position| position.list.kind == "chatListArchive")
    }

    /// Scope whose defaults apply to the chat; `None` for unknown types.
    fn mute_scope(&self) -> Option<MuteScope> {
        match self.kind {
            ChatTypeDto::Private { .. } | ChatTypeDto::Secret { .. } => Some(MuteScope::Private),
            ChatTypeDto::BasicGroup { .. } => Some(MuteScope::Group),
            ChatTypeDto::Supergroup { is_channel, .. } if is_channel => Some(MuteScope::Channel),
            ChatTypeDto::Supergroup { .. } => Some(MuteScope::Group),
            ChatTypeDto::Unknown => None,
        }
    }

    /// Effective mute state: the chat's own interval, or its scope default
    /// when the chat follows it.
    fn is_muted(&self, defaults: &ScopeMuteDefaults) -> bool {
        let settings = &self.notification_settings;
        let mute_for = if settings.use_default_mute_for {
            self.mute_scope().map_or(0, |scope| defaults.mute_for(scope))
        } else {
            settings.mute_for
        };

        mute_for > 0
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(super) struct ChatsDto {
    #[serde(default)]
    pub chat_ids: Vec<Int64>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct UserDto {
    pub id: Int64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub is_contact: bool,
    #[serde(rename = "type", default)]
    pub kind: Typed,
}

impl UserDto {
    pub fn to_entity(&self) -> Entity {
        Entity::User(UserEntity {
            id: self.id.0,
            first_name: non_empty(&self.first_name),
            contact: self.is_contact,
            bot: self.kind.kind == "userTypeBot",
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct FormattedTextDto {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Clone, Deserialize)]
struct FolderNameDto {
    text: FormattedTextDto,
}

#[derive(Debug, Clone, Deserialize)]
struct FolderIconDto {
    #[serde(default)]
    name: String,
}

/// `chatFolder`; older releases carry `title`, newer ones `name.text.text`.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct ChatFolderDto {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<FolderNameDto>,
    #[serde(default)]
    icon: Option<FolderIconDto>,
    #[serde(default)]
    pinned_chat_ids: Vec<Int64>,
    #[serde(default)]
    included_chat_ids: Vec<Int64>,
    #[serde(default)]
    excluded_chat_ids: Vec<Int64>,
    #[serde(default)]
    exclude_muted: bool,
    #[serde(default)]
    exclude_read: bool,
    #[serde(default)]
    exclude_archived: bool,
    #[serde(default)]
    include_contacts: bool,
    #[serde(default)]
    include_non_contacts: bool,
    #[serde(default)]
    include_bots: bool,
    #[serde(default)]
    include_groups: bool,
    #[serde(default)]
    include_channels: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct FolderInfoDto {
    id: i32,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatFoldersUpdateDto {
    #[serde(default)]
    chat_folders: Vec<FolderInfoDto>,
}

/// Folder ids in display order, from an `updateChatFolders` payload.
pub(super) fn folder_ids_from_update(
    update: serde_json::Value,
) -> Result<Vec<i32>, serde_json::Error> {
    let update: ChatFoldersUpdateDto = serde_json::from_value(update)?;
    Ok(update.chat_folders.into_iter().map(|folder| folder.id).collect())
}

pub(super) fn peer_from_chat_id(chat_id: i64) -> PeerRef {
    if chat_id > 0 {
        PeerRef::User(chat_id)
    } else if chat_id < -CHANNEL_ID_OFFSET {
        PeerRef::Channel(-chat_id - CHANNEL_ID_OFFSET)
    } else {
        PeerRef::Chat(-chat_id)
    }
}

pub(super) fn chat_id_from_peer(peer: PeerRef) -> i64 {
    match peer {
        PeerRef::User(id) => id,
        PeerRef::Chat(id) => -id,
        PeerRef::Channel(id) => -CHANNEL_ID_OFFSET - id,
    }
}

/// Builds the dialog snapshot of `chat`. `user` is the counterpart of a
/// private or secret chat when it could be loaded.
pub(super) fn dialog_from_chat(
    chat: &ChatDto,
    user: Option<&UserDto>,
    in_archive: bool,
    mute_defaults: &ScopeMuteDefaults,
) -> Dialog {
    let (is_group, is_channel, is_user) = match chat.kind {
        ChatTypeDto::Private { .. } | ChatTypeDto::Secret { .. } => (false, false, true),
        ChatTypeDto::BasicGroup { .. } => (true, false, false),
        ChatTypeDto::Supergroup { is_channel, .. } => (!is_channel, is_channel, false),
        ChatTypeDto::Unknown => (false, false, false),
    };

    Dialog {
        id: chat.id.0,
        name: chat.title.clone(),
        is_group,
        is_channel,
        is_user,
        muted: chat.is_muted(mute_defaults),
        unread_count: u32::try_from(chat.unread_count).unwrap_or(0),
        unread_mark: chat.is_marked_as_unread,
        archived: in_archive || chat.has_archive_position(),
        entity: entity_from_chat(chat, user),
    }
}

/// Entity behind a chat object. Private chats without a loaded user fall
/// back to the chat title as first name.
pub(super) fn entity_from_chat(chat: &ChatDto, user: Option<&UserDto>) -> Option<Entity> {
    let titled = |id: Int64| TitledEntity {
        id: id.0,
        title: non_empty(&chat.title),
    };

    match chat.kind {
        ChatTypeDto::Private { user_id } | ChatTypeDto::Secret { user_id } => {
            Some(user.map(UserDto::to_entity).unwrap_or_else(|| {
                Entity::User(UserEntity {
                    id: user_id.0,
                    first_name: non_empty(&chat.title),
                    ..UserEntity::default()
                })
            }))
        }
        ChatTypeDto::BasicGroup { basic_group_id } => Some(Entity::Group(titled(basic_group_id))),
        ChatTypeDto::Supergroup {
            supergroup_id,
            is_channel: true,
        } => Some(Entity::Channel(titled(supergroup_id))),
        ChatTypeDto::Supergroup { supergroup_id, .. } => {
            Some(Entity::Group(titled(supergroup_id)))
        }
        ChatTypeDto::Unknown => None,
    }
}

pub(super) fn folder_from_dto(id: i32, folder: ChatFolderDto) -> FolderDefinition {
    let title = folder
        .name
        .map(|name| name.text.text)
        .or(folder.title)
        .unwrap_or_default();
    let peers = |ids: Vec<Int64>| ids.into_iter().map(|id| peer_from_chat_id(id.0)).collect();

    FolderDefinition {
        id,
        title,
        emoticon: folder.icon.and_then(|icon| non_empty(&icon.name)),
        pinned_peers: peers(folder.pinned_chat_ids),
        include_peers: peers(folder.included_chat_ids),
        exclude_peers: peers(folder.excluded_chat_ids),
        rules: FolderRules {
            contacts: folder.include_contacts,
            non_contacts: folder.include_non_contacts,
            groups: folder.include_groups,
            broadcasts: folder.include_channels,
            bots: folder.include_bots,
            exclude_muted: folder.exclude_muted,
            exclude_read: folder.exclude_read,
            exclude_archived: folder.exclude_archived,
        },
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_owned())
}
