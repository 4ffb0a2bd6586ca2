//! Telegram integration layer: TDLib client, auth and account reads.

mod auth;
mod client;
mod mapping;

use std::{collections::HashSet, time::Duration};

use async_trait::async_trait;
use tdlib_rs::{
    enums::{ChatList, NotificationSettingsScope},
    functions,
};

use crate::{
    domain::{
        dialog::{Dialog, Entity},
        folder::FolderDefinition,
        peer::PeerRef,
    },
    infra::{config::AppConfig, storage_layout::StorageLayout},
    usecases::{
        contracts::{DialogSource, FolderSource, SessionError, SessionProvider, SourceError},
        guided_auth::{AuthBackendError, AuthCodeToken, SignInOutcome, TelegramAuthClient},
    },
};

use self::{
    auth::{map_password_error, map_request_code_error, map_sign_in_error, AuthState},
    client::{decode, TdClient},
    mapping::{
        chat_id_from_peer, dialog_from_chat, entity_from_chat, folder_from_dto, ChatDto,
        ChatFolderDto, ChatsDto, MuteScope, ScopeMuteDefaults, ScopeNotificationSettingsDto,
        UserDto,
    },
};

pub use self::client::SessionCloser;

const STARTUP_TIMEOUT: Duration = Duration::from_secs(30);
const AUTH_STEP_TIMEOUT: Duration = Duration::from_secs(30);
const LOAD_CHATS_PAGE: i32 = 100;
const GET_CHATS_LIMIT: i32 = 100_000;
const TDLIB_LOG_VERBOSITY: i32 = 1;

/// TDLib session settings taken from the app config and storage layout.
#[derive(Debug, Clone)]
pub struct TelegramSettings {
    pub api_id: i32,
    pub api_hash: String,
    pub database_dir: String,
    pub files_dir: String,
    pub folder_sync_timeout: Duration,
}

impl TelegramSettings {
    pub fn new(config: &AppConfig, layout: &StorageLayout) -> Self {
        Self {
            api_id: config.telegram.api_id,
            api_hash: config.telegram.api_hash.clone(),
            database_dir: layout.session_dir.display().to_string(),
            files_dir: layout.files_dir.display().to_string(),
            folder_sync_timeout: Duration::from_millis(config.startup.folder_sync_timeout_ms),
        }
    }
}

/// Account access over one TDLib client: session lifecycle, guided auth
/// backend and the dialog/folder reads used by extraction.
#[derive(Debug)]
pub struct TelegramAdapter {
    client: TdClient,
    settings: TelegramSettings,
    active_code: Option<AuthCodeToken>,
    next_code_id: u64,
}

impl TelegramAdapter {
    pub fn start(settings: TelegramSettings) -> Result<Self, SessionError> {
        let client = TdClient::start().map_err(|source| SessionError {
            code: "TELEGRAM_CLIENT_START_FAILED",
            message: format!("failed to start tdlib receive thread: {source}"),
        })?;

        Ok(Self {
            client,
            settings,
            active_code: None,
            next_code_id: 1,
        })
    }

    pub fn closer(&self) -> SessionCloser {
        self.client.closer()
    }

    async fn fetch_chat(&self, chat_id: i64) -> Result<ChatDto, SourceError> {
        let chat = functions::get_chat(chat_id, self.client.id())
            .await
            .map_err(|error| map_source_error(error.code, &error.message))?;
        decode(chat).map_err(invalid_data)
    }

    async fn fetch_user(&self, user_id: i64) -> Result<UserDto, SourceError> {
        let user = functions::get_user(user_id, self.client.id())
            .await
            .map_err(|error| map_source_error(error.code, &error.message))?;
        decode(user).map_err(invalid_data)
    }

    /// Loads `list` completely, then returns its chat ids in list order.
    async fn chat_ids(&self, list: fn() -> ChatList) -> Result<Vec<i64>, SourceError> {
        let client_id = self.client.id();

        loop {
            match functions::load_chats(Some(list()), LOAD_CHATS_PAGE, client_id).await {
                Ok(()) => continue,
                // 404: every chat of the list is already loaded.
                Err(error) if error.code == 404 => break,
                Err(error) => return Err(map_source_error(error.code, &error.message)),
            }
        }

        let chats = functions::get_chats(Some(list()), GET_CHATS_LIMIT, client_id)
            .await
            .map_err(|error| map_source_error(error.code, &error.message))?;
        let chats: ChatsDto = decode(chats).map_err(invalid_data)?;

        Ok(chats.chat_ids.into_iter().map(|id| id.0).collect())
    }

    /// Mute intervals of the private, group and channel scopes. A scope that
    /// cannot be read counts as unmuted.
    async fn scope_mute_defaults(&self) -> ScopeMuteDefaults {
        let mut defaults = ScopeMuteDefaults::default();

        for (scope, request) in [
            (MuteScope::Private, NotificationSettingsScope::PrivateChats),
            (MuteScope::Group, NotificationSettingsScope::GroupChats),
            (MuteScope::Channel, NotificationSettingsScope::ChannelChats),
        ] {
            let settings = functions::get_scope_notification_settings(request, self.client.id())
                .await
                .map_err(|error| map_source_error(error.code, &error.message))
                .and_then(|settings| {
                    decode::<_, ScopeNotificationSettingsDto>(settings).map_err(invalid_data)
                });

            match settings {
                Ok(settings) => defaults.set(scope, settings.mute_for),
                Err(error) => {
                    tracing::warn!(?scope, %error, "scope notification settings unavailable");
                }
            }
        }

        defaults
    }

    async fn wait_auth_step(&self) -> Result<AuthState, AuthBackendError> {
        self.client
            .wait_for_auth(AUTH_STEP_TIMEOUT, |state| {
                !matches!(
                    state,
                    AuthState::Unknown | AuthState::WaitParameters | AuthState::WaitPhoneNumber
                )
            })
            .await
            .ok_or(AuthBackendError::Timeout)
    }
}

#[async_trait]
impl SessionProvider for TelegramAdapter {
    async fn connect(&mut self) -> Result<(), SessionError> {
        let client_id = self.client.id();

        // Any request wakes TDLib up; it then asks for its parameters.
        if let Err(error) = functions::set_log_verbosity_level(TDLIB_LOG_VERBOSITY, client_id).await
        {
            tracing::debug!(code = error.code, "tdlib log verbosity not applied");
        }

        self.client
            .wait_for_auth(STARTUP_TIMEOUT, |state| state != AuthState::Unknown)
            .await
            .ok_or_else(|| startup_timeout("tdlib did not report its authorization state"))?;

        if self.client.auth_state() == AuthState::WaitParameters {
            let settings = &self.settings;
            functions::set_tdlib_parameters(
                false,
                settings.database_dir.clone(),
                settings.files_dir.clone(),
                String::new(),
                false,
                true,
                false,
                false,
                settings.api_id,
                settings.api_hash.clone(),
                "en".to_owned(),
                "Desktop".to_owned(),
                String::new(),
                env!("CARGO_PKG_VERSION").to_owned(),
                client_id,
            )
            .await
            .map_err(|error| {
                let code = match map_request_code_error(error.code, &error.message) {
                    AuthBackendError::InvalidApiCredentials => "AUTH_INVALID_API_CREDENTIALS",
                    _ => "TELEGRAM_PARAMETERS_REJECTED",
                };
                SessionError {
                    code,
                    message: format!("tdlib rejected session parameters (code {})", error.code),
                }
            })?;
        }

        let state = self
            .client
            .wait_for_auth(STARTUP_TIMEOUT, AuthState::is_settled)
            .await
            .ok_or_else(|| startup_timeout("tdlib did not finish loading the session"))?;

        tracing::info!(?state, "telegram session connected");
        Ok(())
    }

    async fn is_authorized(&mut self) -> Result<bool, SessionError> {
        match self.client.auth_state() {
            AuthState::Ready => Ok(true),
            AuthState::Closing | AuthState::Closed => Err(SessionError {
                code: "TELEGRAM_SESSION_CLOSED",
                message: "session is closing".to_owned(),
            }),
            _ => Ok(false),
        }
    }

    async fn close(&mut self) {
        self.client.closer().close().await;
    }
}

#[async_trait]
impl TelegramAuthClient for TelegramAdapter {
    async fn request_login_code(
        &mut self,
        phone: &str,
    ) -> Result<AuthCodeToken, AuthBackendError> {
        self.active_code = None;

        functions::set_authentication_phone_number(phone.to_owned(), None, self.client.id())
            .await
            .map_err(|error| map_request_code_error(error.code, &error.message))?;

        match self.wait_auth_step().await? {
            AuthState::WaitCode | AuthState::WaitPassword | AuthState::Ready => {}
            state => return Err(unsupported_step(state)),
        }

        let token = AuthCodeToken(format!("code-requested-{}", self.next_code_id));
        self.next_code_id += 1;
        self.active_code = Some(token.clone());

        Ok(token)
    }

    async fn sign_in_with_code(
        &mut self,
        token: &AuthCodeToken,
        code: &str,
    ) -> Result<SignInOutcome, AuthBackendError> {
        if self.active_code.as_ref() != Some(token) {
            return Err(AuthBackendError::Transient {
                code: "AUTH_INVALID_FLOW",
                message: "code submission token does not match active login request".to_owned(),
            });
        }

        functions::check_authentication_code(code.to_owned(), self.client.id())
            .await
            .map_err(|error| map_sign_in_error(error.code, &error.message))?;

        let state = self
            .client
            .wait_for_auth(AUTH_STEP_TIMEOUT, |state| state != AuthState::WaitCode)
            .await
            .ok_or(AuthBackendError::Timeout)?;
        self.active_code = None;

        match state {
            AuthState::Ready => Ok(SignInOutcome::Authorized),
            AuthState::WaitPassword => Ok(SignInOutcome::PasswordRequired),
            state => Err(unsupported_step(state)),
        }
    }

    async fn verify_password(&mut self, password: &str) -> Result<(), AuthBackendError> {
        functions::check_authentication_password(password.to_owned(), self.client.id())
            .await
            .map_err(|error| map_password_error(error.code, &error.message))?;

        match self
            .client
            .wait_for_auth(AUTH_STEP_TIMEOUT, |state| state != AuthState::WaitPassword)
            .await
            .ok_or(AuthBackendError::Timeout)?
        {
            AuthState::Ready => Ok(()),
            state => Err(unsupported_step(state)),
        }
    }
}

#[async_trait]
impl DialogSource for TelegramAdapter {
    async fn list_dialogs(&self) -> Result<Vec<Dialog>, SourceError> {
        let main = self.chat_ids(|| ChatList::Main).await?;
        let archive = self.chat_ids(|| ChatList::Archive).await?;
        let archived: HashSet<i64> = archive.iter().copied().collect();
        let mute_defaults = self.scope_mute_defaults().await;

        let mut seen = HashSet::with_capacity(main.len() + archive.len());
        let mut dialogs = Vec::with_capacity(main.len() + archive.len());

        for chat_id in main.into_iter().chain(archive) {
            if !seen.insert(chat_id) {
                continue;
            }

            let chat = self.fetch_chat(chat_id).await?;
            let user = match chat.private_user_id() {
                Some(user_id) => match self.fetch_user(user_id).await {
                    Ok(user) => Some(user),
                    Err(error) => {
                        tracing::debug!(chat_id, %error, "private chat user unavailable");
                        None
                    }
                },
                None => None,
            };

            dialogs.push(dialog_from_chat(
                &chat,
                user.as_ref(),
                archived.contains(&chat_id),
                &mute_defaults,
            ));
        }

        tracing::info!(
            dialogs = dialogs.len(),
            archived = archived.len(),
            "dialogs fetched"
        );
        Ok(dialogs)
    }

    async fn get_entity(&self, peer: PeerRef) -> Result<Entity, SourceError> {
        if let PeerRef::User(user_id) = peer {
            return Ok(self.fetch_user(user_id).await?.to_entity());
        }

        let chat = self.fetch_chat(chat_id_from_peer(peer)).await?;
        entity_from_chat(&chat, None)
            .ok_or_else(|| SourceError::InvalidData(format!("unsupported chat type for {peer}")))
    }
}

#[async_trait]
impl FolderSource for TelegramAdapter {
    async fn list_folders(&self) -> Result<Vec<FolderDefinition>, SourceError> {
        let Some(ids) = self
            .client
            .folder_ids(self.settings.folder_sync_timeout)
            .await
        else {
            tracing::warn!(
                timeout_ms = self.settings.folder_sync_timeout.as_millis() as u64,
                "no chat folder list received from telegram"
            );
            return Ok(Vec::new());
        };

        let mut folders = Vec::with_capacity(ids.len());
        for id in ids {
            let folder = functions::get_chat_folder(id, self.client.id())
                .await
                .map_err(|error| map_source_error(error.code, &error.message))?;
            let folder: ChatFolderDto = decode(folder).map_err(invalid_data)?;
            folders.push(folder_from_dto(id, folder));
        }

        Ok(folders)
    }
}

fn map_source_error(code: i32, message: &str) -> SourceError {
    let msg = message.to_ascii_lowercase();

    match code {
        401 => SourceError::Unauthorized,
        404 => SourceError::NotFound,
        400 if msg.contains("not found") || msg.contains("invalid") => SourceError::NotFound,
        _ => SourceError::Unavailable(format!("tdlib error {code}")),
    }
}

fn invalid_data(error: serde_json::Error) -> SourceError {
    SourceError::InvalidData(error.to_string())
}

fn startup_timeout(message: &str) -> SessionError {
    SessionError {
        code: "TELEGRAM_STARTUP_TIMEOUT",
        message: message.to_owned(),
    }
}

fn unsupported_step(state: AuthState) -> AuthBackendError {
    AuthBackendError::Transient {
        code: "AUTH_UNSUPPORTED_STEP",
        message: format!("telegram asked for an unsupported login step ({state:?})"),
    }
}

/// Returns the telegram module name for smoke checks.
pub fn module_name() -> &'static str {
    "telegram"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_errors_are_classified_by_code() {
        assert_eq!(map_source_error(401, "Unauthorized"), SourceError::Unauthorized);
        assert_eq!(map_source_error(400, "Chat not found"), SourceError::NotFound);
        assert_eq!(map_source_error(404, "Not Found"), SourceError::NotFound);
        assert_eq!(
            map_source_error(500, "secret internals"),
            SourceError::Unavailable("tdlib error 500".to_owned())
        );
    }

    #[test]
    fn settings_point_tdlib_at_the_storage_layout() {
        let mut config = AppConfig::default();
        config.telegram.api_id = 7;
        config.startup.folder_sync_timeout_ms = 250;
        let layout = StorageLayout::under("/tmp/tgfold".into());

        let settings = TelegramSettings::new(&config, &layout);

        assert_eq!(settings.api_id, 7);
        assert_eq!(settings.database_dir, "/tmp/tgfold/session");
        assert_eq!(settings.files_dir, "/tmp/tgfold/files");
        assert_eq!(settings.folder_sync_timeout, Duration::from_millis(250));
    }

    #[test]
    fn module_name_is_stable() {
        assert_eq!(module_name(), "telegram");
    }
}
