use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use serde::{de::DeserializeOwned, Serialize};
use tdlib_rs::{enums::Update, functions};
use tokio::sync::watch;

use super::{auth::AuthState, mapping::folder_ids_from_update};

const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// One TDLib client plus the thread pumping its updates and responses.
#[derive(Debug)]
pub(super) struct TdClient {
    id: i32,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    auth_state: watch::Receiver<AuthState>,
    folder_ids: watch::Receiver<Option<Vec<i32>>>,
}

impl TdClient {
    pub fn start() -> std::io::Result<Self> {
        let id = tdlib_rs::create_client();
        let stop = Arc::new(AtomicBool::new(false));
        let (auth_tx, auth_state) = watch::channel(AuthState::Unknown);
        let (folders_tx, folder_ids) = watch::channel(None);

        let worker = thread::Builder::new()
            .name("tgfold-tdlib-receive".to_owned())
            .spawn({
                let stop = Arc::clone(&stop);
                move || run_receiver(id, &stop, &auth_tx, &folders_tx)
            })?;

        tracing::debug!(client_id = id, "tdlib client created");

        Ok(Self {
            id,
            stop,
            worker: Some(worker),
            auth_state,
            folder_ids,
        })
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn auth_state(&self) -> AuthState {
        *self.auth_state.borrow()
    }

    /// Waits until the authorization state satisfies `accept`. `None` on
    /// timeout or when the receiver is gone.
    pub async fn wait_for_auth(
        &self,
        timeout: Duration,
        accept: impl Fn(AuthState) -> bool,
    ) -> Option<AuthState> {
        let mut state = self.auth_state.clone();
        let waited =
            tokio::time::timeout(timeout, state.wait_for(|current| accept(*current))).await;

        match waited {
            Ok(Ok(current)) => Some(*current),
            _ => None,
        }
    }

    /// Folder ids from the latest `updateChatFolders`, waiting up to
    /// `timeout` for the first one.
    pub async fn folder_ids(&self, timeout: Duration) -> Option<Vec<i32>> {
        let mut ids = self.folder_ids.clone();
        let waited = tokio::time::timeout(timeout, ids.wait_for(Option::is_some)).await;

        match waited {
            Ok(Ok(current)) => (*current).clone(),
            _ => None,
        }
    }

    pub fn closer(&self) -> SessionCloser {
        SessionCloser {
            client_id: self.id,
            stop: Arc::clone(&self.stop),
            auth_state: self.auth_state.clone(),
        }
    }
}

impl Drop for TdClient {
    /// Joins the receive thread once the session was closed. An open session
    /// keeps its thread so a [`SessionCloser`] can still finish the close.
    fn drop(&mut self) {
        if !self.stop.load(Ordering::Acquire) {
            tracing::debug!("tdlib client dropped while open, receive thread detached");
            return;
        }

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("tdlib receive thread panicked");
            }
        }
    }
}

/// Cloneable handle that closes the TDLib session, usable from a signal
/// handler while the client itself is owned elsewhere.
#[derive(Debug, Clone)]
pub struct SessionCloser {
    client_id: i32,
    stop: Arc<AtomicBool>,
    auth_state: watch::Receiver<AuthState>,
}

impl SessionCloser {
    pub async fn close(&self) {
        if self.stop.load(Ordering::Acquire) {
            return;
        }

        if *self.auth_state.borrow() != AuthState::Closed {
            match tokio::time::timeout(CLOSE_TIMEOUT, functions::close(self.client_id)).await {
                Ok(Ok(())) => {}
                Ok(Err(error)) => tracing::warn!(code = error.code, "tdlib close request failed"),
                Err(_) => tracing::warn!("tdlib close request timed out"),
            }

            let mut state = self.auth_state.clone();
            let timed_out =
                tokio::time::timeout(CLOSE_TIMEOUT, state.wait_for(|s| *s == AuthState::Closed))
                    .await
                    .is_err();
            if timed_out {
                tracing::warn!("tdlib did not confirm close in time");
            }
        }

        self.stop.store(true, Ordering::Release);
        tracing::info!("telegram session closed");
    }
}

fn run_receiver(
    client_id: i32,
    stop: &AtomicBool,
    auth_tx: &watch::Sender<AuthState>,
    folders_tx: &watch::Sender<Option<Vec<i32>>>,
) {
    while !stop.load(Ordering::Acquire) {
        let Some((update, update_client)) = tdlib_rs::receive() else {
            continue;
        };
        if update_client != client_id {
            continue;
        }

        match update {
            Update::AuthorizationState(update) => {
                let state = to_json(&update.authorization_state)
                    .map(|value| auth_state_from_json(&value))
                    .unwrap_or(AuthState::Unsupported);
                tracing::debug!(?state, "authorization state changed");
                auth_tx.send_replace(state);

                if state == AuthState::Closed {
                    break;
                }
            }
            Update::ChatFolders(update) => {
                match to_json(&update).and_then(folder_ids_from_update) {
                    Ok(ids) => {
                        tracing::debug!(folders = ids.len(), "chat folder list updated");
                        folders_tx.send_replace(Some(ids));
                    }
                    Err(error) => tracing::warn!(%error, "undecodable chat folder update"),
                }
            }
            _ => {}
        }
    }
}

fn auth_state_from_json(value: &serde_json::Value) -> AuthState {
    value
        .get("@type")
        .and_then(serde_json::Value::as_str)
        .map(AuthState::from_type)
        .unwrap_or(AuthState::Unsupported)
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::to_value(value)
}

/// Re-reads a TDLib object through its JSON form into a local mirror.
pub(super) fn decode<T: Serialize, D: DeserializeOwned>(
    value: T,
) -> Result<D, serde_json::Error> {
    serde_json::from_value(to_json(&value)?)
}
