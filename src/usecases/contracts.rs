use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    dialog::{Dialog, Entity},
    folder::FolderDefinition,
    peer::PeerRef,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("session is not authorized")]
    Unauthorized,
    #[error("entity not found")]
    NotFound,
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("unexpected response: {0}")]
    InvalidData(String),
}

/// Read access to the account's dialogs and the entities behind peers.
#[async_trait]
pub trait DialogSource: Send + Sync {
    async fn list_dialogs(&self) -> Result<Vec<Dialog>, SourceError>;
    async fn get_entity(&self, peer: PeerRef) -> Result<Entity, SourceError>;
}

#[async_trait]
pub trait FolderSource: Send + Sync {
    async fn list_folders(&self) -> Result<Vec<FolderDefinition>, SourceError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct SessionError {
    pub code: &'static str,
    pub message: String,
}

#[async_trait]
pub trait SessionProvider: Send {
    async fn connect(&mut self) -> Result<(), SessionError>;
    async fn is_authorized(&mut self) -> Result<bool, SessionError>;
    async fn close(&mut self);
}
