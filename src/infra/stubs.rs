use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    domain::{
        dialog::{Dialog, Entity, TitledEntity, UserEntity},
        folder::FolderDefinition,
        peer::PeerRef,
        record::ExportRecord,
    },
    infra::{
        contracts::Exporter,
        export::{ExportError, ExportFormat},
    },
    usecases::contracts::{DialogSource, FolderSource, SourceError},
};

/// In-memory account snapshot standing in for the Telegram adapter.
#[derive(Debug, Default)]
pub struct StubAccount {
    pub dialogs: Vec<Dialog>,
    pub dialogs_error: Option<SourceError>,
    pub folders: Vec<FolderDefinition>,
    pub folders_error: Option<SourceError>,
    pub(crate) entities: HashMap<PeerRef, Entity>,
    pub(crate) delays: HashMap<PeerRef, Duration>,
    pub dialog_fetches: AtomicUsize,
    pub entity_requests: AtomicUsize,
    pub(crate) in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl StubAccount {
    pub fn with_dialogs(dialogs: Vec<Dialog>) -> Self {
        Self {
            dialogs,
            ..Self::default()
        }
    }

    pub fn user(mut self, id: i64, first_name: &str) -> Self {
        self.entities.insert(
            PeerRef::User(id),
            Entity::User(UserEntity {
                id,
                first_name: Some(first_name.to_owned()),
                ..UserEntity::default()
            }),
        );
        self
    }

    pub fn group(mut self, id: i64, title: &str) -> Self {
        self.entities.insert(
            PeerRef::Chat(id),
            Entity::Group(TitledEntity {
                id,
                title: Some(title.to_owned()),
            }),
        );
        self
    }

    pub fn channel(mut self, id: i64, title: &str) -> Self {
        self.entities.insert(
            PeerRef::Channel(id),
            Entity::Channel(TitledEntity {
                id,
                title: Some(title.to_owned()),
            }),
        );
        self
    }

    /// Makes the resolution of `peer` take `delay` before answering.
    pub fn delayed(mut self, peer: PeerRef, delay: Duration) -> Self {
        self.delays.insert(peer, delay);
        self
    }
}

#[async_trait]
impl DialogSource for StubAccount {
    async fn list_dialogs(&self) -> Result<Vec<Dialog>, SourceError> {
        self.dialog_fetches.fetch_add(1, Ordering::SeqCst);
        match &self.dialogs_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.dialogs.clone()),
        }
    }

    async fn get_entity(&self, peer: PeerRef) -> Result<Entity, SourceError> {
        self.entity_requests.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(&peer) {
            tokio::time::sleep(*delay).await;
        } else {
            tokio::task::yield_now().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.entities.get(&peer).cloned().ok_or(SourceError::NotFound)
    }
}

#[async_trait]
impl FolderSource for StubAccount {
    async fn list_folders(&self) -> Result<Vec<FolderDefinition>, SourceError> {
        match &self.folders_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.folders.clone()),
        }
    }
}

/// Exporter that keeps what it was given; can be told to fail first.
#[derive(Debug, Default)]
pub struct RecordingExporter {
    pub failures_left: AtomicUsize,
    pub exports: Mutex<Vec<(String, ExportFormat, Vec<ExportRecord>)>>,
}

impl RecordingExporter {
    pub fn failing(times: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(times),
            ..Self::default()
        }
    }

    pub fn exported(&self) -> Vec<(String, ExportFormat, Vec<ExportRecord>)> {
        self.exports.lock().expect("exports lock").clone()
    }
}

impl Exporter for RecordingExporter {
    fn export(
        &self,
        records: &[ExportRecord],
        base_name: &str,
        format: ExportFormat,
    ) -> Result<PathBuf, ExportError> {
        if records.is_empty() {
            return Err(ExportError::NoRecords);
        }

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ExportError::Io {
                path: PathBuf::from(base_name),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }

        self.exports.lock().expect("exports lock").push((
            base_name.to_owned(),
            format,
            records.to_vec(),
        ));

        Ok(PathBuf::from(format!("{base_name}.{}", format.extension())))
    }
}
