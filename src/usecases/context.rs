use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::Span;

use crate::{
    domain::peer::PeerRef,
    infra::{config::AppConfig, contracts::Exporter, logging::LoggingGuard},
    usecases::contracts::{DialogSource, FolderSource, SourceError},
};

#[derive(Debug)]
pub struct AppContext {
    pub config: AppConfig,
    pub logging: Option<LoggingGuard>,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            logging: None,
        }
    }
}

/// Everything an extraction needs from the outside world.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub dialogs: &'a dyn DialogSource,
    pub folders: &'a dyn FolderSource,
    pub exporter: &'a dyn Exporter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionSettings {
    pub master_list_name: String,
    pub folder_export_name: String,
    pub resolve_concurrency: usize,
}

impl From<&AppConfig> for ExtractionSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            master_list_name: config.export.master_list_name.clone(),
            folder_export_name: config.export.folder_name.clone(),
            resolve_concurrency: config.resolver.normalized_concurrency(),
        }
    }
}

/// State scoped to one extraction run: its span, the resolver fan-out cap
/// and the diagnostics gathered while resolving.
#[derive(Debug)]
pub struct RunContext {
    span: Span,
    resolve_concurrency: usize,
    unresolved_peers: AtomicUsize,
}

impl RunContext {
    pub fn new(operation: &'static str, resolve_concurrency: usize) -> Self {
        Self {
            span: tracing::info_span!("extraction_run", operation),
            resolve_concurrency: resolve_concurrency.max(1),
            unresolved_peers: AtomicUsize::new(0),
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn resolve_concurrency(&self) -> usize {
        self.resolve_concurrency
    }

    pub fn record_unresolved(&self, peer: PeerRef, error: &SourceError) {
        self.unresolved_peers.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            parent: &self.span,
            peer = %peer,
            error = %error,
            "peer could not be resolved, using placeholder"
        );
    }

    pub fn unresolved_peers(&self) -> usize {
        self.unresolved_peers.load(Ordering::Relaxed)
    }
}
