//! vehof-ex library - Video Essay Hall of Fame explorer
//!
//! Archive import, durable catalog and flag stores, the in-memory query
//! engine, and the local HTTP API. Exposed as a library for integration
//! testing; the `vehof-ex` binary wraps it with a CLI.

pub mod api;
pub mod db;
pub mod error;
pub mod pagination;
pub mod query;
pub mod services;
pub mod session;

pub use crate::error::{ApiError, ApiResult};

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::SqlitePool;
use tokio::sync::{Mutex, RwLock};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use vehof_common::config::TomlConfig;
use vehof_common::{Entity, Result};

use crate::db::{AnnotationStore, CatalogStore};
use crate::services::{ArchiveLoader, ArchiveSource, FlagCache, LoadReport};
use crate::session::{Debouncer, ExplorerSession};

/// Runtime knobs taken from the TOML configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplorerSettings {
    pub batch_size: usize,
    pub page_increment: usize,
    pub debounce: Duration,
}

impl ExplorerSettings {
    pub fn from_config(config: &TomlConfig) -> Self {
        Self {
            batch_size: config.archive.batch_size,
            page_increment: config.explorer.page_increment,
            debounce: vehof_common::time::millis_to_duration(config.explorer.debounce_ms),
        }
    }
}

impl Default for ExplorerSettings {
    fn default() -> Self {
        Self::from_config(&TomlConfig::default())
    }
}

/// Application state shared across handlers and CLI commands
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool shared by both stores
    pub db: SqlitePool,
    pub catalog: CatalogStore,
    pub annotations: AnnotationStore,
    pub loader: Arc<ArchiveLoader>,
    /// Write-through flag map
    pub flags: FlagCache,
    /// Entity snapshot the query engine reads
    pub entities: Arc<RwLock<Arc<Vec<Entity>>>>,
    /// Last load outcome or load error, for the status line
    pub status: Arc<RwLock<String>>,
    pub session: Arc<Mutex<ExplorerSession>>,
    pub debouncer: Arc<Debouncer>,
    pub settings: ExplorerSettings,
}

impl AppState {
    pub fn new(db: SqlitePool, source: ArchiveSource, settings: ExplorerSettings) -> Self {
        let catalog = CatalogStore::new(db.clone());
        let annotations = AnnotationStore::new(db.clone());
        let loader = ArchiveLoader::new(source, catalog.clone()).with_batch_size(settings.batch_size);

        Self {
            db,
            catalog,
            flags: FlagCache::new(annotations.clone()),
            annotations,
            loader: Arc::new(loader),
            entities: Arc::new(RwLock::new(Arc::new(Vec::new()))),
            status: Arc::new(RwLock::new("Not loaded".to_string())),
            session: Arc::new(Mutex::new(ExplorerSession::new(settings.page_increment))),
            debouncer: Arc::new(Debouncer::new(settings.debounce)),
            settings,
        }
    }

    /// Load the archive and hydrate flags
    ///
    /// A load failure is recorded in the status line and logged; the
    /// existing catalog stays queryable.
    pub async fn startup(&self) -> Result<Option<LoadReport>> {
        let report = match self.load_archive().await {
            Ok(report) => Some(report),
            Err(e) => {
                error!("Archive load failed: {}", e);
                self.refresh_catalog().await?;
                None
            }
        };
        self.flags.hydrate().await?;
        Ok(report)
    }

    /// Run the Archive Loader and publish the new snapshot
    pub async fn load_archive(&self) -> Result<LoadReport> {
        match self.loader.ensure_loaded().await {
            Ok(report) => {
                self.refresh_catalog().await?;
                self.set_status(report.status_message()).await;
                Ok(report)
            }
            Err(e) => {
                self.set_status(e.to_string()).await;
                Err(e)
            }
        }
    }

    /// Clear both stores, then import again
    pub async fn reset_archive(&self) -> Result<LoadReport> {
        let result = self.loader.reset_and_reload().await;

        // Flags and snapshot follow whatever the database now holds
        self.flags.hydrate().await?;
        self.refresh_catalog().await?;
        self.session.lock().await.set_spec(Default::default());

        match result {
            Ok(report) => {
                self.set_status(report.status_message()).await;
                Ok(report)
            }
            Err(e) => {
                self.set_status(e.to_string()).await;
                Err(e)
            }
        }
    }

    /// Re-read the Catalog Store into the in-memory snapshot
    pub async fn refresh_catalog(&self) -> Result<usize> {
        let entities = self.catalog.get_all().await?;
        let count = entities.len();
        *self.entities.write().await = Arc::new(entities);
        info!(count, "Catalog snapshot refreshed");
        Ok(count)
    }

    pub async fn snapshot(&self) -> Arc<Vec<Entity>> {
        self.entities.read().await.clone()
    }

    pub async fn status(&self) -> String {
        self.status.read().await.clone()
    }

    async fn set_status(&self, message: String) {
        *self.status.write().await = message;
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::status_routes())
        .merge(api::video_routes())
        .merge(api::flag_routes())
        .merge(api::archive_routes())
        .merge(api::session_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
