//! Write-through flag cache
//!
//! Flags are hydrated once from the Annotation Store. Every mutation
//! writes the durable row first and only then updates memory, under the
//! map's write lock, so two toggles of the same id never interleave.
//! Readers get a cheap `Arc` snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};
use vehof_common::time::now_millis;
use vehof_common::{Flag, FlagKind, Result};

use crate::db::AnnotationStore;

/// Flag rows by entity id
pub type FlagMap = HashMap<String, Flag>;

/// Number of entities in each personal list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ListCounts {
    pub favorites: usize,
    pub watch_later: usize,
    pub watched: usize,
}

impl ListCounts {
    pub fn from_flags(flags: &FlagMap) -> Self {
        flags.values().fold(Self::default(), |mut counts, flag| {
            counts.favorites += usize::from(flag.favorite);
            counts.watch_later += usize::from(flag.watch_later);
            counts.watched += usize::from(flag.watched);
            counts
        })
    }
}

/// In-memory flag map backed by the Annotation Store
#[derive(Debug, Clone)]
pub struct FlagCache {
    store: AnnotationStore,
    map: Arc<RwLock<Arc<FlagMap>>>,
}

impl FlagCache {
    pub fn new(store: AnnotationStore) -> Self {
        Self {
            store,
            map: Arc::new(RwLock::new(Arc::new(HashMap::new()))),
        }
    }

    /// Replace memory with the durable rows; returns the row count
    pub async fn hydrate(&self) -> Result<usize> {
        let flags = self.store.get_all().await?;
        let count = flags.len();
        let map: FlagMap = flags.into_iter().map(|f| (f.id.clone(), f)).collect();

        *self.map.write().await = Arc::new(map);
        info!(count, "Flags hydrated");
        Ok(count)
    }

    pub async fn snapshot(&self) -> Arc<FlagMap> {
        self.map.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Flag> {
        self.map.read().await.get(id).cloned()
    }

    pub async fn counts(&self) -> ListCounts {
        ListCounts::from_flags(self.snapshot().await.as_ref())
    }

    /// Set one flag for an id, creating the row on first mutation
    pub async fn set_flag(&self, id: &str, kind: FlagKind, value: bool) -> Result<Flag> {
        let mut guard = self.map.write().await;
        let next = guard
            .get(id)
            .cloned()
            .unwrap_or_else(|| Flag::empty(id, 0))
            .with(kind, value, now_millis());

        self.store.put(&next).await?;
        Arc::make_mut(&mut *guard).insert(id.to_string(), next.clone());

        debug!(id = %id, flag = %kind, value, "Flag set");
        Ok(next)
    }

    /// Flip one flag (an absent row counts as false)
    pub async fn toggle_flag(&self, id: &str, kind: FlagKind) -> Result<Flag> {
        let mut guard = self.map.write().await;
        let current = guard
            .get(id)
            .cloned()
            .unwrap_or_else(|| Flag::empty(id, 0));
        let value = !current.get(kind);
        let next = current.with(kind, value, now_millis());

        self.store.put(&next).await?;
        Arc::make_mut(&mut *guard).insert(id.to_string(), next.clone());

        debug!(id = %id, flag = %kind, value, "Flag toggled");
        Ok(next)
    }

    /// Delete every flag row, durably and in memory
    pub async fn clear_all(&self) -> Result<()> {
        let mut guard = self.map.write().await;
        self.store.clear().await?;
        *guard = Arc::new(HashMap::new());
        info!("All flags cleared");
        Ok(())
    }
}
