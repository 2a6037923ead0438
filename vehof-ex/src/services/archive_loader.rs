//! Archive Loader
//!
//! fetch -> parse -> normalize -> reconcile against the Catalog Store.
//! The loader also owns the two-store reset. At most one load or reset
//! runs at a time per loader; a concurrent caller waits for the running
//! one and then reconciles against what it wrote.

use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use vehof_common::{normalize, Entity, RawRecord, Result};

use super::archive_source::ArchiveSource;
use crate::db::{AnnotationStore, CatalogStore};

/// Default rows per upsert transaction
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Parse errors logged in full before the rest are only counted
const LOGGED_PARSE_ERRORS: usize = 5;

/// Result of one `ensure_loaded` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// True when the catalog was (re)written
    pub loaded: bool,
    /// Catalog size after the call
    pub count: usize,
    /// Catalog size before the call
    pub previous: usize,
    /// Rows dropped for a missing url or title
    pub rejected_rows: usize,
    /// Rows the CSV reader could not decode
    pub parse_errors: usize,
}

impl LoadReport {
    /// Human-readable outcome shown in the status line
    pub fn status_message(&self) -> String {
        match (self.loaded, self.previous) {
            (false, _) => format!("Loaded {} videos", self.count),
            (true, 0) => format!("Imported {} videos", self.count),
            (true, _) => format!("Re-imported {} videos", self.count),
        }
    }
}

/// Normalized content of one archive table
#[derive(Debug, Clone, Default)]
pub struct ParsedTable {
    /// Unique by id, in order of first appearance
    pub entities: Vec<Entity>,
    pub rejected_rows: usize,
    pub parse_errors: usize,
}

/// Parse CSV text into normalized entities
///
/// Row decode errors are logged and counted, never fatal. Rows without a
/// url or title are rejected. When several rows share an id the later row
/// wins but keeps the position of the first.
pub fn parse_table(text: &str) -> ParsedTable {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut parsed = ParsedTable::default();
    let mut positions: HashMap<String, usize> = HashMap::new();

    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(e) => {
            warn!(error = %e, "CSV header could not be parsed");
            parsed.parse_errors += 1;
            return parsed;
        }
    };

    for (index, record) in reader.records().enumerate() {
        // Short rows are padded so every header has a field
        let record = record.and_then(|mut record| {
            record.truncate(headers.len());
            while record.len() < headers.len() {
                record.push_field("");
            }
            record.deserialize::<RawRecord>(Some(&headers))
        });
        let raw = match record {
            Ok(raw) => raw,
            Err(e) => {
                parsed.parse_errors += 1;
                if parsed.parse_errors <= LOGGED_PARSE_ERRORS {
                    warn!(row = index + 1, error = %e, "CSV row could not be parsed");
                }
                continue;
            }
        };

        if !raw.is_importable() {
            parsed.rejected_rows += 1;
            continue;
        }

        let entity = normalize(raw);
        match positions.get(&entity.id) {
            Some(&position) => {
                debug!(id = %entity.id, "Duplicate id in archive, later row wins");
                parsed.entities[position] = entity;
            }
            None => {
                positions.insert(entity.id.clone(), parsed.entities.len());
                parsed.entities.push(entity);
            }
        }
    }

    if parsed.parse_errors > LOGGED_PARSE_ERRORS {
        warn!(
            "{} more CSV rows could not be parsed",
            parsed.parse_errors - LOGGED_PARSE_ERRORS
        );
    }

    parsed
}

/// Imports the archive table into the Catalog Store
pub struct ArchiveLoader {
    source: ArchiveSource,
    catalog: CatalogStore,
    batch_size: usize,
    in_flight: Mutex<()>,
}

impl ArchiveLoader {
    pub fn new(source: ArchiveSource, catalog: CatalogStore) -> Self {
        Self {
            source,
            catalog,
            batch_size: DEFAULT_BATCH_SIZE,
            in_flight: Mutex::new(()),
        }
    }

    /// Rows per upsert transaction (minimum 1)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn source(&self) -> &ArchiveSource {
        &self.source
    }

    /// Make the catalog match the archive table
    ///
    /// A fetch failure returns `Error::Fetch` before any store is touched.
    pub async fn ensure_loaded(&self) -> Result<LoadReport> {
        let _guard = self.in_flight.lock().await;
        self.load_locked().await
    }

    /// Clear the Catalog Store and the Annotation Store in one transaction
    ///
    /// Either both are emptied or neither changes.
    pub async fn reset(&self) -> Result<()> {
        let _guard = self.in_flight.lock().await;
        self.reset_locked().await
    }

    /// Reset, then import again without letting another load interleave
    pub async fn reset_and_reload(&self) -> Result<LoadReport> {
        let _guard = self.in_flight.lock().await;
        self.reset_locked().await?;
        self.load_locked().await
    }

    async fn load_locked(&self) -> Result<LoadReport> {
        let text = self.source.fetch_text().await?;
        let parsed = parse_table(&text);
        let expected = parsed.entities.len();
        let current = self.catalog.count().await?;

        if current == expected && current > 0 {
            info!(count = current, source = %self.source, "Catalog is current");
            return Ok(LoadReport {
                loaded: false,
                count: current,
                previous: current,
                rejected_rows: parsed.rejected_rows,
                parse_errors: parsed.parse_errors,
            });
        }

        if current > 0 {
            info!(
                "Catalog has {} videos but archive has {}, clearing and re-importing",
                current, expected
            );
            self.catalog.clear().await?;
        }

        for (index, chunk) in parsed.entities.chunks(self.batch_size).enumerate() {
            self.catalog.bulk_upsert(chunk).await?;
            debug!(batch = index + 1, rows = chunk.len(), "Upserted batch");
        }

        info!(
            count = expected,
            rejected = parsed.rejected_rows,
            parse_errors = parsed.parse_errors,
            source = %self.source,
            "Archive imported"
        );

        Ok(LoadReport {
            loaded: true,
            count: expected,
            previous: current,
            rejected_rows: parsed.rejected_rows,
            parse_errors: parsed.parse_errors,
        })
    }

    async fn reset_locked(&self) -> Result<()> {
        let mut tx = self.catalog.pool().begin().await?;
        CatalogStore::clear_in(&mut tx).await?;
        AnnotationStore::clear_in(&mut tx).await?;
        tx.commit().await?;

        info!("Catalog and flags cleared");
        Ok(())
    }
}
