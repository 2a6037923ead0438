//! Status line endpoint

use axum::{extract::State, Json};
use serde::Serialize;

use crate::services::ListCounts;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// "Imported N videos", "Loaded N videos", or the last load error
    pub status: String,
    pub catalog_count: usize,
    pub source: String,
    pub lists: ListCounts,
}

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: state.status().await,
        catalog_count: state.snapshot().await.len(),
        source: state.loader.source().to_string(),
        lists: state.flags.counts().await,
    })
}
