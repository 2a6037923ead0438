//! Archive import and reset endpoints

use axum::{extract::State, Json};

use crate::error::ApiResult;
use crate::services::LoadReport;
use crate::AppState;

/// POST /api/archive/reload
///
/// Re-runs the loader; a catalog that already matches the source is left
/// untouched (`loaded: false`).
pub async fn reload(State(state): State<AppState>) -> ApiResult<Json<LoadReport>> {
    Ok(Json(state.load_archive().await?))
}

/// POST /api/archive/reset
///
/// Irreversible: clears catalog and flags, then imports again.
pub async fn reset(State(state): State<AppState>) -> ApiResult<Json<LoadReport>> {
    Ok(Json(state.reset_archive().await?))
}
