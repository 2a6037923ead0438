//! Flag endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use vehof_common::{Flag, FlagKind};

use crate::error::{ApiError, ApiResult};
use crate::services::ListCounts;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct FlagsResponse {
    pub flags: Vec<Flag>,
    pub lists: ListCounts,
}

#[derive(Debug, Deserialize)]
pub struct SetFlagRequest {
    pub value: bool,
}

/// GET /api/flags
pub async fn list_flags(State(state): State<AppState>) -> Json<FlagsResponse> {
    let snapshot = state.flags.snapshot().await;
    let mut flags: Vec<Flag> = snapshot.values().cloned().collect();
    flags.sort_by(|a, b| a.id.cmp(&b.id));

    Json(FlagsResponse {
        flags,
        lists: ListCounts::from_flags(&snapshot),
    })
}

/// PUT /api/flags/:id/:kind
pub async fn set_flag(
    State(state): State<AppState>,
    Path((id, kind)): Path<(String, String)>,
    Json(request): Json<SetFlagRequest>,
) -> ApiResult<Json<Flag>> {
    let kind = resolve(&state, &id, &kind).await?;
    Ok(Json(state.flags.set_flag(&id, kind, request.value).await?))
}

/// POST /api/flags/:id/:kind/toggle
pub async fn toggle_flag(
    State(state): State<AppState>,
    Path((id, kind)): Path<(String, String)>,
) -> ApiResult<Json<Flag>> {
    let kind = resolve(&state, &id, &kind).await?;
    Ok(Json(state.flags.toggle_flag(&id, kind).await?))
}

/// DELETE /api/flags
pub async fn clear_flags(State(state): State<AppState>) -> ApiResult<StatusCode> {
    state.flags.clear_all().await?;
    Ok(StatusCode::NO_CONTENT)
}

// Flags may only be attached to catalog entities
async fn resolve(state: &AppState, id: &str, kind: &str) -> ApiResult<FlagKind> {
    let kind = kind.parse::<FlagKind>()?;
    if !state.snapshot().await.iter().any(|e| e.id == id) {
        return Err(ApiError::NotFound(format!("video {}", id)));
    }
    Ok(kind)
}
