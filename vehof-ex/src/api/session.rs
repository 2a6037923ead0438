//! Interactive session endpoints
//!
//! The session keeps one query and its visible window. Structured changes
//! apply immediately; free text is debounced and a superseded request
//! returns `{"superseded": true}` without running its query.

use std::collections::BTreeSet;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::videos::{parse_mode, parse_sort, query_page, shuffle_seed, VideoPage};
use crate::error::ApiResult;
use crate::query::{DurationBucket, QuerySpec};
use crate::AppState;

/// Body of `PUT /api/session/query`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StructuredQuery {
    pub topics: Vec<String>,
    pub durations: Vec<DurationBucket>,
    pub owner: Option<String>,
    pub mode: Option<String>,
    /// Absent keeps newest-first; `"none"` keeps relevance order
    pub sort: Option<String>,
    pub seed: Option<u64>,
    pub shuffle: bool,
}

impl StructuredQuery {
    /// Build the structured spec
    ///
    /// `shuffle` without a `seed` keeps the seed already in `current`, so
    /// repeating the same request does not reshuffle.
    pub fn to_spec(&self, current: &QuerySpec) -> ApiResult<QuerySpec> {
        let seed = match (self.seed, self.shuffle, current.shuffle_seed) {
            (None, true, Some(kept)) => Some(kept),
            (seed, shuffle, _) => shuffle_seed(seed, shuffle),
        };

        Ok(QuerySpec {
            text: String::new(),
            topics: self.topics.iter().cloned().collect::<BTreeSet<_>>(),
            durations: self.durations.iter().copied().collect(),
            owner: self.owner.clone().filter(|o| !o.trim().is_empty()),
            mode: parse_mode(self.mode.as_deref())?,
            sort: parse_sort(self.sort.as_deref())?,
            shuffle_seed: seed,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub spec: QuerySpec,
    #[serde(flatten)]
    pub page: VideoPage,
}

async fn current(state: &AppState) -> SessionResponse {
    let (spec, pager) = {
        let session = state.session.lock().await;
        (session.spec().clone(), *session.pager())
    };
    let page = query_page(state, &spec, &pager).await;
    SessionResponse { spec, page }
}

/// GET /api/session
pub async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    Json(current(&state).await)
}

/// PUT /api/session/query
pub async fn set_query(
    State(state): State<AppState>,
    Json(request): Json<StructuredQuery>,
) -> ApiResult<Json<SessionResponse>> {
    let changed = {
        let mut session = state.session.lock().await;
        let spec = request.to_spec(session.spec())?;
        session.set_structured(spec)
    };
    debug!(changed, "Session query replaced");

    Ok(Json(current(&state).await))
}

/// PUT /api/session/search
pub async fn set_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Response {
    if !state.debouncer.settle().await {
        debug!(text = %request.text, "Search superseded");
        return Json(json!({ "superseded": true })).into_response();
    }

    state.session.lock().await.set_text(request.text);
    Json(current(&state).await).into_response()
}

/// POST /api/session/more
pub async fn show_more(State(state): State<AppState>) -> Json<SessionResponse> {
    let visible = state.session.lock().await.show_more();
    debug!(visible, "Session window grown");

    Json(current(&state).await)
}
