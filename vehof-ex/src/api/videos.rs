//! Catalog query endpoints
//!
//! `GET /api/videos` runs one stateless query built from the query string.
//! List parameters (`topics`, `durations`) are comma-separated. `sort=none`
//! keeps relevance order; `shuffle=true` without a `seed` picks a random
//! seed.

use std::collections::{BTreeSet, HashMap};

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use vehof_common::format::{format_compact_number, format_duration};
use vehof_common::normalize::parse_number_loose;
use vehof_common::thumbnails::ThumbnailSet;
use vehof_common::{Entity, Flag};

use crate::error::{ApiError, ApiResult};
use crate::pagination::Pager;
use crate::query::{run_query, topic_counts, DurationBucket, ListMode, QuerySpec, SortKey, TopicCount};
use crate::services::ListCounts;
use crate::AppState;

/// Query string for `GET /api/videos`
#[derive(Debug, Default, Deserialize)]
pub struct VideosParams {
    pub q: Option<String>,
    pub topics: Option<String>,
    pub durations: Option<String>,
    pub owner: Option<String>,
    pub mode: Option<String>,
    pub sort: Option<String>,
    pub seed: Option<u64>,
    #[serde(default)]
    pub shuffle: bool,
    pub limit: Option<usize>,
}

impl VideosParams {
    pub fn to_spec(&self) -> ApiResult<QuerySpec> {
        let topics = split_list(self.topics.as_deref()).collect();
        let durations = split_list(self.durations.as_deref())
            .map(|d| d.parse::<DurationBucket>())
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(QuerySpec {
            text: self.q.clone().unwrap_or_default(),
            topics,
            durations,
            owner: self.owner.clone().filter(|o| !o.trim().is_empty()),
            mode: parse_mode(self.mode.as_deref())?,
            sort: parse_sort(self.sort.as_deref())?,
            shuffle_seed: shuffle_seed(self.seed, self.shuffle),
        })
    }
}

fn split_list(value: Option<&str>) -> impl Iterator<Item = String> + '_ {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn parse_mode(value: Option<&str>) -> ApiResult<ListMode> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s.parse()?),
        _ => Ok(ListMode::default()),
    }
}

/// Absent keeps the default (newest); `none` disables sorting
pub(crate) fn parse_sort(value: Option<&str>) -> ApiResult<Option<SortKey>> {
    match value.map(str::trim) {
        None | Some("") => Ok(QuerySpec::default().sort),
        Some("none") => Ok(None),
        Some(s) => Ok(Some(s.parse()?)),
    }
}

pub(crate) fn shuffle_seed(seed: Option<u64>, shuffle: bool) -> Option<u64> {
    match (seed, shuffle) {
        (Some(seed), _) => Some(seed),
        (None, true) => Some(rand::random()),
        (None, false) => None,
    }
}

/// One entity plus its flags and display helpers
#[derive(Debug, Clone, Serialize)]
pub struct VideoItem {
    #[serde(flatten)]
    pub entity: Entity,
    pub watched: bool,
    pub watch_later: bool,
    pub favorite: bool,
    pub thumbnails: Option<ThumbnailSet>,
    pub duration_label: String,
    pub views_label: String,
}

impl VideoItem {
    pub fn new(entity: &Entity, flag: Option<&Flag>) -> Self {
        Self {
            entity: entity.clone(),
            watched: flag.map_or(false, |f| f.watched),
            watch_later: flag.map_or(false, |f| f.watch_later),
            favorite: flag.map_or(false, |f| f.favorite),
            thumbnails: ThumbnailSet::for_media_id(entity.media_id.as_deref()),
            duration_label: format_duration(entity.duration_seconds, entity.duration.as_deref()),
            views_label: format_compact_number(parse_number_loose(entity.view_count.as_deref())),
        }
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
pub struct VideoPage {
    pub items: Vec<VideoItem>,
    pub total: usize,
    pub list_total: usize,
    pub visible: usize,
    pub has_more: bool,
    pub lists: ListCounts,
}

/// Run a query against the current snapshots and render one page
pub(crate) async fn query_page(state: &AppState, spec: &QuerySpec, pager: &Pager) -> VideoPage {
    let entities = state.snapshot().await;
    let flags = state.flags.snapshot().await;
    render_page(&entities, &flags, spec, pager)
}

pub(crate) fn render_page(
    entities: &[Entity],
    flags: &HashMap<String, Flag>,
    spec: &QuerySpec,
    pager: &Pager,
) -> VideoPage {
    let result = run_query(entities, flags, spec, pager.visible());

    VideoPage {
        items: result
            .items
            .iter()
            .map(|e| VideoItem::new(e, flags.get(&e.id)))
            .collect(),
        total: result.total,
        list_total: result.list_total,
        visible: pager.visible(),
        has_more: pager.has_more(result.total),
        lists: ListCounts::from_flags(flags),
    }
}

/// GET /api/videos
pub async fn list_videos(
    State(state): State<AppState>,
    Query(params): Query<VideosParams>,
) -> ApiResult<Json<VideoPage>> {
    let spec = params.to_spec()?;
    let pager = Pager::new(params.limit.unwrap_or(state.settings.page_increment));

    Ok(Json(query_page(&state, &spec, &pager).await))
}

/// GET /api/videos/:id
pub async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<VideoItem>> {
    let entities = state.snapshot().await;
    let entity = entities
        .iter()
        .find(|e| e.id == id)
        .ok_or_else(|| ApiError::NotFound(format!("video {}", id)))?;
    let flag = state.flags.get(&id).await;

    Ok(Json(VideoItem::new(entity, flag.as_ref())))
}

/// GET /api/topics
pub async fn list_topics(State(state): State<AppState>) -> Json<Vec<TopicCount>> {
    Json(topic_counts(&state.snapshot().await))
}
