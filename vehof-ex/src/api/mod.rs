//! HTTP API handlers for vehof-ex

pub mod archive;
pub mod buildinfo;
pub mod flags;
pub mod health;
pub mod session;
pub mod status;
pub mod videos;

use axum::routing::{get, post, put};
use axum::Router;

use crate::AppState;

pub use buildinfo::get_build_info;
pub use health::health_routes;

/// Status line and build identification
pub fn status_routes() -> Router<AppState> {
    Router::new()
        .route("/api/status", get(status::get_status))
        .route("/api/buildinfo", get(buildinfo::get_build_info))
}

/// Stateless catalog queries
pub fn video_routes() -> Router<AppState> {
    Router::new()
        .route("/api/videos", get(videos::list_videos))
        .route("/api/videos/:id", get(videos::get_video))
        .route("/api/topics", get(videos::list_topics))
}

/// Personal flags
pub fn flag_routes() -> Router<AppState> {
    Router::new()
        .route("/api/flags", get(flags::list_flags).delete(flags::clear_flags))
        .route("/api/flags/:id/:kind", put(flags::set_flag))
        .route("/api/flags/:id/:kind/toggle", post(flags::toggle_flag))
}

/// Import and reset
pub fn archive_routes() -> Router<AppState> {
    Router::new()
        .route("/api/archive/reload", post(archive::reload))
        .route("/api/archive/reset", post(archive::reset))
}

/// Interactive single-user session
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/session", get(session::get_session))
        .route("/api/session/query", put(session::set_query))
        .route("/api/session/search", put(session::set_search))
        .route("/api/session/more", post(session::show_more))
}
