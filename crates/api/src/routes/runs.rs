use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use storyreel_core::character::{MAX_CHARACTERS, MAX_IMAGE_BYTES};

use crate::handlers::runs;
use crate::state::AppState;

/// Multipart body cap: every character image at its limit plus form overhead.
const BODY_LIMIT: usize = MAX_IMAGE_BYTES * MAX_CHARACTERS + 64 * 1024;

/// Mount run routes (intended to be nested under `/api/v1/runs`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(runs::start_run))
        .route("/{id}", get(runs::get_run))
        .route("/{id}/events", get(runs::run_events))
        .route(
            "/{id}/scenes/{scene_number}/storyboard",
            get(runs::get_storyboard),
        )
        .route("/{id}/scenes/{scene_number}/video", get(runs::get_video))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
}
