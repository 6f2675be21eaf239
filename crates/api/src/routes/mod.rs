pub mod health;
pub mod runs;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /runs                                 start a run (POST, multipart)
/// /runs/{id}                            run snapshot (GET)
/// /runs/{id}/events                     progress stream (GET, SSE)
/// /runs/{id}/scenes/{n}/storyboard      storyboard image bytes (GET)
/// /runs/{id}/scenes/{n}/video           video clip bytes (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/runs", runs::router())
}
