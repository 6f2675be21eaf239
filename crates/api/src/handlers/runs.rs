//! Handlers for the `/runs` resource.
//!
//! Routes:
//! - `POST /runs`                                 — start a run (multipart)
//! - `GET  /runs/{id}`                            — run snapshot
//! - `GET  /runs/{id}/events`                     — progress stream (SSE)
//! - `GET  /runs/{id}/scenes/{n}/storyboard`      — storyboard image bytes
//! - `GET  /runs/{id}/scenes/{n}/video`           — video clip bytes

use std::convert::Infallible;

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use storyreel_core::character::{
    sniff_image, validate_character_count, validate_idea, validate_name,
};
use storyreel_core::{Character, CoreError, RunId, RunSnapshot};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Response payload for a newly accepted run.
#[derive(Debug, Serialize)]
pub struct StartRunResponse {
    pub run_id: RunId,
    pub status: &'static str,
}

/// POST /api/v1/runs
///
/// Accepts a multipart form:
/// - `idea` (required): the free-text story idea.
/// - `character_name` (repeatable): starts a new character.
/// - `character_image` (repeatable): attaches a reference image to the
///   most recently named character; if no character is open, one is
///   created with a placeholder name.
///
/// Field order matters: an image binds to the name that precedes it.
/// Inputs are validated here; on success the pipeline runs in a detached
/// task and the handler returns `202 Accepted` immediately.
pub async fn start_run(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<StartRunResponse>>)> {
    let mut idea: Option<String> = None;
    let mut characters: Vec<Character> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "idea" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                idea = Some(text);
            }
            "character_name" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                validate_name(&text)?;
                validate_character_count(characters.len() + 1)?;
                characters.push(Character::new(text.trim().to_string()));
            }
            "character_image" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                let image = sniff_image(data.to_vec())?;
                match characters.last_mut() {
                    Some(character) if character.image.is_none() => {
                        character.image = Some(image);
                    }
                    _ => {
                        validate_character_count(characters.len() + 1)?;
                        let placeholder = format!("Character {}", characters.len() + 1);
                        characters.push(Character::new(placeholder).with_image(image));
                    }
                }
            }
            _ => {} // ignore unknown fields
        }
    }

    let idea =
        idea.ok_or_else(|| AppError::BadRequest("Missing required 'idea' field".to_string()))?;
    validate_idea(&idea)?;
    validate_character_count(characters.len())?;

    let run_id = RunId::new_v4();
    state
        .registry
        .insert(RunSnapshot::new(run_id, idea.clone(), &characters))
        .await;

    tracing::info!(%run_id, characters = characters.len(), "Run accepted");

    tokio::spawn(storyreel_pipeline::run(
        state.service.clone(),
        state.registry.clone(),
        state.bus.clone(),
        run_id,
        idea,
        characters,
    ));

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: StartRunResponse {
                run_id,
                status: "pending",
            },
        }),
    ))
}

/// GET /api/v1/runs/{id}
///
/// Returns the current snapshot of a run. Media bytes are elided; they
/// are served by the scene asset endpoints.
pub async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<RunId>,
) -> AppResult<Json<DataResponse<RunSnapshot>>> {
    let snapshot = state
        .registry
        .snapshot(run_id)
        .await
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Run",
            id: run_id,
        }))?;
    Ok(Json(DataResponse { data: snapshot }))
}

/// GET /api/v1/runs/{id}/events
///
/// Server-sent event stream of progress events for one run. Events for
/// other runs on the shared bus are filtered out. Clients that connect
/// after the run finished receive no replay; they should fetch the
/// snapshot first and use this stream for live updates.
pub async fn run_events(
    State(state): State<AppState>,
    Path(run_id): Path<RunId>,
) -> AppResult<impl IntoResponse> {
    if !state.registry.contains(run_id).await {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Run",
            id: run_id,
        }));
    }

    let stream = BroadcastStream::new(state.bus.subscribe()).filter_map(move |event| {
        match event {
            Ok(event) if event.run_id == run_id => SseEvent::default()
                .json_data(&event)
                .ok()
                .map(Ok::<_, Infallible>),
            // Other runs' events and lagged-receiver errors are skipped.
            _ => None,
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// GET /api/v1/runs/{id}/scenes/{scene_number}/storyboard
///
/// Serves the raw storyboard image for one scene with its sniffed
/// content type. 404 until the pipeline has published it.
pub async fn get_storyboard(
    State(state): State<AppState>,
    Path((run_id, scene_number)): Path<(RunId, i32)>,
) -> AppResult<impl IntoResponse> {
    ensure_run_exists(&state, run_id).await?;

    let (mime_type, bytes) = state
        .registry
        .storyboard_bytes(run_id, scene_number)
        .await
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "storyboard for scene {scene_number} is not available"
            ))
        })?;

    Ok(([(header::CONTENT_TYPE, mime_type)], bytes))
}

/// GET /api/v1/runs/{id}/scenes/{scene_number}/video
///
/// Serves the raw video clip for one scene. 404 until published.
pub async fn get_video(
    State(state): State<AppState>,
    Path((run_id, scene_number)): Path<(RunId, i32)>,
) -> AppResult<impl IntoResponse> {
    ensure_run_exists(&state, run_id).await?;

    let (mime_type, bytes) = state
        .registry
        .video_bytes(run_id, scene_number)
        .await
        .ok_or_else(|| {
            AppError::NotFound(format!("video for scene {scene_number} is not available"))
        })?;

    Ok(([(header::CONTENT_TYPE, mime_type)], bytes))
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Distinguish an unknown run (404 with the run id) from an asset that
/// has not been published yet (404 with the scene number).
async fn ensure_run_exists(state: &AppState, run_id: RunId) -> AppResult<()> {
    if state.registry.contains(run_id).await {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Run",
            id: run_id,
        }))
    }
}
