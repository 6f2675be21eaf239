//! Orchestration of one generation run.
//!
//! Step order is fixed: describe characters (concurrent fan-out, the
//! only parallelism), generate and validate the script, then for each
//! scene in order generate the storyboard still and then the video,
//! fully completing one scene before starting the next. Any failure
//! aborts the remaining work; results already published stay visible.

use std::sync::Arc;

use futures::future;

use storyreel_core::{
    script, Character, CoreError, GenerationError, GenerationService, RunId,
};
use storyreel_events::{RunBus, RunEvent, RunEventKind};

use crate::registry::RunRegistry;

/// A pipeline stage failure. The display strings are the fixed
/// user-visible messages; the wrapped source carries the detail for
/// logs.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The image-understanding step failed for some character.
    #[error("failed to analyze character image")]
    CharacterAnalysis(#[source] GenerationError),

    /// The script-generation call failed.
    #[error("failed to generate video script")]
    ScriptGeneration(#[source] GenerationError),

    /// The script came back but did not pass shape validation
    /// (empty, duplicate numbers, gaps).
    #[error("failed to generate video script: {0}")]
    ScriptInvalid(String),

    /// Storyboard generation failed for a scene.
    #[error("failed to generate a storyboard image")]
    Storyboard {
        scene_number: i32,
        #[source]
        source: GenerationError,
    },

    /// Video generation failed for a scene (submission, polling,
    /// missing download link, or payload fetch).
    #[error("failed to generate a video clip")]
    VideoClip {
        scene_number: i32,
        #[source]
        source: GenerationError,
    },
}

/// Drive one run to completion.
///
/// Never returns an error: failures are caught here (the outermost
/// orchestration level), logged, recorded on the snapshot as a single
/// message, and published as a `RunFailed` event.
pub async fn run(
    service: Arc<dyn GenerationService>,
    registry: Arc<RunRegistry>,
    bus: Arc<RunBus>,
    run_id: RunId,
    idea: String,
    characters: Vec<Character>,
) {
    match execute(&service, &registry, &bus, run_id, &idea, characters).await {
        Ok(()) => {
            tracing::info!(%run_id, "Run completed");
            registry.update(run_id, |snap| snap.mark_completed()).await;
            bus.publish(RunEvent::new(run_id, RunEventKind::RunCompleted));
        }
        Err(err) => {
            tracing::error!(%run_id, error = ?err, "Run failed");
            let message = err.to_string();
            registry
                .update(run_id, |snap| snap.mark_failed(message.clone()))
                .await;
            bus.publish(RunEvent::new(run_id, RunEventKind::RunFailed { message }));
        }
    }
}

async fn execute(
    service: &Arc<dyn GenerationService>,
    registry: &RunRegistry,
    bus: &RunBus,
    run_id: RunId,
    idea: &str,
    characters: Vec<Character>,
) -> Result<(), PipelineError> {
    registry.update(run_id, |snap| snap.mark_running()).await;
    bus.publish(RunEvent::new(run_id, RunEventKind::RunStarted));

    // Step 1: describe characters. Concurrent across characters,
    // all-or-nothing: one failure aborts the whole batch before any
    // scene work happens.
    let describe_tasks = characters.into_iter().map(|character| {
        let service = Arc::clone(service);
        async move {
            let description = match &character.image {
                Some(image) => Some(service.describe_image(image).await?),
                None => None,
            };
            Ok::<_, GenerationError>(match description {
                Some(description) => character.with_description(description),
                None => character,
            })
        }
    });
    let characters = future::try_join_all(describe_tasks)
        .await
        .map_err(PipelineError::CharacterAnalysis)?;

    registry
        .update(run_id, |snap| snap.set_characters(&characters))
        .await;
    for character in characters.iter().filter(|c| c.description.is_some()) {
        bus.publish(RunEvent::new(
            run_id,
            RunEventKind::CharacterDescribed {
                name: character.name.clone(),
            },
        ));
    }

    // Step 2: generate and validate the script.
    let notes = character_notes(&characters);
    let raw_scenes = service
        .generate_script(idea, &notes)
        .await
        .map_err(PipelineError::ScriptGeneration)?;

    let scenes = script::validate_script(raw_scenes).map_err(|err| {
        PipelineError::ScriptInvalid(match err {
            CoreError::Validation(msg) => msg,
            other => other.to_string(),
        })
    })?;

    registry
        .update(run_id, |snap| snap.set_scenes(scenes.clone()))
        .await;
    bus.publish(RunEvent::new(
        run_id,
        RunEventKind::ScriptReady {
            scene_count: scenes.len(),
        },
    ));

    // Step 3: per-scene storyboard + video, strictly sequential.
    for scene in &scenes {
        let scene_number = scene.scene_number;

        let still = service
            .generate_still_image(&scene.video_prompt)
            .await
            .map_err(|source| PipelineError::Storyboard {
                scene_number,
                source,
            })?;
        registry
            .update(run_id, |snap| snap.push_storyboard(scene_number, still.clone()))
            .await;
        bus.publish(RunEvent::new(
            run_id,
            RunEventKind::StoryboardReady { scene_number },
        ));

        // The storyboard still seeds the video for the same scene.
        let video = service
            .generate_video(&scene.video_prompt, &still)
            .await
            .map_err(|source| PipelineError::VideoClip {
                scene_number,
                source,
            })?;
        registry
            .update(run_id, |snap| snap.push_video(scene_number, video))
            .await;
        bus.publish(RunEvent::new(
            run_id,
            RunEventKind::VideoReady { scene_number },
        ));
    }

    Ok(())
}

/// Concatenate name + description for every character that has a
/// description; the result feeds the script prompt.
fn character_notes(characters: &[Character]) -> String {
    characters
        .iter()
        .filter_map(|character| {
            character
                .description
                .as_ref()
                .map(|description| format!("{}: {}", character.name, description))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
