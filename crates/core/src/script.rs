//! Scene definitions and script shape validation.
//!
//! The generation API is asked for a JSON array of scenes matching a
//! fixed schema. The API's ordering is not trusted: [`validate_script`]
//! sorts by scene number and rejects anything that is not exactly
//! `1..=N` with no duplicates or gaps.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Number of scenes the script prompt asks for. The pipeline itself
/// handles any non-empty count; this only shapes the request.
pub const REQUESTED_SCENE_COUNT: usize = 3;

/// One narrative segment of the script, as returned by script generation.
/// Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// 1-based position of the scene within the script.
    pub scene_number: i32,
    /// Human-readable summary shown alongside the results.
    pub description: String,
    /// Prompt used for both storyboard and video generation.
    pub video_prompt: String,
}

/// Validate and normalize a parsed script.
///
/// - Empty scripts are rejected (the service returned `[]`).
/// - Scenes are sorted by `scene_number`; out-of-order responses are
///   accepted and fixed up rather than trusted.
/// - Scene numbers must be exactly `1..=N`: duplicates, gaps, and
///   non-positive numbers are all rejected.
pub fn validate_script(mut scenes: Vec<Scene>) -> Result<Vec<Scene>, CoreError> {
    if scenes.is_empty() {
        return Err(CoreError::Validation(
            "script contains no scenes".to_string(),
        ));
    }

    scenes.sort_by_key(|scene| scene.scene_number);

    for (index, scene) in scenes.iter().enumerate() {
        let expected = index as i32 + 1;
        if scene.scene_number != expected {
            return Err(CoreError::Validation(format!(
                "scene numbers must be contiguous starting at 1; expected {expected}, got {}",
                scene.scene_number
            )));
        }
    }

    Ok(scenes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
