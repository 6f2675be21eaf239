//! In-memory run state.
//!
//! A [`RunSnapshot`] is the authoritative record of one generation run:
//! inputs, lifecycle status, and the per-scene results that accumulate
//! as the pipeline progresses. Snapshots serialize to JSON for the API,
//! but raw media bytes are never embedded in that JSON -- the API serves
//! them from dedicated asset endpoints instead.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::character::Character;
use crate::script::Scene;
use crate::service::{ImagePayload, VideoPayload};
use crate::types::RunId;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Accepted but the pipeline task has not started work yet.
    Pending,
    /// The pipeline is executing.
    Running,
    /// All scenes produced a storyboard and a video.
    Completed,
    /// The pipeline aborted; `error` carries the message.
    Failed,
}

// ---------------------------------------------------------------------------
// Per-scene results
// ---------------------------------------------------------------------------

/// A generated storyboard still for one scene. The bytes are retained
/// because they seed the subsequent video generation call.
#[derive(Debug, Clone, Serialize)]
pub struct StoryboardImage {
    /// Scene this image belongs to.
    pub scene_number: i32,
    /// Mime type of the image payload.
    pub mime_type: String,
    /// Raw image bytes; served by the asset endpoint, not the JSON snapshot.
    #[serde(skip_serializing)]
    pub bytes: Vec<u8>,
}

/// A generated video clip for one scene.
#[derive(Debug, Clone, Serialize)]
pub struct VideoResult {
    /// Scene this clip belongs to.
    pub scene_number: i32,
    /// Mime type of the video payload.
    pub mime_type: String,
    /// Raw video bytes; served by the asset endpoint, not the JSON snapshot.
    #[serde(skip_serializing)]
    pub bytes: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Character view
// ---------------------------------------------------------------------------

/// Serializable view of a character (image bytes elided).
#[derive(Debug, Clone, Serialize)]
pub struct CharacterView {
    pub name: String,
    pub has_image: bool,
    pub description: Option<String>,
}

impl From<&Character> for CharacterView {
    fn from(character: &Character) -> Self {
        Self {
            name: character.name.clone(),
            has_image: character.image.is_some(),
            description: character.description.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// RunSnapshot
// ---------------------------------------------------------------------------

/// The full state of one generation run.
///
/// The pipeline appends to `storyboards` and `videos` strictly in scene
/// order: scene `k` results only appear once scenes `1..k-1` are fully
/// complete. On failure, results already published stay in place.
#[derive(Debug, Clone, Serialize)]
pub struct RunSnapshot {
    pub run_id: RunId,
    pub status: RunStatus,
    pub idea: String,
    pub characters: Vec<CharacterView>,
    pub scenes: Vec<Scene>,
    pub storyboards: Vec<StoryboardImage>,
    pub videos: Vec<VideoResult>,
    /// Single human-readable message when `status` is `Failed`.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RunSnapshot {
    /// Create a pending snapshot from the validated inputs.
    pub fn new(run_id: RunId, idea: String, characters: &[Character]) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            status: RunStatus::Pending,
            idea,
            characters: characters.iter().map(CharacterView::from).collect(),
            scenes: Vec::new(),
            storyboards: Vec::new(),
            videos: Vec::new(),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Mark the run as started.
    pub fn mark_running(&mut self) {
        self.status = RunStatus::Running;
        self.touch();
    }

    /// Replace the character views with their described counterparts.
    pub fn set_characters(&mut self, characters: &[Character]) {
        self.characters = characters.iter().map(CharacterView::from).collect();
        self.touch();
    }

    /// Record the validated scene list.
    pub fn set_scenes(&mut self, scenes: Vec<Scene>) {
        self.scenes = scenes;
        self.touch();
    }

    /// Publish a storyboard image for the next scene in order.
    pub fn push_storyboard(&mut self, scene_number: i32, image: ImagePayload) {
        self.storyboards.push(StoryboardImage {
            scene_number,
            mime_type: image.mime_type,
            bytes: image.bytes,
        });
        self.touch();
    }

    /// Publish a video clip for the next scene in order.
    pub fn push_video(&mut self, scene_number: i32, video: VideoPayload) {
        self.videos.push(VideoResult {
            scene_number,
            mime_type: video.mime_type,
            bytes: video.bytes,
        });
        self.touch();
    }

    /// Mark the run as fully complete.
    pub fn mark_completed(&mut self) {
        self.status = RunStatus::Completed;
        self.touch();
    }

    /// Mark the run as failed with a single user-visible message.
    /// Already-published results are left in place.
    pub fn mark_failed(&mut self, message: String) {
        self.status = RunStatus::Failed;
        self.error = Some(message);
        self.touch();
    }

    /// Look up the storyboard image for a scene, if published.
    pub fn storyboard(&self, scene_number: i32) -> Option<&StoryboardImage> {
        self.storyboards
            .iter()
            .find(|image| image.scene_number == scene_number)
    }

    /// Look up the video clip for a scene, if published.
    pub fn video(&self, scene_number: i32) -> Option<&VideoResult> {
        self.videos
            .iter()
            .find(|video| video.scene_number == scene_number)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
