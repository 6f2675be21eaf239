//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`RunBus`] is the publish/subscribe hub for [`RunEvent`]s. It is
//! shared as `Arc<RunBus>` between the pipeline (publisher) and the API
//! layer (the SSE endpoint subscribes per connected client). Events are
//! a progress hook, not load-bearing state; the run registry remains
//! authoritative.

use chrono::{DateTime, Utc};
use serde::Serialize;
use storyreel_core::RunId;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// RunEvent
// ---------------------------------------------------------------------------

/// What happened during a run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEventKind {
    /// The pipeline task picked up the run.
    RunStarted,
    /// One character's image was captioned.
    CharacterDescribed { name: String },
    /// The script passed validation; scene work begins.
    ScriptReady { scene_count: usize },
    /// A storyboard still was published for a scene.
    StoryboardReady { scene_number: i32 },
    /// A video clip was published for a scene.
    VideoReady { scene_number: i32 },
    /// Every scene produced a storyboard and a video.
    RunCompleted,
    /// The pipeline aborted with a single user-visible message.
    RunFailed { message: String },
}

/// A progress event for one generation run.
#[derive(Debug, Clone, Serialize)]
pub struct RunEvent {
    /// Run this event belongs to.
    pub run_id: RunId,
    /// What happened.
    #[serde(flatten)]
    pub kind: RunEventKind,
    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl RunEvent {
    /// Create an event stamped with the current time.
    pub fn new(run_id: RunId, kind: RunEventKind) -> Self {
        Self {
            run_id,
            kind,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// RunBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out bus for run progress events.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`RunEvent`].
pub struct RunBus {
    sender: broadcast::Sender<RunEvent>,
}

impl RunBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed events are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With zero subscribers the event is silently dropped; progress is
    /// still recorded in the run registry, so nothing is lost.
    pub fn publish(&self, event: RunEvent) {
        // Ignore the SendError -- it only means there are no receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.sender.subscribe()
    }
}

impl Default for RunBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
