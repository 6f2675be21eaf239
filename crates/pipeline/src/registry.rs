//! In-memory registry of run snapshots.
//!
//! The registry is the authoritative mutable state of the service: the
//! pipeline task writes to it as results arrive and the API layer reads
//! from it. There is no persistence; a restart discards all runs.

use std::collections::HashMap;

use tokio::sync::RwLock;

use storyreel_core::{RunId, RunSnapshot};

/// Shared store of all runs, keyed by run id.
#[derive(Default)]
pub struct RunRegistry {
    runs: RwLock<HashMap<RunId, RunSnapshot>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new run.
    pub async fn insert(&self, snapshot: RunSnapshot) {
        self.runs.write().await.insert(snapshot.run_id, snapshot);
    }

    /// Clone the current snapshot of a run.
    pub async fn snapshot(&self, run_id: RunId) -> Option<RunSnapshot> {
        self.runs.read().await.get(&run_id).cloned()
    }

    /// Whether a run with this id exists.
    pub async fn contains(&self, run_id: RunId) -> bool {
        self.runs.read().await.contains_key(&run_id)
    }

    /// Apply a mutation to a run's snapshot under the write lock.
    ///
    /// Unknown run ids are ignored; the pipeline is the only writer and
    /// always inserts the snapshot before it starts.
    pub async fn update(&self, run_id: RunId, mutate: impl FnOnce(&mut RunSnapshot)) {
        if let Some(snapshot) = self.runs.write().await.get_mut(&run_id) {
            mutate(snapshot);
        }
    }

    /// Fetch the raw storyboard image for one scene, if published.
    /// Returns `(mime_type, bytes)`.
    pub async fn storyboard_bytes(
        &self,
        run_id: RunId,
        scene_number: i32,
    ) -> Option<(String, Vec<u8>)> {
        let runs = self.runs.read().await;
        let image = runs.get(&run_id)?.storyboard(scene_number)?;
        Some((image.mime_type.clone(), image.bytes.clone()))
    }

    /// Fetch the raw video clip for one scene, if published.
    /// Returns `(mime_type, bytes)`.
    pub async fn video_bytes(
        &self,
        run_id: RunId,
        scene_number: i32,
    ) -> Option<(String, Vec<u8>)> {
        let runs = self.runs.read().await;
        let video = runs.get(&run_id)?.video(scene_number)?;
        Some((video.mime_type.clone(), video.bytes.clone()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
