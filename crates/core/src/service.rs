//! The seam between the pipeline and the external generation API.
//!
//! [`GenerationService`] abstracts the four operations the pipeline needs
//! (image understanding, script generation, still generation, video
//! generation) so that the orchestration logic can be exercised against a
//! mock in tests and against the Gemini REST client in production.

use async_trait::async_trait;

use crate::script::Scene;

/// An image with its mime type, as uploaded or as returned by the
/// generation API. The raw bytes double as the seed input for video
/// generation, so they are kept alongside the mime type rather than
/// being converted to a display-only form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Mime type, e.g. `image/png`.
    pub mime_type: String,
    /// Raw encoded image bytes.
    pub bytes: Vec<u8>,
}

/// A finished video clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoPayload {
    /// Mime type, e.g. `video/mp4`.
    pub mime_type: String,
    /// Raw encoded video bytes.
    pub bytes: Vec<u8>,
}

/// Errors surfaced by a [`GenerationService`] implementation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("Request failed: {0}")]
    Request(String),

    /// The API returned a non-2xx status code.
    #[error("Generation API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A 2xx response did not have the expected shape.
    #[error("Malformed API response: {0}")]
    Malformed(String),

    /// The long-running video job itself reported a failure.
    #[error("Video job failed: {0}")]
    Job(String),

    /// A long-running video job did not finish within the attempt budget.
    #[error("Video generation did not complete after {attempts} status checks")]
    PollTimeout {
        /// Number of status checks performed before giving up.
        attempts: u32,
    },

    /// The completed video operation carried no download link.
    #[error("Completed video operation has no download link")]
    MissingVideoUri,
}

/// The four logical operations required of the external generation API.
///
/// Implementations must be cheap to share (`Arc<dyn GenerationService>`)
/// since the character-description step fans out concurrent calls.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Produce a free-form descriptive caption for a character image.
    async fn describe_image(&self, image: &ImagePayload) -> Result<String, GenerationError>;

    /// Produce the scene list for an idea, given concatenated character
    /// notes (name + description per character).
    ///
    /// Implementations return the scenes as parsed; ordering and shape
    /// validation is the caller's responsibility
    /// (see [`crate::script::validate_script`]).
    async fn generate_script(
        &self,
        idea: &str,
        character_notes: &str,
    ) -> Result<Vec<Scene>, GenerationError>;

    /// Generate a single still image (fixed 16:9 aspect) for a scene prompt.
    async fn generate_still_image(&self, prompt: &str) -> Result<ImagePayload, GenerationError>;

    /// Generate a video clip for a scene prompt, seeded with its
    /// storyboard image. Implementations handle job submission, status
    /// polling, and payload download internally.
    async fn generate_video(
        &self,
        prompt: &str,
        seed_image: &ImagePayload,
    ) -> Result<VideoPayload, GenerationError>;
}
