use std::time::Duration;

/// How long to wait between video job status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// How many status checks to perform before failing the job.
/// At the default interval this is a 10 minute ceiling.
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 60;

/// The credential is required up front; a missing key must stop the
/// process at startup rather than fail on the first request.
#[derive(Debug, thiserror::Error)]
pub enum GeminiConfigError {
    #[error("GEMINI_API_KEY must be set")]
    MissingApiKey,
}

/// Gemini client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key sent as `x-goog-api-key` on API calls and as a `key`
    /// query parameter on video downloads.
    pub api_key: String,
    /// API base URL; overridable so tests can point at a local server.
    pub base_url: String,
    /// Model for image captioning and script generation.
    pub text_model: String,
    /// Model for storyboard still generation.
    pub image_model: String,
    /// Model for video generation.
    pub video_model: String,
    /// Wait between video job status checks.
    pub poll_interval: Duration,
    /// Status check budget before a video job is declared timed out.
    pub max_poll_attempts: u32,
}

impl GeminiConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                   | Default                                     |
    /// |---------------------------|---------------------------------------------|
    /// | `GEMINI_API_KEY`          | (required)                                  |
    /// | `GEMINI_BASE_URL`         | `https://generativelanguage.googleapis.com` |
    /// | `GEMINI_TEXT_MODEL`       | `gemini-2.5-flash`                          |
    /// | `GEMINI_IMAGE_MODEL`      | `imagen-3.0-generate-002`                   |
    /// | `GEMINI_VIDEO_MODEL`      | `veo-2.0-generate-001`                      |
    /// | `VIDEO_POLL_INTERVAL_SECS`| `10`                                        |
    /// | `VIDEO_POLL_MAX_ATTEMPTS` | `60`                                        |
    pub fn from_env() -> Result<Self, GeminiConfigError> {
        let api_key =
            std::env::var("GEMINI_API_KEY").map_err(|_| GeminiConfigError::MissingApiKey)?;

        let base_url = std::env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".into());

        let text_model =
            std::env::var("GEMINI_TEXT_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".into());
        let image_model = std::env::var("GEMINI_IMAGE_MODEL")
            .unwrap_or_else(|_| "imagen-3.0-generate-002".into());
        let video_model =
            std::env::var("GEMINI_VIDEO_MODEL").unwrap_or_else(|_| "veo-2.0-generate-001".into());

        let poll_interval_secs: u64 = std::env::var("VIDEO_POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("VIDEO_POLL_INTERVAL_SECS must be a valid u64");

        let max_poll_attempts: u32 = std::env::var("VIDEO_POLL_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("VIDEO_POLL_MAX_ATTEMPTS must be a valid u32");

        Ok(Self {
            api_key,
            base_url,
            text_model,
            image_model,
            video_model,
            poll_interval: Duration::from_secs(poll_interval_secs),
            max_poll_attempts,
        })
    }

    /// Build a config pointing at an arbitrary base URL with default
    /// models. Used by tests against a local mock server.
    pub fn for_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            text_model: "gemini-2.5-flash".into(),
            image_model: "imagen-3.0-generate-002".into(),
            video_model: "veo-2.0-generate-001".into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }
}
