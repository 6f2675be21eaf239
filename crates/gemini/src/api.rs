//! REST client for the Gemini generation endpoints.
//!
//! Wraps `generateContent` (captioning, schema-constrained script
//! generation), `predict` (still images), and `predictLongRunning`
//! plus operation polling (video) using [`reqwest`].

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;

use storyreel_core::{GenerationError, GenerationService, ImagePayload, Scene, VideoPayload};

use crate::config::GeminiConfig;

/// HTTP client for the Gemini API.
pub struct GeminiApi {
    client: reqwest::Client,
    config: GeminiConfig,
}

/// Errors from the Gemini REST layer.
#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("Gemini API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A 2xx response did not have the expected shape.
    #[error("Unexpected Gemini response: {0}")]
    Malformed(String),

    /// The long-running operation reported a failure.
    #[error("Video job failed: {0}")]
    Job(String),

    /// The poll budget was exhausted before the job finished.
    #[error("Video generation did not complete after {attempts} status checks")]
    PollTimeout {
        /// Number of status checks performed.
        attempts: u32,
    },

    /// The completed operation carried no download link.
    #[error("Completed video operation has no download link")]
    MissingVideoUri,
}

impl From<GeminiError> for GenerationError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::Request(e) => GenerationError::Request(e.to_string()),
            GeminiError::Api { status, body } => GenerationError::Api { status, body },
            GeminiError::Malformed(msg) => GenerationError::Malformed(msg),
            GeminiError::Job(msg) => GenerationError::Job(msg),
            GeminiError::PollTimeout { attempts } => GenerationError::PollTimeout { attempts },
            GeminiError::MissingVideoUri => GenerationError::MissingVideoUri,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types (responses only; request bodies are built with `json!`)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenate the text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OperationHandle {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Operation {
    #[serde(default)]
    done: bool,
    error: Option<OperationError>,
    response: Option<OperationResponse>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSample {
    video: Option<VideoRef>,
}

#[derive(Debug, Deserialize)]
struct VideoRef {
    uri: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

impl GeminiApi {
    /// Create a client from configuration.
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling).
    pub fn with_client(client: reqwest::Client, config: GeminiConfig) -> Self {
        Self { client, config }
    }

    // ---- operations ----

    /// Caption a character image.
    ///
    /// Sends the image as an `inline_data` part next to a fixed
    /// instruction and returns the first candidate's text.
    async fn describe_image_internal(&self, image: &ImagePayload) -> Result<String, GeminiError> {
        let body = serde_json::json!({
            "contents": [{
                "parts": [
                    {
                        "inline_data": {
                            "mime_type": image.mime_type,
                            "data": BASE64.encode(&image.bytes),
                        }
                    },
                    {
                        "text": "Describe this character's appearance in two or three \
                                 sentences, focusing on visual details that matter for \
                                 drawing them consistently across scenes."
                    }
                ]
            }]
        });

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.text_model
        );
        let response: GenerateContentResponse = self.post_json(&url, &body).await?;

        response
            .text()
            .ok_or_else(|| GeminiError::Malformed("caption response has no text".to_string()))
    }

    /// Request the scene script as schema-constrained JSON.
    ///
    /// The response schema pins the output to an array of
    /// `{sceneNumber, description, videoPrompt}` objects; anything that
    /// does not parse as such (including a non-array body) surfaces as
    /// [`GeminiError::Malformed`].
    async fn generate_script_internal(
        &self,
        idea: &str,
        character_notes: &str,
    ) -> Result<Vec<Scene>, GeminiError> {
        let prompt = build_script_prompt(idea, character_notes);

        let body = serde_json::json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "sceneNumber": { "type": "INTEGER" },
                            "description": { "type": "STRING" },
                            "videoPrompt": { "type": "STRING" }
                        },
                        "required": ["sceneNumber", "description", "videoPrompt"]
                    }
                }
            }
        });

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.text_model
        );
        let response: GenerateContentResponse = self.post_json(&url, &body).await?;

        let text = response
            .text()
            .ok_or_else(|| GeminiError::Malformed("script response has no text".to_string()))?;

        serde_json::from_str(&text)
            .map_err(|e| GeminiError::Malformed(format!("script is not a scene array: {e}")))
    }

    /// Generate one 16:9 still image for a scene prompt.
    async fn generate_still_image_internal(
        &self,
        prompt: &str,
    ) -> Result<ImagePayload, GeminiError> {
        let body = serde_json::json!({
            "instances": [{ "prompt": prompt }],
            "parameters": {
                "sampleCount": 1,
                "aspectRatio": "16:9",
            }
        });

        let url = format!(
            "{}/v1beta/models/{}:predict",
            self.config.base_url, self.config.image_model
        );
        let response: PredictResponse = self.post_json(&url, &body).await?;

        let prediction = response
            .predictions
            .into_iter()
            .next()
            .ok_or_else(|| GeminiError::Malformed("predict response has no predictions".into()))?;

        let encoded = prediction
            .bytes_base64_encoded
            .ok_or_else(|| GeminiError::Malformed("prediction has no image bytes".into()))?;

        let bytes = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| GeminiError::Malformed(format!("image bytes are not base64: {e}")))?;

        Ok(ImagePayload {
            mime_type: prediction.mime_type.unwrap_or_else(|| "image/png".into()),
            bytes,
        })
    }

    /// Generate a video clip: submit the long-running job, poll it to
    /// completion, then download the payload.
    async fn generate_video_internal(
        &self,
        prompt: &str,
        seed_image: &ImagePayload,
    ) -> Result<VideoPayload, GeminiError> {
        let body = serde_json::json!({
            "instances": [{
                "prompt": prompt,
                "image": {
                    "bytesBase64Encoded": BASE64.encode(&seed_image.bytes),
                    "mimeType": seed_image.mime_type,
                }
            }],
            "parameters": {
                "aspectRatio": "16:9",
                "numberOfVideos": 1,
            }
        });

        let url = format!(
            "{}/v1beta/models/{}:predictLongRunning",
            self.config.base_url, self.config.video_model
        );
        let handle: OperationHandle = self.post_json(&url, &body).await?;

        tracing::info!(operation = %handle.name, "Video job submitted");

        let operation = self.poll_operation(&handle.name).await?;

        let uri = operation
            .response
            .and_then(|r| r.generate_video_response)
            .and_then(|r| r.generated_samples.into_iter().next())
            .and_then(|s| s.video)
            .and_then(|v| v.uri)
            .ok_or(GeminiError::MissingVideoUri)?;

        self.download_video(&uri).await
    }

    // ---- private helpers ----

    /// Poll the operation until it reports `done`, waiting the
    /// configured interval before every status check. Gives up with
    /// [`GeminiError::PollTimeout`] once the attempt budget is spent.
    async fn poll_operation(&self, operation_name: &str) -> Result<Operation, GeminiError> {
        let url = format!("{}/v1beta/{}", self.config.base_url, operation_name);

        for attempt in 1..=self.config.max_poll_attempts {
            tokio::time::sleep(self.config.poll_interval).await;

            let response = self
                .client
                .get(&url)
                .header("x-goog-api-key", &self.config.api_key)
                .send()
                .await?;
            let operation: Operation = Self::parse_response(response).await?;

            if let Some(error) = operation.error {
                let message = error.message.unwrap_or_else(|| "unknown error".into());
                return Err(GeminiError::Job(message));
            }

            if operation.done {
                tracing::debug!(operation = operation_name, attempt, "Video job finished");
                return Ok(operation);
            }

            tracing::debug!(operation = operation_name, attempt, "Video job still running");
        }

        Err(GeminiError::PollTimeout {
            attempts: self.config.max_poll_attempts,
        })
    }

    /// Download the finished video. The download host wants the API key
    /// in the query string, not a header.
    async fn download_video(&self, uri: &str) -> Result<VideoPayload, GeminiError> {
        let url = append_key_param(uri, &self.config.api_key);

        let response = self.client.get(&url).send().await?;
        let response = Self::ensure_success(response).await?;

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("video/mp4")
            .to_string();

        let bytes = response.bytes().await?.to_vec();

        Ok(VideoPayload { mime_type, bytes })
    }

    /// POST a JSON body with the API key header and parse the JSON reply.
    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T, GeminiError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`GeminiError::Api`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, GeminiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GeminiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GeminiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Build the script-generation prompt from the idea and character notes.
fn build_script_prompt(idea: &str, character_notes: &str) -> String {
    let mut prompt = format!(
        "Write a three-scene video script for this idea:\n{idea}\n\n\
         Return a JSON array of scenes. Each scene needs sceneNumber \
         (1-based), description (one sentence for the viewer), and \
         videoPrompt (a detailed visual prompt for generating the scene)."
    );
    if !character_notes.is_empty() {
        prompt.push_str("\n\nThe characters, with their appearance:\n");
        prompt.push_str(character_notes);
        prompt.push_str("\nKeep every character visually consistent with their description.");
    }
    prompt
}

/// Append the API key as a `key` query parameter, respecting any query
/// string already present on the download URI.
fn append_key_param(uri: &str, api_key: &str) -> String {
    if uri.contains('?') {
        format!("{uri}&key={api_key}")
    } else {
        format!("{uri}?key={api_key}")
    }
}

// ---------------------------------------------------------------------------
// GenerationService
// ---------------------------------------------------------------------------

#[async_trait]
impl GenerationService for GeminiApi {
    async fn describe_image(&self, image: &ImagePayload) -> Result<String, GenerationError> {
        self.describe_image_internal(image).await.map_err(Into::into)
    }

    async fn generate_script(
        &self,
        idea: &str,
        character_notes: &str,
    ) -> Result<Vec<Scene>, GenerationError> {
        self.generate_script_internal(idea, character_notes)
            .await
            .map_err(Into::into)
    }

    async fn generate_still_image(&self, prompt: &str) -> Result<ImagePayload, GenerationError> {
        self.generate_still_image_internal(prompt)
            .await
            .map_err(Into::into)
    }

    async fn generate_video(
        &self,
        prompt: &str,
        seed_image: &ImagePayload,
    ) -> Result<VideoPayload, GenerationError> {
        self.generate_video_internal(prompt, seed_image)
            .await
            .map_err(Into::into)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- append_key_param ----------------------------------------------------

    #[test]
    fn key_param_appended_with_question_mark() {
        assert_eq!(
            append_key_param("https://host/files/v.mp4", "k123"),
            "https://host/files/v.mp4?key=k123"
        );
    }

    #[test]
    fn key_param_appended_with_ampersand_when_query_present() {
        assert_eq!(
            append_key_param("https://host/files/v.mp4?alt=media", "k123"),
            "https://host/files/v.mp4?alt=media&key=k123"
        );
    }

    // -- response text extraction --------------------------------------------

    #[test]
    fn content_response_concatenates_parts() {
        let raw = r#"{
            "candidates": [{
                "content": { "parts": [{ "text": "[{" }, { "text": "}]" }] }
            }]
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text().as_deref(), Some("[{}]"));
    }

    #[test]
    fn content_response_without_candidates_yields_none() {
        let parsed: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.text().is_none());
    }

    // -- operation parsing ---------------------------------------------------

    #[test]
    fn operation_uri_path_parses() {
        let raw = r#"{
            "name": "operations/abc",
            "done": true,
            "response": {
                "generateVideoResponse": {
                    "generatedSamples": [{ "video": { "uri": "https://host/files/v.mp4" } }]
                }
            }
        }"#;
        let parsed: Operation = serde_json::from_str(raw).unwrap();
        assert!(parsed.done);
        let uri = parsed
            .response
            .and_then(|r| r.generate_video_response)
            .and_then(|r| r.generated_samples.into_iter().next())
            .and_then(|s| s.video)
            .and_then(|v| v.uri);
        assert_eq!(uri.as_deref(), Some("https://host/files/v.mp4"));
    }

    #[test]
    fn pending_operation_defaults_to_not_done() {
        let parsed: Operation = serde_json::from_str(r#"{ "name": "operations/abc" }"#).unwrap();
        assert!(!parsed.done);
    }

    // -- prompt building -----------------------------------------------------

    #[test]
    fn script_prompt_includes_character_notes() {
        let prompt = build_script_prompt("A cat jumps out of a box", "Mittens: a grey tabby");
        assert!(prompt.contains("A cat jumps out of a box"));
        assert!(prompt.contains("Mittens: a grey tabby"));
    }

    #[test]
    fn script_prompt_omits_character_section_when_empty() {
        let prompt = build_script_prompt("A cat jumps out of a box", "");
        assert!(!prompt.contains("characters"));
    }
}
