//! Characters and upload validation.
//!
//! A run accepts up to [`MAX_CHARACTERS`] name/image pairs. Uploaded
//! images are sniffed by magic bytes (never trusted from the client's
//! declared content type) and size-capped before they are handed to the
//! pipeline.

use uuid::Uuid;

use crate::error::CoreError;
use crate::service::ImagePayload;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Maximum number of characters per run.
pub const MAX_CHARACTERS: usize = 3;

/// Maximum size of a single uploaded character image.
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Maximum length of the idea text in characters.
pub const MAX_IDEA_CHARS: usize = 2_000;

/// Maximum length of a character display name.
pub const MAX_NAME_CHARS: usize = 100;

// ---------------------------------------------------------------------------
// Character
// ---------------------------------------------------------------------------

/// A user-supplied character: a display name, an optional reference
/// image, and (once the pipeline has run the image-understanding step)
/// a derived text description.
#[derive(Debug, Clone)]
pub struct Character {
    /// Stable id for correlating uploads with derived descriptions.
    pub id: Uuid,
    /// Display name as entered by the user.
    pub name: String,
    /// Reference image, if one was attached.
    pub image: Option<ImagePayload>,
    /// Caption derived from the image by the generation API.
    pub description: Option<String>,
}

impl Character {
    /// Create a character with no image and no description.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            image: None,
            description: None,
        }
    }

    /// Attach a validated reference image.
    pub fn with_image(mut self, image: ImagePayload) -> Self {
        self.image = Some(image);
        self
    }

    /// Return a copy with the derived description filled in.
    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate the free-text idea: non-empty after trimming, within the
/// length cap.
pub fn validate_idea(idea: &str) -> Result<(), CoreError> {
    if idea.trim().is_empty() {
        return Err(CoreError::Validation(
            "idea text must not be empty".to_string(),
        ));
    }
    if idea.chars().count() > MAX_IDEA_CHARS {
        return Err(CoreError::Validation(format!(
            "idea text must be at most {MAX_IDEA_CHARS} characters"
        )));
    }
    Ok(())
}

/// Validate a character display name.
pub fn validate_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(
            "character name must not be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(CoreError::Validation(format!(
            "character name must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(())
}

/// Validate the number of characters attached to a run.
pub fn validate_character_count(count: usize) -> Result<(), CoreError> {
    if count > MAX_CHARACTERS {
        return Err(CoreError::Validation(format!(
            "at most {MAX_CHARACTERS} characters are allowed, got {count}"
        )));
    }
    Ok(())
}

/// Sniff an uploaded image and return it as an [`ImagePayload`].
///
/// The format is detected from magic bytes via the `image` crate (header
/// inspection only, nothing is decoded). Only PNG, JPEG, and WebP are
/// accepted. The declared multipart content type is ignored.
pub fn sniff_image(bytes: Vec<u8>) -> Result<ImagePayload, CoreError> {
    if bytes.is_empty() {
        return Err(CoreError::Validation(
            "uploaded image is empty".to_string(),
        ));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(CoreError::Validation(format!(
            "uploaded image exceeds the {MAX_IMAGE_BYTES} byte limit"
        )));
    }

    let format = image::guess_format(&bytes)
        .map_err(|_| CoreError::Validation("unrecognized image format".to_string()))?;

    let mime_type = match format {
        image::ImageFormat::Png => "image/png",
        image::ImageFormat::Jpeg => "image/jpeg",
        image::ImageFormat::WebP => "image/webp",
        other => {
            return Err(CoreError::Validation(format!(
                "unsupported image format {other:?}; use PNG, JPEG, or WebP"
            )));
        }
    };

    Ok(ImagePayload {
        mime_type: mime_type.to_string(),
        bytes,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
