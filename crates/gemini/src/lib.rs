//! Gemini REST API client implementing the generation service seam.
//!
//! Covers the four operations the pipeline needs: image captioning and
//! schema-constrained script generation (`generateContent`), still image
//! generation (`predict`), and video generation
//! (`predictLongRunning` + operation polling + payload download).

pub mod api;
pub mod config;

pub use api::{GeminiApi, GeminiError};
pub use config::{GeminiConfig, GeminiConfigError};
