//! Domain types and pure logic for the storyreel video generation service.
//!
//! This crate has no I/O: it defines the data model (characters, scenes,
//! run snapshots), input validation, the script shape checks, and the
//! [`GenerationService`](service::GenerationService) trait that the
//! pipeline uses to talk to the external generation API.

pub mod character;
pub mod error;
pub mod run;
pub mod script;
pub mod service;
pub mod types;

pub use character::Character;
pub use error::CoreError;
pub use run::{RunSnapshot, RunStatus, StoryboardImage, VideoResult};
pub use script::Scene;
pub use service::{GenerationError, GenerationService, ImagePayload, VideoPayload};
pub use types::RunId;
