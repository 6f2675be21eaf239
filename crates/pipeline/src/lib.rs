//! The generation pipeline: the sequential series of external-service
//! calls that turns an idea and character set into per-scene videos.
//!
//! [`runner::run`] drives one run to completion (or failure) against any
//! [`GenerationService`](storyreel_core::GenerationService), publishing
//! progress to the [`RunBus`](storyreel_events::RunBus) and recording
//! results in the shared [`RunRegistry`](registry::RunRegistry).

pub mod registry;
pub mod runner;

pub use registry::RunRegistry;
pub use runner::{run, PipelineError};
