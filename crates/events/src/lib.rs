//! In-process progress events for generation runs.

pub mod bus;

pub use bus::{RunBus, RunEvent, RunEventKind};
