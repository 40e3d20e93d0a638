//! Progress events for ribbon export runs
//!
//! This crate provides the event bus and event types the pipeline publishes
//! while it works through its steps.

mod bus;
mod types;

pub use bus::EventBus;
pub use types::*;
