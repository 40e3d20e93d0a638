//! RAII guard for run lifecycle events.
//!
//! Guarantees every `RunStarted` is followed by exactly one terminal event,
//! including when the run future is dropped part-way through.

use tracing::{debug, warn};
use uuid::Uuid;

use events::{Event, EventBus};

/// Emits `RunFailed` on drop unless the run was concluded explicitly.
///
/// # Example
///
/// ```ignore
/// let mut guard = RunGuard::start(run_id, "account", event_bus);
/// // ... execute steps ...
/// guard.mark_completed(tab_count, duration_ms);
/// ```
pub struct RunGuard {
    run_id: Uuid,
    entity: String,
    event_bus: Option<EventBus>,
    concluded: bool,
}

impl RunGuard {
    /// Create the guard and publish `RunStarted`.
    pub fn start(run_id: Uuid, entity: impl Into<String>, event_bus: Option<EventBus>) -> Self {
        let guard = Self {
            run_id,
            entity: entity.into(),
            event_bus,
            concluded: false,
        };

        debug!(run_id = %guard.run_id, entity = %guard.entity, "Run guard created");
        guard.emit(Event::RunStarted {
            run_id,
            entity: guard.entity.clone(),
        });
        guard
    }

    pub fn mark_completed(&mut self, tab_count: usize, duration_ms: u64) {
        self.conclude(Event::RunCompleted {
            run_id: self.run_id,
            entity: self.entity.clone(),
            tab_count,
            duration_ms,
        });
    }

    pub fn mark_failed(&mut self, error: &str) {
        self.conclude(Event::RunFailed {
            run_id: self.run_id,
            entity: self.entity.clone(),
            error: error.to_string(),
        });
    }

    pub fn mark_cancelled(&mut self, step: &str) {
        self.conclude(Event::RunCancelled {
            run_id: self.run_id,
            entity: self.entity.clone(),
            step: step.to_string(),
        });
    }

    fn conclude(&mut self, event: Event) {
        if self.concluded {
            return;
        }
        self.concluded = true;
        self.emit(event);
    }

    fn emit(&self, event: Event) {
        if let Some(ref bus) = self.event_bus {
            bus.emit(event);
        }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if !self.concluded {
            warn!(
                run_id = %self.run_id,
                entity = %self.entity,
                "Run dropped before completion"
            );
            self.mark_failed("run dropped before completion");
        }
    }
}
