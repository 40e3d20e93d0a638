//! Event types published by the export pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: Event,
}

impl EventEnvelope {
    /// Create a new event envelope with auto-generated ID and timestamp
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Everything a run reports while it progresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    #[serde(rename = "run.started")]
    RunStarted { run_id: Uuid, entity: String },

    /// A pipeline step is about to run
    #[serde(rename = "step.started")]
    StepStarted {
        run_id: Uuid,
        step: String,
        /// 1-based position in the pipeline
        index: u8,
    },

    #[serde(rename = "step.completed")]
    StepCompleted {
        run_id: Uuid,
        step: String,
        duration_ms: u64,
    },

    #[serde(rename = "step.failed")]
    StepFailed {
        run_id: Uuid,
        step: String,
        error: String,
    },

    /// The ribbon document was produced
    #[serde(rename = "run.completed")]
    RunCompleted {
        run_id: Uuid,
        entity: String,
        tab_count: usize,
        duration_ms: u64,
    },

    #[serde(rename = "run.failed")]
    RunFailed {
        run_id: Uuid,
        entity: String,
        error: String,
    },

    /// The caller cancelled the run before or during `step`
    #[serde(rename = "run.cancelled")]
    RunCancelled {
        run_id: Uuid,
        entity: String,
        step: String,
    },
}

impl Event {
    /// Whether no further events follow for this run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Event::RunCompleted { .. } | Event::RunFailed { .. } | Event::RunCancelled { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_envelope_creation() {
        let event = Event::RunStarted {
            run_id: Uuid::new_v4(),
            entity: "account".to_string(),
        };
        let envelope = EventEnvelope::new(event);

        assert!(!envelope.id.is_nil());
        assert!(envelope.timestamp <= Utc::now());
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::StepCompleted {
            run_id: Uuid::new_v4(),
            step: "export_solution".to_string(),
            duration_ms: 1200,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("step.completed"));
        assert!(json.contains("export_solution"));
        assert!(json.contains("duration_ms"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"run.cancelled","run_id":"550e8400-e29b-41d4-a716-446655440000","entity":"account","step":"get_entity_id"}"#;
        let event: Event = serde_json::from_str(json).unwrap();

        match event {
            Event::RunCancelled { entity, step, .. } => {
                assert_eq!(entity, "account");
                assert_eq!(step, "get_entity_id");
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn test_terminal_events() {
        let run_id = Uuid::new_v4();

        let started = Event::StepStarted {
            run_id,
            step: "get_publisher".to_string(),
            index: 1,
        };
        assert!(!started.is_terminal());

        let failed = Event::RunFailed {
            run_id,
            entity: "account".to_string(),
            error: "boom".to_string(),
        };
        assert!(failed.is_terminal());
    }
}
