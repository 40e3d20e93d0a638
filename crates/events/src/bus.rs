//! Broadcast of run progress to any number of listeners

use tokio::sync::broadcast;

use crate::types::{Event, EventEnvelope};

/// Events a slow listener may fall behind by before it starts losing them.
/// One run publishes at most 2 + 2 * 8 events.
const CAPACITY: usize = 64;

/// Cloneable publisher for run progress.
///
/// Publishing never blocks and never fails: with no listener attached the
/// event is simply dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CAPACITY);
        Self { sender }
    }

    /// Stamp `event` with an id and timestamp and hand it to every listener.
    pub fn emit(&self, event: Event) {
        let _ = self.sender.send(EventEnvelope::new(event));
    }

    /// Listen for events published from now on.
    ///
    /// The receiver reports `Closed` once every clone of the bus is dropped.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::RecvError;
    use uuid::Uuid;

    fn started(run_id: Uuid) -> Event {
        Event::RunStarted {
            run_id,
            entity: "account".to_string(),
        }
    }

    #[tokio::test]
    async fn test_emit_reaches_every_listener() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        let run_id = Uuid::new_v4();

        bus.emit(started(run_id));

        let a = first.recv().await.unwrap();
        let b = second.recv().await.unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.event, started(run_id));
    }

    #[tokio::test]
    async fn test_emit_without_listeners_is_dropped() {
        let bus = EventBus::new();
        bus.emit(started(Uuid::new_v4()));

        let mut late = bus.subscribe();
        assert!(late.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_run_fits_in_buffer() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let run_id = Uuid::new_v4();

        bus.emit(started(run_id));
        for index in 1..=8u8 {
            let step = format!("step_{}", index);
            bus.emit(Event::StepStarted {
                run_id,
                step: step.clone(),
                index,
            });
            bus.emit(Event::StepCompleted {
                run_id,
                step,
                duration_ms: 1,
            });
        }
        bus.emit(Event::RunCompleted {
            run_id,
            entity: "account".to_string(),
            tab_count: 0,
            duration_ms: 8,
        });

        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 18);
    }

    #[tokio::test]
    async fn test_receiver_closes_with_last_clone() {
        let bus = EventBus::new();
        let clone = bus.clone();
        let mut rx = bus.subscribe();

        clone.emit(started(Uuid::new_v4()));
        drop(bus);
        drop(clone);

        assert!(rx.recv().await.is_ok());
        assert!(matches!(rx.recv().await, Err(RecvError::Closed)));
    }
}
