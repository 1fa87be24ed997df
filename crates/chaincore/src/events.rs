use crate::{Step, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

pub type ExecutionId = Uuid;

/// Events emitted while a chain runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExecutionEvent {
    RunStarted {
        execution_id: ExecutionId,
        entry: String,
        input: Value,
        timestamp: DateTime<Utc>,
    },
    StepRecorded {
        execution_id: ExecutionId,
        index: usize,
        step: Step,
        timestamp: DateTime<Utc>,
    },
    RoutingDecided {
        execution_id: ExecutionId,
        router: String,
        chosen: String,
        reasoning_steps: Vec<String>,
        timestamp: DateTime<Utc>,
    },
    RunCompleted {
        execution_id: ExecutionId,
        success: bool,
        steps: usize,
        duration_ms: u64,
        error: Option<String>,
        timestamp: DateTime<Utc>,
    },
}

impl ExecutionEvent {
    pub fn execution_id(&self) -> ExecutionId {
        match self {
            ExecutionEvent::RunStarted { execution_id, .. }
            | ExecutionEvent::StepRecorded { execution_id, .. }
            | ExecutionEvent::RoutingDecided { execution_id, .. }
            | ExecutionEvent::RunCompleted { execution_id, .. } => *execution_id,
        }
    }
}

/// Broadcast bus for execution events.
///
/// Sending never blocks the run; events are dropped when nobody listens.
pub struct EventBus {
    sender: broadcast::Sender<ExecutionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: ExecutionEvent) {
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let execution_id = ExecutionId::new_v4();

        bus.emit(ExecutionEvent::StepRecorded {
            execution_id,
            index: 0,
            step: Step::new("inc", Value::Number(4.0), Value::Number(5.0)),
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.execution_id(), execution_id);
        match event {
            ExecutionEvent::StepRecorded { step, .. } => assert_eq!(step.function_name(), "inc"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        let bus = EventBus::new(1);
        bus.emit(ExecutionEvent::RunCompleted {
            execution_id: ExecutionId::new_v4(),
            success: true,
            steps: 0,
            duration_ms: 0,
            error: None,
            timestamp: Utc::now(),
        });
    }
}
