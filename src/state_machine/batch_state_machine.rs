use super::{events::BatchTaskEvent, states::BatchTaskState};
use crate::error::{Result, SyncError};
use crate::models::BatchTask;
use tracing::debug;

/// In-memory lifecycle tracker for one dequeued batch task
#[derive(Debug, Clone)]
pub struct BatchStateMachine {
    task: BatchTask,
    state: BatchTaskState,
    error: Option<String>,
}

impl BatchStateMachine {
    pub fn new(task: BatchTask) -> Self {
        Self {
            task,
            state: BatchTaskState::default(),
            error: None,
        }
    }

    pub fn current_state(&self) -> BatchTaskState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Apply `event`, returning the new state or an error for an invalid move
    pub fn transition(&mut self, event: BatchTaskEvent) -> Result<BatchTaskState> {
        let target = Self::determine_target_state(self.state, &event)?;

        debug!(
            offset = self.task.offset,
            from = %self.state,
            to = %target,
            event = event.event_type(),
            "Batch task transition"
        );

        if let BatchTaskEvent::Fail(message) = event {
            self.error = Some(message);
        }
        self.state = target;
        Ok(target)
    }

    fn determine_target_state(
        current: BatchTaskState,
        event: &BatchTaskEvent,
    ) -> Result<BatchTaskState> {
        let target = match (current, event) {
            (BatchTaskState::Pending, BatchTaskEvent::Start) => BatchTaskState::Running,
            (BatchTaskState::Running, BatchTaskEvent::Complete) => BatchTaskState::Completed,
            (BatchTaskState::Running, BatchTaskEvent::Fail(_)) => BatchTaskState::Failed,
            (from_state, _) => {
                return Err(SyncError::state_transition(format!(
                    "cannot apply {} to a {} batch task",
                    event.event_type(),
                    from_state
                )))
            }
        };

        Ok(target)
    }
}
