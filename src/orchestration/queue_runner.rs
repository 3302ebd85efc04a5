//! # Queue Runner
//!
//! Pops batch tasks off a [`WorkQueue`] one at a time and hands them to a
//! [`BatchHandler`]. Tasks never overlap: each one runs to completion,
//! including its status writes, before the next is claimed.
//!
//! `run_next` executes a single task so a run can be driven step by step
//! across separate invocations; `run_all` drains the queue.

use super::batch_executor::{BatchHandler, BatchReport};
use crate::error::Result;
use crate::logging::log_error;
use crate::messaging::WorkQueue;
use crate::models::BatchTask;
use crate::state_machine::{BatchStateMachine, BatchTaskEvent, BatchTaskState};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// What the runner does when a task fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMode {
    /// Stop the run; the failed item is released back to the queue
    #[default]
    Abort,
    /// Drop the failed item and carry on with the next one
    Continue,
}

/// A task that was dequeued and executed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRun {
    pub item_id: i64,
    pub task: BatchTask,
    pub state: BatchTaskState,
    pub report: Option<BatchReport>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed(TaskRun),
    Failed(TaskRun),
    QueueEmpty,
}

/// Summary of a `run_all` call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub title: String,
    pub completed: Vec<TaskRun>,
    pub failed: Vec<TaskRun>,
    /// Set when a failure stopped the run under [`ErrorMode::Abort`]
    pub aborted: bool,
    /// Where to send the user once the queue is drained
    pub end_url: Option<String>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        !self.aborted && self.failed.is_empty()
    }

    /// Error message of the task that stopped the run
    pub fn abort_reason(&self) -> Option<&str> {
        if !self.aborted {
            return None;
        }
        self.failed.last().and_then(|run| run.error.as_deref())
    }
}

pub struct QueueRunner<'q> {
    title: String,
    queue: &'q dyn WorkQueue,
    error_mode: ErrorMode,
    on_end_url: String,
}

impl<'q> QueueRunner<'q> {
    pub fn new(
        title: impl Into<String>,
        queue: &'q dyn WorkQueue,
        error_mode: ErrorMode,
        on_end_url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            queue,
            error_mode,
            on_end_url: on_end_url.into(),
        }
    }

    pub fn error_mode(&self) -> ErrorMode {
        self.error_mode
    }

    /// Claim and execute the next task, if any
    pub async fn run_next(&self, handler: &dyn BatchHandler) -> Result<StepOutcome> {
        let Some(item) = self.queue.dequeue_next().await? else {
            return Ok(StepOutcome::QueueEmpty);
        };

        let mut machine = BatchStateMachine::new(item.task.clone());
        machine.transition(BatchTaskEvent::Start)?;
        info!(
            queue_name = self.queue.name(),
            item_id = item.id,
            label = %item.task.label,
            "Running batch task"
        );

        match handler.handle(&item.task).await {
            Ok(report) => {
                machine.transition(BatchTaskEvent::Complete)?;
                self.queue.complete(&item).await?;
                Ok(StepOutcome::Completed(TaskRun {
                    item_id: item.id,
                    task: item.task,
                    state: machine.current_state(),
                    report: Some(report),
                    error: None,
                }))
            }
            Err(err) => {
                let message = err.to_string();
                machine.transition(BatchTaskEvent::fail_with_error(&message))?;
                log_error("queue_runner", "run_next", &message, Some(&item.task.label));

                match self.error_mode {
                    ErrorMode::Abort => self.queue.release(&item).await?,
                    ErrorMode::Continue => self.queue.complete(&item).await?,
                }

                Ok(StepOutcome::Failed(TaskRun {
                    item_id: item.id,
                    task: item.task,
                    state: machine.current_state(),
                    report: None,
                    error: machine.error().map(str::to_string),
                }))
            }
        }
    }

    /// Execute queued tasks in order until the queue is empty or, under
    /// [`ErrorMode::Abort`], until the first failure
    pub async fn run_all(&self, handler: &dyn BatchHandler) -> Result<RunOutcome> {
        let mut outcome = RunOutcome {
            title: self.title.clone(),
            ..RunOutcome::default()
        };

        loop {
            match self.run_next(handler).await? {
                StepOutcome::QueueEmpty => {
                    outcome.end_url = Some(self.on_end_url.clone());
                    break;
                }
                StepOutcome::Completed(run) => outcome.completed.push(run),
                StepOutcome::Failed(run) => {
                    outcome.failed.push(run);
                    if self.error_mode == ErrorMode::Abort {
                        outcome.aborted = true;
                        break;
                    }
                    warn!(title = %self.title, "Batch task failed, continuing");
                }
            }
        }

        if outcome.aborted {
            error!(
                title = %self.title,
                completed = outcome.completed.len(),
                reason = outcome.abort_reason().unwrap_or("unknown"),
                "Run aborted"
            );
        } else {
            info!(
                title = %self.title,
                completed = outcome.completed.len(),
                failed = outcome.failed.len(),
                "Run finished"
            );
        }
        Ok(outcome)
    }
}
