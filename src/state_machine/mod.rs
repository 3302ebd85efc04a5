// Batch task lifecycle: pending -> running -> {completed, failed}

pub mod batch_state_machine;
pub mod events;
pub mod states;

pub use batch_state_machine::BatchStateMachine;
pub use events::BatchTaskEvent;
pub use states::BatchTaskState;
