use crate::error::WardenError;
use crate::types::TaskId;

/// Body of a child task. Runs to completion on its own; communicates only
/// through the shared engine state it captures.
pub type TaskBody = Box<dyn FnOnce() + Send + 'static>;

/// Task-creation primitive. At most one child task exists at a time; hosts
/// enforce this and fail `spawn` when a task is still registered.
pub trait ChildTaskHost: Send {
    /// Identifier for logging/telemetry.
    fn name(&self) -> &'static str;

    fn spawn(&mut self, task_name: &'static str, body: TaskBody) -> Result<TaskId, WardenError>;

    /// Tear down a live child task.
    fn delete(&mut self, id: TaskId) -> Result<(), WardenError>;
}
