use crate::error::WardenError;
use crate::traits::{ChildTaskHost, TaskBody};
use crate::types::TaskId;

/// Child-task host for testing: bodies are held, not run, until the test
/// calls `take_pending` and executes them itself. This emulates the
/// single-threaded cooperative host while keeping tests deterministic.
#[derive(Default)]
pub struct MockTaskHost {
    /// When set, the next `spawn` fails (creation-failure paths).
    pub fail_spawn: bool,
    pub spawned: Vec<&'static str>,
    pub deleted: Vec<TaskId>,
    next: u32,
    pending: Vec<(TaskId, TaskBody)>,
}

impl MockTaskHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return the queued bodies. Callers must run them without
    /// holding the host lock (bodies take the engine lock themselves).
    pub fn take_pending(&mut self) -> Vec<TaskBody> {
        self.pending.drain(..).map(|(_, body)| body).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl ChildTaskHost for MockTaskHost {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn spawn(&mut self, task_name: &'static str, body: TaskBody) -> Result<TaskId, WardenError> {
        if self.fail_spawn {
            return Err(WardenError::ChildTask { action: "create" });
        }
        let id = TaskId(self.next);
        self.next += 1;
        self.spawned.push(task_name);
        self.pending.push((id, body));
        Ok(id)
    }

    fn delete(&mut self, id: TaskId) -> Result<(), WardenError> {
        self.deleted.push(id);
        self.pending.retain(|(pid, _)| *pid != id);
        Ok(())
    }
}
