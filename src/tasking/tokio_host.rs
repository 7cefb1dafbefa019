use std::collections::HashMap;

use tracing::{debug, error};

use crate::error::WardenError;
use crate::traits::{ChildTaskHost, TaskBody};
use crate::types::TaskId;

/// Child-task host backed by `tokio::task::spawn_blocking`. Bodies are
/// synchronous compute loops that take the engine lock per bounded step, so
/// a blocking-pool thread is the right vehicle.
pub struct TokioTaskHost {
    next: u32,
    live: HashMap<TaskId, tokio::task::JoinHandle<()>>,
}

impl TokioTaskHost {
    pub fn new() -> Self {
        Self {
            next: 1,
            live: HashMap::new(),
        }
    }

    /// Forget handles of tasks that have run to completion.
    pub fn reap(&mut self) {
        self.live.retain(|_, handle| !handle.is_finished());
    }
}

impl Default for TokioTaskHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ChildTaskHost for TokioTaskHost {
    fn name(&self) -> &'static str {
        "tokio"
    }

    fn spawn(&mut self, task_name: &'static str, body: TaskBody) -> Result<TaskId, WardenError> {
        self.reap();
        if !self.live.is_empty() {
            error!("refusing to create child task {task_name}: one already live");
            return Err(WardenError::ChildTask { action: "create" });
        }
        let id = TaskId(self.next);
        self.next += 1;
        debug!("creating child task {task_name} ({id:?})");
        let handle = tokio::task::spawn_blocking(body);
        self.live.insert(id, handle);
        Ok(id)
    }

    fn delete(&mut self, id: TaskId) -> Result<(), WardenError> {
        match self.live.remove(&id) {
            Some(handle) => {
                handle.abort();
                debug!("deleted child task {id:?}");
                Ok(())
            }
            None => Err(WardenError::ChildTask { action: "delete" }),
        }
    }
}
