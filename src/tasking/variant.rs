use crate::error::WardenError;
use crate::traits::{ChildTaskHost, TaskBody};
use crate::types::TaskId;

use super::{MockTaskHost, TokioTaskHost};

/// Enum representing all child-task hosts.
pub enum ChildTaskHostVariant {
    Tokio(TokioTaskHost),
    Mock(MockTaskHost),
}

impl ChildTaskHostVariant {
    pub fn new_tokio() -> Self {
        ChildTaskHostVariant::Tokio(TokioTaskHost::new())
    }

    pub fn new_mock() -> Self {
        ChildTaskHostVariant::Mock(MockTaskHost::new())
    }

    pub fn as_mock_mut(&mut self) -> Option<&mut MockTaskHost> {
        match self {
            ChildTaskHostVariant::Mock(inner) => Some(inner),
            _ => None,
        }
    }

    /// Drop bookkeeping for finished tasks (no-op on the mock host).
    pub fn reap(&mut self) {
        if let ChildTaskHostVariant::Tokio(inner) = self {
            inner.reap();
        }
    }
}

impl ChildTaskHost for ChildTaskHostVariant {
    fn name(&self) -> &'static str {
        match self {
            ChildTaskHostVariant::Tokio(inner) => inner.name(),
            ChildTaskHostVariant::Mock(inner) => inner.name(),
        }
    }

    fn spawn(&mut self, task_name: &'static str, body: TaskBody) -> Result<TaskId, WardenError> {
        match self {
            ChildTaskHostVariant::Tokio(inner) => inner.spawn(task_name, body),
            ChildTaskHostVariant::Mock(inner) => inner.spawn(task_name, body),
        }
    }

    fn delete(&mut self, id: TaskId) -> Result<(), WardenError> {
        match self {
            ChildTaskHostVariant::Tokio(inner) => inner.delete(id),
            ChildTaskHostVariant::Mock(inner) => inner.delete(id),
        }
    }
}
