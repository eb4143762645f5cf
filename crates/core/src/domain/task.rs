// Task Domain Model

use std::fmt;

/// One-shot unit of work executed by the queue worker.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Sequence number assigned to a task at submission.
///
/// Ids are handed out under the same lock as the enqueue, so they follow
/// execution order exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// A task waiting in the intake channel.
pub(crate) struct QueuedTask {
    pub id: TaskId,
    pub run: Task,
}
