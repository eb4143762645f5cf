// Queue Domain Model

use serde::{Deserialize, Serialize};

/// Name given to the queue's worker thread unless configured otherwise
pub const DEFAULT_WORKER_THREAD_NAME: &str = "relay-worker";

/// Worker thread configuration. A queue always owns exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub thread_name: String,
    /// Stack size in bytes; `None` keeps the platform default
    pub stack_size: Option<usize>,
}

impl QueueConfig {
    pub fn new(thread_name: impl Into<String>) -> Self {
        Self {
            thread_name: thread_name.into(),
            stack_size: None,
        }
    }

    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::new(DEFAULT_WORKER_THREAD_NAME)
    }
}

/// Snapshot of the queue's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub submitted: u64,
    pub completed: u64,
    pub panicked: u64,
}

impl QueueStats {
    /// Tasks accepted but not yet finished
    pub fn pending(&self) -> u64 {
        self.submitted.saturating_sub(self.completed + self.panicked)
    }
}
