// Domain Layer - Tasks and queue configuration

pub mod queue;
pub mod task;

// Re-exports
pub use queue::{QueueConfig, QueueStats, DEFAULT_WORKER_THREAD_NAME};
pub use task::{Task, TaskId};
