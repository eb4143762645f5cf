// Central Error Type for the queue layer

use thiserror::Error;

/// Errors raised by the queue itself.
///
/// Delegate failures never show up here; they travel to the handler
/// untouched as the interactor's own error type.
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Queue closed: task rejected")]
    Closed,

    #[error("Failed to spawn worker thread: {0}")]
    WorkerSpawn(#[from] std::io::Error),

    #[error("Worker thread panicked: {0}")]
    WorkerPanicked(String),
}

/// Result type alias using QueueError
pub type Result<T> = std::result::Result<T, QueueError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts_to_spawn_error() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "no threads left");
        let err: QueueError = io.into();
        assert!(matches!(err, QueueError::WorkerSpawn(_)));
        assert!(err.to_string().contains("no threads left"));
    }

    #[test]
    fn test_closed_message() {
        assert_eq!(QueueError::Closed.to_string(), "Queue closed: task rejected");
    }
}
