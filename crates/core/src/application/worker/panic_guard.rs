// Panic isolation for worker safety
use super::constants::UNKNOWN_PANIC_MESSAGE;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Result of a panic-guarded execution
#[derive(Debug)]
pub enum PanicGuardResult<T> {
    /// Execution completed successfully
    Success(T),
    /// Execution panicked
    Panicked(String),
}

/// Execute a closure with panic isolation
///
/// If the closure panics, the panic is caught and returned as PanicGuardResult::Panicked.
/// This keeps one misbehaving task (or handler) from killing the queue worker.
///
/// # Example
/// ```text
/// let result = execute_guarded(|| {
///     // This panic will be caught
///     panic!("test panic");
/// });
///
/// match result {
///     PanicGuardResult::Panicked(msg) => {
///         println!("Caught panic: {}", msg);
///     }
///     _ => {}
/// }
/// ```
pub fn execute_guarded<F, T>(f: F) -> PanicGuardResult<T>
where
    F: FnOnce() -> T,
{
    // Tasks own everything they touch; the delegate lock recovers from poisoning
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => PanicGuardResult::Success(result),
        Err(payload) => PanicGuardResult::Panicked(panic_message(payload.as_ref())),
    }
}

/// Extract a readable message from a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        UNKNOWN_PANIC_MESSAGE.to_string()
    }
}
