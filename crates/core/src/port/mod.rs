// Port Layer - Interfaces for external collaborators

pub mod callback;
pub mod interactor;

// Re-exports
pub use callback::{from_fn, oneshot_callback, Callback, DataCallback, FnCallback, OneshotCallback};
pub use interactor::Interactor;
