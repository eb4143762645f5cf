// Relay Core - Single-worker queue & callback adapter
// NO runtime ownership: the worker is one detached OS thread

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{CallbackInteractor, SingleWorkerQueue};
pub use error::{QueueError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
