// Application Layer - Queue and callback adapter

pub mod callback_interactor;
pub mod worker;

// Re-exports
pub use callback_interactor::CallbackInteractor;
pub use worker::SingleWorkerQueue;
