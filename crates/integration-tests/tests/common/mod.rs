//! Shared helpers for integration tests

#![allow(dead_code)]

use relay_core::domain::QueueConfig;
use relay_core::port::interactor::mocks::MockInteractor;
use relay_core::CallbackInteractor;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

pub type Relay = CallbackInteractor<MockInteractor>;

/// Install a test-friendly subscriber once (RUST_LOG overrides the default)
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("relay_core=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

pub fn relay(engine: MockInteractor) -> Relay {
    init_tracing();
    CallbackInteractor::with_config(engine, QueueConfig::new("relay-it-worker"))
        .expect("worker thread should spawn")
}

/// Wait for every queued call to finish once all other handles are gone
pub fn drain(relay: Arc<Relay>) {
    let relay = Arc::into_inner(relay).expect("relay still shared");
    relay.shutdown().expect("worker should join cleanly");
}
