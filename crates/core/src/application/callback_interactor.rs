// Callback Interactor - non-blocking facade over a blocking Interactor

use crate::application::worker::SingleWorkerQueue;
use crate::domain::{QueueConfig, QueueStats};
use crate::error::Result;
use crate::port::{Callback, DataCallback, Interactor};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use tracing::{debug, warn};

/// Delegates every operation to a blocking [`Interactor`] on a single
/// background worker, reporting the outcome to a caller-supplied handler.
///
/// Each method enqueues the call and returns at once. Calls run strictly one
/// at a time, in submission order, and exactly one handler method is invoked
/// per call, on the worker thread. Delegate errors reach the handler
/// unmodified and are never returned to the caller.
///
/// If the adapter was shut down the call is dropped and its handler is never
/// invoked (logged at `warn`).
///
/// # Example
/// ```text
/// let relay = CallbackInteractor::new(engine)?;
/// relay.evaluate(from_fn(|outcome| println!("done: {:?}", outcome)), "x = 1");
/// relay.get_named_value(from_fn(|outcome| println!("x: {:?}", outcome)), "x");
/// ```
pub struct CallbackInteractor<D: Interactor> {
    queue: SingleWorkerQueue,
    delegate: Arc<Mutex<D>>,
}

impl<D: Interactor> CallbackInteractor<D> {
    /// Take ownership of `delegate` and start the worker with default config
    pub fn new(delegate: D) -> Result<Self> {
        Self::with_config(delegate, QueueConfig::default())
    }

    pub fn with_config(delegate: D, config: QueueConfig) -> Result<Self> {
        Self::from_shared(Arc::new(Mutex::new(delegate)), config)
    }

    /// Wrap a delegate whose lifecycle is managed elsewhere.
    ///
    /// The adapter only locks it while a call runs; anything else locking it
    /// delays the worker but cannot interleave with a call.
    pub fn from_shared(delegate: Arc<Mutex<D>>, config: QueueConfig) -> Result<Self> {
        let queue = SingleWorkerQueue::new(config)?;
        Ok(Self { queue, delegate })
    }

    pub fn evaluate<H>(&self, callback: H, command: impl Into<String>)
    where
        H: Callback<D::Error> + Send + 'static,
    {
        let command = command.into();
        self.dispatch("evaluate", move |d| d.evaluate(&command), unit_outcome(callback));
    }

    pub fn evaluate_for_result<H>(&self, callback: H, command: impl Into<String>, result_count: usize)
    where
        H: DataCallback<Vec<D::Value>, D::Error> + Send + 'static,
    {
        let command = command.into();
        self.dispatch(
            "evaluate_for_result",
            move |d| d.evaluate_for_result(&command, result_count),
            data_outcome(callback),
        );
    }

    pub fn call<H>(&self, callback: H, function_name: impl Into<String>, args: Vec<D::Value>)
    where
        H: Callback<D::Error> + Send + 'static,
    {
        let function_name = function_name.into();
        self.dispatch(
            "call",
            move |d| d.call(&function_name, &args),
            unit_outcome(callback),
        );
    }

    pub fn call_for_result<H>(
        &self,
        callback: H,
        function_name: impl Into<String>,
        result_count: usize,
        args: Vec<D::Value>,
    ) where
        H: DataCallback<Vec<D::Value>, D::Error> + Send + 'static,
    {
        let function_name = function_name.into();
        self.dispatch(
            "call_for_result",
            move |d| d.call_for_result(&function_name, result_count, &args),
            data_outcome(callback),
        );
    }

    pub fn set_named_value<H>(&self, callback: H, name: impl Into<String>, value: D::Value)
    where
        H: Callback<D::Error> + Send + 'static,
    {
        let name = name.into();
        self.dispatch(
            "set_named_value",
            move |d| d.set_named_value(&name, value),
            unit_outcome(callback),
        );
    }

    pub fn get_named_value<H>(&self, callback: H, name: impl Into<String>)
    where
        H: DataCallback<D::Value, D::Error> + Send + 'static,
    {
        let name = name.into();
        self.dispatch(
            "get_named_value",
            move |d| d.get_named_value(&name),
            data_outcome(callback),
        );
    }

    /// Run `unit` through [`Interactor::run_and_wait`] on the worker.
    ///
    /// Despite the name this does not wait either; the unit's result is
    /// delivered to `callback` like any other operation.
    pub fn run_and_wait<T, U, H>(&self, callback: H, unit: U)
    where
        T: Send + 'static,
        U: FnOnce(&mut D) -> std::result::Result<T, D::Error> + Send + 'static,
        H: DataCallback<T, D::Error> + Send + 'static,
    {
        self.dispatch("run_and_wait", move |d| d.run_and_wait(unit), data_outcome(callback));
    }

    pub fn stats(&self) -> QueueStats {
        self.queue.stats()
    }

    /// Stop accepting calls, wait for queued calls to finish, join the worker
    pub fn shutdown(self) -> Result<()> {
        self.queue.shutdown()
    }

    fn dispatch<T, F, C>(&self, operation: &'static str, op: F, complete: C)
    where
        F: FnOnce(&mut D) -> std::result::Result<T, D::Error> + Send + 'static,
        C: FnOnce(std::result::Result<T, D::Error>) + Send + 'static,
    {
        let delegate = Arc::clone(&self.delegate);
        let task = Box::new(move || {
            let outcome = {
                let mut guard = lock_delegate(&delegate, operation);
                op(&mut *guard)
            };
            complete(outcome);
        });

        match self.queue.submit(task) {
            Ok(task_id) => debug!(task_id = %task_id, operation, "Call queued"),
            Err(e) => warn!(operation, error = %e, "Call dropped; handler will not be invoked"),
        }
    }
}

fn unit_outcome<H, E>(callback: H) -> impl FnOnce(std::result::Result<(), E>)
where
    H: Callback<E>,
{
    move |outcome| match outcome {
        Ok(()) => callback.on_success(),
        Err(error) => callback.on_failure(error),
    }
}

fn data_outcome<H, T, E>(callback: H) -> impl FnOnce(std::result::Result<T, E>)
where
    H: DataCallback<T, E>,
{
    move |outcome| match outcome {
        Ok(data) => callback.on_success(data),
        Err(error) => callback.on_failure(error),
    }
}

fn lock_delegate<'a, D>(delegate: &'a Mutex<D>, operation: &str) -> MutexGuard<'a, D> {
    delegate.lock().unwrap_or_else(|poisoned| {
        warn!(operation, "Delegate lock poisoned by an earlier panic; continuing");
        poisoned.into_inner()
    })
}

impl<D: Interactor + fmt::Debug> fmt::Debug for CallbackInteractor<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("CallbackInteractor");
        // Never block the caller on a running call
        match self.delegate.try_lock() {
            Ok(delegate) => s.field("delegate", &*delegate),
            Err(TryLockError::Poisoned(poisoned)) => s.field("delegate", &*poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => s.field("delegate", &"<busy>"),
        };
        s.field("queue", &self.queue).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::interactor::mocks::{Gate, MockError, MockInteractor};
    use crate::port::{from_fn, oneshot_callback};
    use serde_json::{json, Value};
    use std::sync::mpsc;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    type Outcome<T> = std::result::Result<T, MockError>;

    fn relay(engine: MockInteractor) -> CallbackInteractor<MockInteractor> {
        CallbackInteractor::with_config(engine, QueueConfig::new("relay-adapter-test")).unwrap()
    }

    #[test]
    fn test_evaluate_then_get_named_value() {
        let relay = relay(MockInteractor::new());
        let (tx, rx) = mpsc::channel();

        let done = tx.clone();
        relay.evaluate(from_fn(move |r: Outcome<()>| done.send(r.map(|_| Value::Null)).unwrap()), "x = 1");
        relay.get_named_value(from_fn(move |r: Outcome<Value>| tx.send(r).unwrap()), "x");

        assert_eq!(rx.recv_timeout(WAIT).unwrap(), Ok(Value::Null));
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), Ok(json!(1)));
    }

    #[test]
    fn test_failure_goes_to_handler() {
        let relay = relay(MockInteractor::new());
        let (tx, rx) = mpsc::channel();

        relay.get_named_value(from_fn(move |r: Outcome<Value>| tx.send(r).unwrap()), "missing");

        assert_eq!(
            rx.recv_timeout(WAIT).unwrap(),
            Err(MockError::UndefinedVariable("missing".to_string()))
        );
    }

    #[test]
    fn test_call_for_result_and_evaluate_for_result() {
        let relay = relay(MockInteractor::new());
        let (tx, rx) = mpsc::channel();

        let sum_tx = tx.clone();
        relay.call_for_result(
            from_fn(move |r: Outcome<Vec<Value>>| sum_tx.send(r).unwrap()),
            "sum",
            1,
            vec![json!(2), json!(3)],
        );
        relay.set_named_value(from_fn(|_: Outcome<()>| {}), "pair", json!(["a", "b"]));
        relay.evaluate_for_result(from_fn(move |r: Outcome<Vec<Value>>| tx.send(r).unwrap()), "pair", 2);

        assert_eq!(rx.recv_timeout(WAIT).unwrap(), Ok(vec![json!(5.0)]));
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), Ok(vec![json!("a"), json!("b")]));
    }

    #[test]
    fn test_data_operations_report_delegate_errors() {
        let relay = relay(MockInteractor::new());
        let (tx, rx) = mpsc::channel();

        relay.set_named_value(from_fn(|_: Outcome<()>| {}), "v", json!([1, 2, 3]));
        let eval_tx = tx.clone();
        relay.evaluate_for_result(from_fn(move |r: Outcome<Vec<Value>>| eval_tx.send(r).unwrap()), "v", 4);
        let call_tx = tx.clone();
        relay.call_for_result(
            from_fn(move |r: Outcome<Vec<Value>>| call_tx.send(r).unwrap()),
            "missing_fn",
            1,
            vec![],
        );
        relay.run_and_wait(
            from_fn(move |r: Outcome<Vec<Value>>| tx.send(r).unwrap()),
            |engine: &mut MockInteractor| {
                let first = engine.get_named_value("v")?;
                let second = engine.get_named_value("never_set")?;
                Ok(vec![first, second])
            },
        );

        assert_eq!(
            rx.recv_timeout(WAIT).unwrap(),
            Err(MockError::Raised("requested 4 results, only 3 available".to_string()))
        );
        assert_eq!(
            rx.recv_timeout(WAIT).unwrap(),
            Err(MockError::UndefinedFunction("missing_fn".to_string()))
        );
        assert_eq!(
            rx.recv_timeout(WAIT).unwrap(),
            Err(MockError::UndefinedVariable("never_set".to_string()))
        );
    }

    #[test]
    fn test_call_reports_raised_error() {
        let relay = relay(MockInteractor::new());
        let (tx, rx) = mpsc::channel();

        relay.call(from_fn(move |r: Outcome<()>| tx.send(r).unwrap()), "error", vec![json!("bad")]);

        assert_eq!(rx.recv_timeout(WAIT).unwrap(), Err(MockError::Raised("bad".to_string())));
    }

    #[test]
    fn test_run_and_wait_is_typed() {
        let relay = relay(MockInteractor::new());
        let (callback, rx) = oneshot_callback::<usize, MockError>();

        relay.run_and_wait(callback, |engine: &mut MockInteractor| {
            engine.set_named_value("word", json!("hello"))?;
            let word = engine.get_named_value("word")?;
            Ok(word.as_str().map(str::len).unwrap_or_default())
        });

        assert_eq!(tokio_test::block_on(rx).unwrap(), Ok(5));
    }

    #[test]
    fn test_methods_return_before_delegate_finishes() {
        let gate = Gate::new();
        let engine = MockInteractor::new().with_gate(gate.clone());
        let probe = engine.probe();
        let relay = relay(engine);
        let (tx, rx) = mpsc::channel();

        relay.evaluate(from_fn(move |r: Outcome<()>| tx.send(r).unwrap()), "x = 1");

        // Returned while the delegate is still held at the gate
        assert!(probe.calls().is_empty());
        assert!(rx.try_recv().is_err());

        gate.open();
        assert_eq!(rx.recv_timeout(WAIT).unwrap(), Ok(()));
    }

    #[test]
    fn test_calls_after_close_are_dropped() {
        let relay = relay(MockInteractor::new());
        let (tx, rx) = mpsc::channel();
        relay.queue.close();

        relay.evaluate(from_fn(move |r: Outcome<()>| tx.send(r).unwrap()), "x = 1");

        // Handler dropped with the task, so the channel disconnects
        assert!(matches!(rx.recv_timeout(WAIT), Err(mpsc::RecvTimeoutError::Disconnected)));
    }

    #[test]
    fn test_debug_shows_delegate() {
        let relay = relay(MockInteractor::new());
        let rendered = format!("{:?}", relay);
        assert!(rendered.contains("CallbackInteractor"));
        assert!(rendered.contains("MockInteractor"));
        relay.shutdown().unwrap();
    }
}
