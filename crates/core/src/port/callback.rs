// Callback Port - handler contracts delivered on the worker thread

use tokio::sync::oneshot;

/// Handler for operations that produce no value.
///
/// Exactly one method is called, once, on the queue's worker thread.
/// Implementations must not panic; a panic is caught and logged by the
/// worker but the outcome is lost.
pub trait Callback<E> {
    /// Called when the delegate operation completed
    fn on_success(self);

    /// Called with the error the delegate raised
    fn on_failure(self, error: E);
}

/// Handler for operations that produce a value of type `T`.
pub trait DataCallback<T, E> {
    /// Called with the data the delegate returned
    fn on_success(self, data: T);

    /// Called with the error the delegate raised
    fn on_failure(self, error: E);
}

/// Handler built from a closure over the tagged outcome.
///
/// # Example
/// ```text
/// relay.get_named_value(from_fn(|outcome| match outcome {
///     Ok(value) => println!("y = {}", value),
///     Err(e) => eprintln!("lookup failed: {}", e),
/// }), "y");
/// ```
pub struct FnCallback<F> {
    f: F,
}

/// Wrap a closure receiving `Result<T, E>` as a handler
pub fn from_fn<F>(f: F) -> FnCallback<F> {
    FnCallback { f }
}

impl<E, F> Callback<E> for FnCallback<F>
where
    F: FnOnce(Result<(), E>),
{
    fn on_success(self) {
        (self.f)(Ok(()))
    }

    fn on_failure(self, error: E) {
        (self.f)(Err(error))
    }
}

impl<T, E, F> DataCallback<T, E> for FnCallback<F>
where
    F: FnOnce(Result<T, E>),
{
    fn on_success(self, data: T) {
        (self.f)(Ok(data))
    }

    fn on_failure(self, error: E) {
        (self.f)(Err(error))
    }
}

/// Handler that resolves a oneshot receiver, for async callers.
///
/// If the receiver was dropped the outcome is discarded.
pub struct OneshotCallback<T, E> {
    tx: oneshot::Sender<Result<T, E>>,
}

/// Create a oneshot handler and the receiver its outcome arrives on
pub fn oneshot_callback<T, E>() -> (OneshotCallback<T, E>, oneshot::Receiver<Result<T, E>>) {
    let (tx, rx) = oneshot::channel();
    (OneshotCallback { tx }, rx)
}

impl<E> Callback<E> for OneshotCallback<(), E> {
    fn on_success(self) {
        let _ = self.tx.send(Ok(()));
    }

    fn on_failure(self, error: E) {
        let _ = self.tx.send(Err(error));
    }
}

impl<T, E> DataCallback<T, E> for OneshotCallback<T, E> {
    fn on_success(self, data: T) {
        let _ = self.tx.send(Ok(data));
    }

    fn on_failure(self, error: E) {
        let _ = self.tx.send(Err(error));
    }
}
