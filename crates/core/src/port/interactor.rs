// Interactor Port
// The blocking interface being wrapped (an engine proxy or similar)

/// Blocking request/response interface to an external engine.
///
/// Every method blocks until the engine answers. Implementations need only be
/// `Send`: the callback adapter guarantees that a single thread drives the
/// delegate at any one time.
pub trait Interactor: Send + 'static {
    /// Value marshalled to and from the engine
    type Value: Send + 'static;
    /// The single error kind the engine raises
    type Error: Send + 'static;

    /// Evaluate a command, discarding any result
    fn evaluate(&mut self, command: &str) -> Result<(), Self::Error>;

    /// Evaluate a command and return `result_count` values
    fn evaluate_for_result(
        &mut self,
        command: &str,
        result_count: usize,
    ) -> Result<Vec<Self::Value>, Self::Error>;

    /// Call a function by name, discarding any result
    fn call(&mut self, function_name: &str, args: &[Self::Value]) -> Result<(), Self::Error>;

    /// Call a function by name and return `result_count` values
    fn call_for_result(
        &mut self,
        function_name: &str,
        result_count: usize,
        args: &[Self::Value],
    ) -> Result<Vec<Self::Value>, Self::Error>;

    fn set_named_value(&mut self, name: &str, value: Self::Value) -> Result<(), Self::Error>;

    fn get_named_value(&mut self, name: &str) -> Result<Self::Value, Self::Error>;

    /// Run a unit of work on the engine's execution context and wait for it.
    ///
    /// The default runs `unit` directly against this interactor, which is
    /// correct whenever the caller is already on that context.
    fn run_and_wait<T, F>(&mut self, unit: F) -> Result<T, Self::Error>
    where
        F: FnOnce(&mut Self) -> Result<T, Self::Error>,
        Self: Sized,
    {
        unit(self)
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Condvar, Mutex};
    use std::time::{Duration, Instant};
    use thiserror::Error;

    /// Errors raised by the mock engine
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum MockError {
        #[error("Undefined variable: {0}")]
        UndefinedVariable(String),

        #[error("Undefined function: {0}")]
        UndefinedFunction(String),

        #[error("Syntax error: {0}")]
        Syntax(String),

        #[error("Raised by engine: {0}")]
        Raised(String),
    }

    /// One completed delegate call
    #[derive(Debug, Clone)]
    pub struct CallRecord {
        pub operation: String,
        pub entered: Instant,
        pub exited: Instant,
    }

    /// Shared instrumentation, readable after the mock moved into an adapter
    #[derive(Debug, Default)]
    pub struct MockProbe {
        active: AtomicUsize,
        max_active: AtomicUsize,
        started: AtomicUsize,
        calls: Mutex<Vec<CallRecord>>,
    }

    impl MockProbe {
        /// Highest number of calls ever in progress at once
        pub fn max_concurrent(&self) -> usize {
            self.max_active.load(Ordering::SeqCst)
        }

        /// Calls that entered the delegate (finished or not)
        pub fn started_calls(&self) -> usize {
            self.started.load(Ordering::SeqCst)
        }

        /// Completed calls in completion order
        pub fn calls(&self) -> Vec<CallRecord> {
            self.calls.lock().unwrap().clone()
        }

        /// Operation labels in completion order
        pub fn operations(&self) -> Vec<String> {
            self.calls().into_iter().map(|c| c.operation).collect()
        }

        fn enter(&self, operation: String) -> CallGuard<'_> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now_active, Ordering::SeqCst);
            CallGuard {
                probe: self,
                operation,
                entered: Instant::now(),
            }
        }
    }

    struct CallGuard<'a> {
        probe: &'a MockProbe,
        operation: String,
        entered: Instant,
    }

    impl Drop for CallGuard<'_> {
        fn drop(&mut self) {
            let record = CallRecord {
                operation: std::mem::take(&mut self.operation),
                entered: self.entered,
                exited: Instant::now(),
            };
            self.probe.calls.lock().unwrap().push(record);
            self.probe.active.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Latch that holds delegate calls until opened
    #[derive(Debug, Clone, Default)]
    pub struct Gate {
        state: Arc<(Mutex<bool>, Condvar)>,
    }

    impl Gate {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn open(&self) {
            let (lock, cvar) = &*self.state;
            *lock.lock().unwrap() = true;
            cvar.notify_all();
        }

        fn wait(&self) {
            let (lock, cvar) = &*self.state;
            let mut open = lock.lock().unwrap();
            while !*open {
                open = cvar.wait(open).unwrap();
            }
        }
    }

    /// In-memory engine with a variable workspace and a few builtins.
    ///
    /// Commands are `name = <json>` assignments or a bare variable name.
    /// Builtins: `sum` (numeric args), `echo` (returns its args), `error`
    /// (raises its first arg).
    pub struct MockInteractor {
        workspace: HashMap<String, Value>,
        probe: Arc<MockProbe>,
        delay: Option<Duration>,
        gate: Option<Gate>,
    }

    impl MockInteractor {
        pub fn new() -> Self {
            Self {
                workspace: HashMap::new(),
                probe: Arc::new(MockProbe::default()),
                delay: None,
                gate: None,
            }
        }

        /// Sleep for `delay` inside every call
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        /// Block every call until `gate` is opened
        pub fn with_gate(mut self, gate: Gate) -> Self {
            self.gate = Some(gate);
            self
        }

        pub fn probe(&self) -> Arc<MockProbe> {
            Arc::clone(&self.probe)
        }

        fn wait_in_call(&self) {
            if let Some(gate) = &self.gate {
                gate.wait();
            }
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
        }

        fn resolve(&self, expr: &str) -> Result<Value, MockError> {
            let expr = expr.trim();
            if let Some(value) = self.workspace.get(expr) {
                return Ok(value.clone());
            }
            match serde_json::from_str(expr) {
                Ok(value) => Ok(value),
                Err(_) if is_identifier(expr) => Err(MockError::UndefinedVariable(expr.to_string())),
                Err(_) => Err(MockError::Syntax(expr.to_string())),
            }
        }

        fn run_command(&mut self, command: &str) -> Result<Value, MockError> {
            match command.split_once('=') {
                Some((name, expr)) => {
                    let name = name.trim();
                    if !is_identifier(name) {
                        return Err(MockError::Syntax(command.to_string()));
                    }
                    let value = self.resolve(expr)?;
                    self.workspace.insert(name.to_string(), value.clone());
                    Ok(value)
                }
                None => self.resolve(command),
            }
        }

        fn apply(&self, function_name: &str, args: &[Value]) -> Result<Vec<Value>, MockError> {
            match function_name {
                "sum" => {
                    let mut total = 0.0;
                    for arg in args {
                        total += arg
                            .as_f64()
                            .ok_or_else(|| MockError::Raised(format!("sum: not a number: {}", arg)))?;
                    }
                    Ok(vec![Value::from(total)])
                }
                "echo" => Ok(args.to_vec()),
                "error" => {
                    let message = args
                        .first()
                        .and_then(Value::as_str)
                        .unwrap_or("error raised");
                    Err(MockError::Raised(message.to_string()))
                }
                other => Err(MockError::UndefinedFunction(other.to_string())),
            }
        }
    }

    impl Default for MockInteractor {
        fn default() -> Self {
            Self::new()
        }
    }

    impl std::fmt::Debug for MockInteractor {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("MockInteractor")
                .field("variables", &self.workspace.len())
                .finish()
        }
    }

    fn is_identifier(s: &str) -> bool {
        let mut chars = s.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    fn take_results(values: Vec<Value>, result_count: usize) -> Result<Vec<Value>, MockError> {
        if values.len() < result_count {
            return Err(MockError::Raised(format!(
                "requested {} results, only {} available",
                result_count,
                values.len()
            )));
        }
        Ok(values.into_iter().take(result_count).collect())
    }

    impl Interactor for MockInteractor {
        type Value = Value;
        type Error = MockError;

        fn evaluate(&mut self, command: &str) -> Result<(), MockError> {
            let probe = self.probe.clone();
            let _guard = probe.enter(format!("evaluate:{}", command));
            self.wait_in_call();
            self.run_command(command).map(|_| ())
        }

        fn evaluate_for_result(
            &mut self,
            command: &str,
            result_count: usize,
        ) -> Result<Vec<Value>, MockError> {
            let probe = self.probe.clone();
            let _guard = probe.enter(format!("evaluate_for_result:{}", command));
            self.wait_in_call();
            let value = self.run_command(command)?;
            let values = match value {
                Value::Array(items) => items,
                single => vec![single],
            };
            take_results(values, result_count)
        }

        fn call(&mut self, function_name: &str, args: &[Value]) -> Result<(), MockError> {
            let probe = self.probe.clone();
            let _guard = probe.enter(format!("call:{}", function_name));
            self.wait_in_call();
            self.apply(function_name, args).map(|_| ())
        }

        fn call_for_result(
            &mut self,
            function_name: &str,
            result_count: usize,
            args: &[Value],
        ) -> Result<Vec<Value>, MockError> {
            let probe = self.probe.clone();
            let _guard = probe.enter(format!("call_for_result:{}", function_name));
            self.wait_in_call();
            take_results(self.apply(function_name, args)?, result_count)
        }

        fn set_named_value(&mut self, name: &str, value: Value) -> Result<(), MockError> {
            let probe = self.probe.clone();
            let _guard = probe.enter(format!("set_named_value:{}", name));
            self.wait_in_call();
            if !is_identifier(name) {
                return Err(MockError::Syntax(name.to_string()));
            }
            self.workspace.insert(name.to_string(), value);
            Ok(())
        }

        fn get_named_value(&mut self, name: &str) -> Result<Value, MockError> {
            let probe = self.probe.clone();
            let _guard = probe.enter(format!("get_named_value:{}", name));
            self.wait_in_call();
            self.workspace
                .get(name)
                .cloned()
                .ok_or_else(|| MockError::UndefinedVariable(name.to_string()))
        }
    }

}
