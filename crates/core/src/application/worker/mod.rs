// Worker - single-thread FIFO task execution

pub mod constants;
mod panic_guard;

pub use panic_guard::{execute_guarded, panic_message, PanicGuardResult};

use crate::domain::task::QueuedTask;
use crate::domain::{QueueConfig, QueueStats, Task, TaskId};
use crate::error::{QueueError, Result};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use tracing::{debug, debug_span, error, info, warn};

/// Executes submitted tasks one at a time, in submission order, on one
/// persistent background thread.
///
/// `submit` never blocks. Dropping the queue closes intake and detaches the
/// worker: tasks already submitted still run, and the thread never keeps the
/// process alive. Call [`SingleWorkerQueue::shutdown`] to wait for them instead.
pub struct SingleWorkerQueue {
    intake: Mutex<Intake>,
    counters: Arc<Counters>,
    worker: Option<JoinHandle<()>>,
    thread_name: String,
}

struct Intake {
    tx: Option<mpsc::UnboundedSender<QueuedTask>>,
    next_id: u64,
}

#[derive(Default)]
struct Counters {
    submitted: AtomicU64,
    completed: AtomicU64,
    panicked: AtomicU64,
}

impl SingleWorkerQueue {
    /// Spawn the worker thread and return a queue ready for submissions
    pub fn new(config: QueueConfig) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());

        let mut builder = thread::Builder::new().name(config.thread_name.clone());
        if let Some(bytes) = config.stack_size {
            builder = builder.stack_size(bytes);
        }

        let worker_counters = Arc::clone(&counters);
        let worker = builder.spawn(move || run_worker(rx, worker_counters))?;

        Ok(Self {
            intake: Mutex::new(Intake {
                tx: Some(tx),
                next_id: 0,
            }),
            counters,
            worker: Some(worker),
            thread_name: config.thread_name,
        })
    }

    /// Enqueue a task and return immediately.
    ///
    /// # Errors
    /// - QueueError::Closed if intake was closed or the worker is gone; the
    ///   task is dropped without running
    pub fn submit(&self, task: Task) -> Result<TaskId> {
        let mut intake = self.lock_intake();
        let id = TaskId::new(intake.next_id);

        // Counted before the send so `completed` never overtakes `submitted`
        self.counters.submitted.fetch_add(1, Ordering::SeqCst);
        let sent = match &intake.tx {
            Some(tx) => tx.send(QueuedTask { id, run: task }).is_ok(),
            None => false,
        };
        if !sent {
            self.counters.submitted.fetch_sub(1, Ordering::SeqCst);
            warn!(task_id = %id, thread = %self.thread_name, "Task rejected: queue closed");
            return Err(QueueError::Closed);
        }

        intake.next_id += 1;
        debug!(task_id = %id, "Task submitted");
        Ok(id)
    }

    /// Stop accepting tasks. Already submitted tasks still run.
    pub fn close(&self) {
        if self.lock_intake().tx.take().is_some() {
            info!(thread = %self.thread_name, "Queue intake closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock_intake().tx.is_none()
    }

    /// Close intake, let the worker drain pending tasks, and join it.
    ///
    /// Called from the worker thread itself (from inside a task) the join is
    /// skipped and the worker is detached.
    ///
    /// # Errors
    /// - QueueError::WorkerPanicked if the worker thread died abnormally
    pub fn shutdown(mut self) -> Result<()> {
        self.close();

        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        if worker.thread().id() == thread::current().id() {
            warn!(thread = %self.thread_name, "Shutdown requested from worker thread; detaching");
            return Ok(());
        }

        worker
            .join()
            .map_err(|payload| QueueError::WorkerPanicked(panic_message(payload.as_ref())))?;
        info!(thread = %self.thread_name, "Queue worker joined");
        Ok(())
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            submitted: self.counters.submitted.load(Ordering::SeqCst),
            completed: self.counters.completed.load(Ordering::SeqCst),
            panicked: self.counters.panicked.load(Ordering::SeqCst),
        }
    }

    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    // Intake holds no invariant a panicking producer could break
    fn lock_intake(&self) -> MutexGuard<'_, Intake> {
        self.intake.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SingleWorkerQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleWorkerQueue")
            .field("thread_name", &self.thread_name)
            .field("closed", &self.is_closed())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Worker loop: runs until intake is closed and drained
fn run_worker(mut rx: mpsc::UnboundedReceiver<QueuedTask>, counters: Arc<Counters>) {
    let current = thread::current();
    let name = current.name().unwrap_or("unnamed");
    info!(thread = %name, "Queue worker started");

    while let Some(QueuedTask { id, run }) = rx.blocking_recv() {
        let _span = debug_span!("task", task_id = id.as_u64()).entered();

        match execute_guarded(run) {
            PanicGuardResult::Success(()) => {
                counters.completed.fetch_add(1, Ordering::SeqCst);
                debug!(task_id = %id, "Task completed");
            }
            PanicGuardResult::Panicked(panic_msg) => {
                counters.panicked.fetch_add(1, Ordering::SeqCst);
                error!(task_id = %id, panic_msg = %panic_msg, "Task panicked; worker continues");
            }
        }
    }

    info!(thread = %name, "Queue worker stopped");
}
