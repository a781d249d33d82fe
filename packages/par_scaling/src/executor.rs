//! The two execution strategies: sequential on the calling thread, and pooled across a fixed
//! number of worker threads.
//!
//! Both strategies run the same [`Task`] a given number of times, discard what it produces
//! and report how long that took. They do not know which workload the task wraps.

use std::any::Any;
use std::num::NonZero;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::pool::WorkerPool;
use crate::{ERR_POISONED_LOCK, ExecutionError, TaskError};

/// A unit of work the executors can invoke repeatedly, possibly from many threads at once.
///
/// Any `Fn() -> Result<(), TaskError>` closure that is `Send + Sync` is a task.
pub trait Task: Send + Sync {
    /// Executes one invocation of the task.
    ///
    /// # Errors
    ///
    /// Returns an error if this invocation failed. The executors abort the run on the first
    /// failure.
    fn invoke(&self) -> Result<(), TaskError>;
}

impl<F> Task for F
where
    F: Fn() -> Result<(), TaskError> + Send + Sync,
{
    fn invoke(&self) -> Result<(), TaskError> {
        self()
    }
}

/// Which execution strategy produced a measurement.
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum ExecutionMode {
    /// All tasks ran one after another on the calling thread.
    #[display("sequential")]
    Sequential,

    /// Tasks were distributed across a pool of worker threads.
    #[display("pooled")]
    Pooled,
}

/// What an executor observed while running a batch of tasks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExecutionTiming {
    completed: usize,
    elapsed: Duration,
}

impl ExecutionTiming {
    /// Number of task invocations that completed successfully.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Wall-clock time from the first invocation starting until the last one finished.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Invokes `task` `task_count` times in order on the calling thread.
///
/// # Errors
///
/// The first failing invocation aborts the run and its error is returned. A panicking
/// invocation is reported as [`TaskError::Panicked`].
pub fn run_sequential<T>(
    task: &T,
    task_count: NonZero<usize>,
) -> Result<ExecutionTiming, ExecutionError>
where
    T: Task + ?Sized,
{
    let start = Instant::now();

    for _ in 0..task_count.get() {
        invoke_captured(task).map_err(ExecutionError::Task)?;
    }

    Ok(ExecutionTiming {
        completed: task_count.get(),
        elapsed: start.elapsed(),
    })
}

/// Distributes `task_count` invocations of `task` across exactly `thread_count` worker threads.
///
/// Workers claim invocations one at a time until none are left, so every invocation runs
/// exactly once but the order across workers is unspecified. The elapsed time covers the span
/// from submitting work to the pool until the last invocation completes. Worker startup and
/// teardown fall outside it, but the pool is always fully torn down before this returns.
///
/// # Errors
///
/// On the first failing invocation, invocations that have not started yet are cancelled,
/// the ones already running are awaited, the pool is torn down and then the first failure is
/// returned. Failure to start a worker thread is returned as [`ExecutionError::Spawn`].
pub fn run_pooled<T>(
    task: &Arc<T>,
    task_count: NonZero<usize>,
    thread_count: NonZero<usize>,
) -> Result<ExecutionTiming, ExecutionError>
where
    T: Task + ?Sized + 'static,
{
    let mut pool = WorkerPool::new(thread_count)?;

    tracing::debug!(
        task_count = task_count.get(),
        thread_count = pool.thread_count(),
        "starting pooled run"
    );

    let run = Arc::new(PooledRun {
        task: Arc::clone(task),
        task_count: task_count.get(),
        next_index: AtomicUsize::new(0),
        completed: AtomicUsize::new(0),
        aborted: AtomicBool::new(false),
        first_failure: Mutex::new(None),
    });

    let start = Instant::now();

    pool.broadcast({
        let run = Arc::clone(&run);
        move || run.work()
    });

    let elapsed = start.elapsed();

    drop(pool);

    if let Some(error) = run.first_failure.lock().expect(ERR_POISONED_LOCK).take() {
        return Err(ExecutionError::Task(error));
    }

    Ok(ExecutionTiming {
        completed: run.completed.load(Ordering::Acquire),
        elapsed,
    })
}

/// Shared claim state of one pooled run.
struct PooledRun<T: ?Sized> {
    task: Arc<T>,
    task_count: usize,
    next_index: AtomicUsize,
    completed: AtomicUsize,
    aborted: AtomicBool,
    first_failure: Mutex<Option<TaskError>>,
}

impl<T> PooledRun<T>
where
    T: Task + ?Sized,
{
    fn work(&self) {
        // Acquire pairs with the Release in fail() so a worker that sees the abort stops
        // claiming new invocations.
        while !self.aborted.load(Ordering::Acquire) {
            let index = self.next_index.fetch_add(1, Ordering::Relaxed);

            if index >= self.task_count {
                break;
            }

            tracing::trace!(index, "claimed task");

            match invoke_captured(&*self.task) {
                Ok(()) => {
                    self.completed.fetch_add(1, Ordering::Release);
                }
                Err(error) => self.fail(index, error),
            }
        }
    }

    fn fail(&self, index: usize, error: TaskError) {
        tracing::warn!(index, %error, "task failed, cancelling remaining tasks");

        let mut first_failure = self.first_failure.lock().expect(ERR_POISONED_LOCK);
        if first_failure.is_none() {
            *first_failure = Some(error);
        }

        self.aborted.store(true, Ordering::Release);
    }
}

fn invoke_captured<T>(task: &T) -> Result<(), TaskError>
where
    T: Task + ?Sized,
{
    panic::catch_unwind(AssertUnwindSafe(|| task.invoke()))
        .unwrap_or_else(|payload| Err(TaskError::Panicked(format_panic_payload(&*payload))))
}

fn format_panic_payload(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
