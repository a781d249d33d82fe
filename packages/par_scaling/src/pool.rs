use std::num::NonZero;
use std::panic;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use crate::ExecutionError;

/// Fixed-size set of worker threads that all execute the same job when asked.
///
/// The pool exists for exactly one pooled run. Dropping it shuts down and joins every worker,
/// so by the time the owner goes out of scope no worker thread is left behind, whether the
/// run succeeded or not.
#[derive(Debug)]
pub(crate) struct WorkerPool {
    command_txs: Vec<mpsc::Sender<Command>>,
    join_handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `thread_count` worker threads.
    ///
    /// If any worker cannot be spawned, the ones already running are shut down and joined
    /// before the error is returned.
    pub(crate) fn new(thread_count: NonZero<usize>) -> Result<Self, ExecutionError> {
        let mut pool = Self {
            command_txs: Vec::with_capacity(thread_count.get()),
            join_handles: Vec::with_capacity(thread_count.get()),
        };

        for worker_index in 0..thread_count.get() {
            let (tx, rx) = mpsc::channel();

            let handle = thread::Builder::new()
                .name(format!("par-scaling-w{worker_index}"))
                .spawn(move || {
                    tracing::debug!(worker_index, "worker thread started");
                    worker_entrypoint(&rx);
                    tracing::debug!(worker_index, "worker thread exiting");
                })
                .map_err(ExecutionError::Spawn)?;

            pool.command_txs.push(tx);
            pool.join_handles.push(handle);
        }

        Ok(pool)
    }

    /// Number of worker threads in the pool.
    pub(crate) fn thread_count(&self) -> usize {
        self.join_handles.len()
    }

    /// Executes a job once on every worker and waits until all of them have finished it.
    #[cfg_attr(test, mutants::skip)] // If work does not get enqueued, deadlocks are very easy.
    #[expect(
        clippy::needless_pass_by_ref_mut,
        reason = "two concurrent broadcasts on the same pool would interleave their jobs"
    )]
    pub(crate) fn broadcast<F>(&mut self, job: F)
    where
        F: Fn() + Clone + Send + 'static,
    {
        let (done_txs, done_rxs): (Vec<_>, Vec<_>) =
            std::iter::repeat_with(oneshot::channel::<()>)
                .take(self.command_txs.len())
                .unzip();

        for (tx, done_tx) in self.command_txs.iter().zip(done_txs) {
            let job = job.clone();

            tx.send(Command::Execute(Box::new(move || {
                job();

                done_tx
                    .send(())
                    .expect("broadcast waits for every worker before returning");
            })))
            .expect("worker thread must still exist - the pool cannot operate without workers");
        }

        for rx in done_rxs {
            rx.recv()
                .expect("worker thread failed to report completion - did the job panic?");
        }
    }
}

impl Drop for WorkerPool {
    #[cfg_attr(test, mutants::skip)] // Impractical to test that stuff stops happening.
    fn drop(&mut self) {
        if thread::panicking() {
            // Shutting down during a panic may hide the original panic behind a second one.
            return;
        }

        for tx in self.command_txs.drain(..) {
            // A worker that already exited has dropped its receiver; nothing left to signal.
            drop(tx.send(Command::Shutdown));
        }

        for handle in self.join_handles.drain(..) {
            if let Err(payload) = handle.join() {
                // Jobs capture task panics themselves, so a worker panic is a harness bug.
                panic::resume_unwind(payload);
            }
        }
    }
}

enum Command {
    Execute(Box<dyn FnOnce() + Send>),
    Shutdown,
}

#[cfg_attr(test, mutants::skip)] // Impractical to test that a missing worker loop does nothing.
fn worker_entrypoint(rx: &mpsc::Receiver<Command>) {
    while let Ok(Command::Execute(job)) = rx.recv() {
        job();
    }
}
