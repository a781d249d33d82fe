//! Measurement: turning executor runs into immutable results and comparing matched pairs.

use std::hint::black_box;
use std::num::NonZero;
use std::sync::Arc;
use std::time::Duration;

use new_zealand::nz;

use crate::{
    Error, ExecutionMode, HostRuntime, Result, Task, TaskError, WorkloadKind, WorkloadSpec,
    run_pooled, run_sequential,
};

/// The outcome of one executor run over one workload.
///
/// Produced exactly once per run and never modified afterwards.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExecutionResult {
    kind: WorkloadKind,
    mode: ExecutionMode,
    thread_count: NonZero<usize>,
    task_count: NonZero<usize>,
    completed: usize,
    elapsed: Duration,
}

impl ExecutionResult {
    /// The workload that was executed.
    #[must_use]
    pub fn kind(&self) -> WorkloadKind {
        self.kind
    }

    /// The execution strategy used.
    #[must_use]
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Threads that executed tasks (always 1 for sequential runs).
    #[must_use]
    pub fn thread_count(&self) -> NonZero<usize> {
        self.thread_count
    }

    /// Tasks the run was asked to execute.
    #[must_use]
    pub fn task_count(&self) -> NonZero<usize> {
        self.task_count
    }

    /// Tasks that completed.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Wall-clock time of the run.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Ratio of a baseline duration to a comparison duration, in seconds.
///
/// Returns 0 when the comparison is zero, negative or not finite, which is what a timer too
/// coarse for the measured work produces.
///
/// # Examples
///
/// ```
/// use par_scaling::speedup_ratio;
///
/// assert_eq!(speedup_ratio(10.0, 5.0), 2.0);
/// assert_eq!(speedup_ratio(10.0, 0.0), 0.0);
/// ```
#[must_use]
pub fn speedup_ratio(baseline_secs: f64, comparison_secs: f64) -> f64 {
    if !comparison_secs.is_finite() || comparison_secs <= 0.0 {
        return 0.0;
    }

    baseline_secs / comparison_secs
}

/// [`speedup_ratio()`] for two durations.
#[must_use]
pub fn speedup(baseline: Duration, comparison: Duration) -> f64 {
    speedup_ratio(baseline.as_secs_f64(), comparison.as_secs_f64())
}

/// Speedup of a pooled run over the sequential run of the same task set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedupRecord {
    kind: WorkloadKind,
    task_count: NonZero<usize>,
    sequential: Duration,
    pooled: Duration,
    speedup: f64,
}

impl SpeedupRecord {
    /// Derives the record from a sequential and a pooled result of the same task set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MismatchedPair`] if the results are not a sequential and a pooled run
    /// of the same workload kind with the same task count.
    pub fn from_pair(sequential: &ExecutionResult, pooled: &ExecutionResult) -> Result<Self> {
        if sequential.mode != ExecutionMode::Sequential
            || pooled.mode != ExecutionMode::Pooled
            || sequential.kind != pooled.kind
            || sequential.task_count != pooled.task_count
        {
            return Err(Error::MismatchedPair {
                baseline_kind: sequential.kind,
                baseline_mode: sequential.mode,
                baseline_tasks: sequential.task_count.get(),
                comparison_kind: pooled.kind,
                comparison_mode: pooled.mode,
                comparison_tasks: pooled.task_count.get(),
            });
        }

        Ok(Self {
            kind: sequential.kind,
            task_count: sequential.task_count,
            sequential: sequential.elapsed,
            pooled: pooled.elapsed,
            speedup: speedup(sequential.elapsed, pooled.elapsed),
        })
    }

    /// The workload both runs executed.
    #[must_use]
    pub fn kind(&self) -> WorkloadKind {
        self.kind
    }

    /// The task count both runs executed.
    #[must_use]
    pub fn task_count(&self) -> NonZero<usize> {
        self.task_count
    }

    /// Elapsed time of the sequential run.
    #[must_use]
    pub fn sequential(&self) -> Duration {
        self.sequential
    }

    /// Elapsed time of the pooled run.
    #[must_use]
    pub fn pooled(&self) -> Duration {
        self.pooled
    }

    /// Sequential time divided by pooled time; 0 for a degenerate pooled time.
    #[must_use]
    pub fn speedup(&self) -> f64 {
        self.speedup
    }
}

/// A workload bound to the host runtime that executes it.
#[derive(Debug)]
struct HostedWorkload {
    spec: WorkloadSpec,
    host: Arc<HostRuntime>,
}

impl Task for HostedWorkload {
    fn invoke(&self) -> std::result::Result<(), TaskError> {
        black_box(self.host.execute(&self.spec));
        Ok(())
    }
}

/// Runs `spec` sequentially `task_count` times under `host`.
///
/// # Errors
///
/// Returns [`Error::Workload`] if an invocation fails.
pub fn measure_sequential(
    host: &Arc<HostRuntime>,
    spec: WorkloadSpec,
    task_count: NonZero<usize>,
) -> Result<ExecutionResult> {
    let task = HostedWorkload {
        spec,
        host: Arc::clone(host),
    };

    let timing = run_sequential(&task, task_count)
        .map_err(|e| e.into_error(spec.kind(), ExecutionMode::Sequential))?;

    Ok(ExecutionResult {
        kind: spec.kind(),
        mode: ExecutionMode::Sequential,
        thread_count: nz!(1),
        task_count,
        completed: timing.completed(),
        elapsed: timing.elapsed(),
    })
}

/// Runs `spec` `task_count` times under `host` on a pool of `thread_count` workers.
///
/// # Errors
///
/// Returns [`Error::Workload`] if an invocation fails or [`Error::Spawn`] if the pool could not
/// be started.
pub fn measure_pooled(
    host: &Arc<HostRuntime>,
    spec: WorkloadSpec,
    task_count: NonZero<usize>,
    thread_count: NonZero<usize>,
) -> Result<ExecutionResult> {
    let task = Arc::new(HostedWorkload {
        spec,
        host: Arc::clone(host),
    });

    let timing = run_pooled(&task, task_count, thread_count)
        .map_err(|e| e.into_error(spec.kind(), ExecutionMode::Pooled))?;

    Ok(ExecutionResult {
        kind: spec.kind(),
        mode: ExecutionMode::Pooled,
        thread_count,
        task_count,
        completed: timing.completed(),
        elapsed: timing.elapsed(),
    })
}

#[cfg(test)]
pub(crate) fn result_for_tests(
    kind: WorkloadKind,
    mode: ExecutionMode,
    task_count: NonZero<usize>,
    elapsed: Duration,
) -> ExecutionResult {
    ExecutionResult {
        kind,
        mode,
        thread_count: nz!(1),
        task_count,
        completed: task_count.get(),
        elapsed,
    }
}
