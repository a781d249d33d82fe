use std::io;

use thiserror::Error;

use crate::{ExecutionMode, WorkloadKind};

/// Errors that can abort a benchmark session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The configuration was rejected before any phase started.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A workload invocation failed, aborting the phase it was part of.
    #[error("{kind} workload failed during {mode} run: {source}")]
    Workload {
        /// The workload that was executing.
        kind: WorkloadKind,

        /// Which executor was running it.
        mode: ExecutionMode,

        /// The first failure observed in the run.
        source: TaskError,
    },

    /// A worker thread for a pooled run could not be started.
    #[error("failed to spawn worker thread")]
    Spawn(#[source] io::Error),

    /// Two execution results that do not describe the same task set were paired up.
    #[error(
        "cannot compare {baseline_mode} run of {baseline_kind} x{baseline_tasks} \
         with {comparison_mode} run of {comparison_kind} x{comparison_tasks}"
    )]
    MismatchedPair {
        /// Workload of the baseline result.
        baseline_kind: WorkloadKind,

        /// Execution mode of the baseline result.
        baseline_mode: ExecutionMode,

        /// Task count of the baseline result.
        baseline_tasks: usize,

        /// Workload of the comparison result.
        comparison_kind: WorkloadKind,

        /// Execution mode of the comparison result.
        comparison_mode: ExecutionMode,

        /// Task count of the comparison result.
        comparison_tasks: usize,
    },
}

/// Failure of an executor run, before the workload it was running is known.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExecutionError {
    /// A task invocation failed and the run was aborted.
    #[error(transparent)]
    Task(TaskError),

    /// A worker thread could not be started.
    #[error("failed to spawn worker thread")]
    Spawn(#[source] io::Error),
}

impl ExecutionError {
    /// Attaches the workload and executor identity to the failure.
    pub(crate) fn into_error(self, kind: WorkloadKind, mode: ExecutionMode) -> Error {
        match self {
            Self::Task(source) => Error::Workload { kind, mode, source },
            Self::Spawn(source) => Error::Spawn(source),
        }
    }
}

/// Configuration values that cannot be used to run a session.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    /// At least one task must be executed per run.
    #[error("task count must be at least 1")]
    ZeroTaskCount,

    /// Pooled runs need at least one worker thread.
    #[error("thread count must be at least 1")]
    ZeroThreadCount,
}

/// Failure of a single task invocation.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum TaskError {
    /// The task reported a failure.
    #[error("task failed: {0}")]
    Failed(String),

    /// The task panicked. The panic was captured so the run could shut down cleanly.
    #[error("task panicked: {0}")]
    Panicked(String),
}

/// A specialized `Result` type for benchmark operations, returning the crate's [`Error`] type
/// as the error value.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);
    assert_impl_all!(TaskError: Send, Sync, Clone);

    #[test]
    fn config_error_converts() {
        let error: Error = ConfigError::ZeroThreadCount.into();

        assert!(matches!(error, Error::Config(ConfigError::ZeroThreadCount)));
        assert_eq!(
            error.to_string(),
            "invalid configuration: thread count must be at least 1"
        );
    }

    #[test]
    fn workload_error_names_context() {
        let error = Error::Workload {
            kind: WorkloadKind::ComputeHashChain,
            mode: ExecutionMode::Pooled,
            source: TaskError::Panicked("boom".to_string()),
        };

        assert_eq!(
            error.to_string(),
            "compute-hash-chain workload failed during pooled run: task panicked: boom"
        );
    }
}
