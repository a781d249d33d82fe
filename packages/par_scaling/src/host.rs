//! Host runtimes that workloads execute under.
//!
//! Native Rust threads are never serialized by a global lock. To observe how such a lock
//! shapes throughput, a [`HostRuntime`] can emulate one: a process-wide execution lock that a
//! workload holds while it computes and releases while it blocks, the way an interpreter lock
//! is released around blocking I/O.
//!
//! The mode is chosen once when the host runtime is created. The measurement core only reads
//! it, through [`RuntimeIntrospector`].

use std::str::FromStr;
use std::sync::Mutex;

use crate::{ERR_POISONED_LOCK, LockState, RuntimeIntrospector, WorkloadSpec};

/// How a [`HostRuntime`] coordinates concurrently executing workloads.
#[derive(Clone, Copy, Debug, Default, derive_more::Display, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum HostMode {
    /// No execution lock. Workloads run truly in parallel.
    #[default]
    #[display("native")]
    Native,

    /// A build that could run without the execution lock, running with it enabled.
    #[display("serialized")]
    Serialized,

    /// A build that always has the execution lock and cannot report on it.
    #[display("legacy")]
    Legacy,
}

impl HostMode {
    fn holds_execution_lock(self) -> bool {
        match self {
            Self::Native => false,
            Self::Serialized | Self::Legacy => true,
        }
    }
}

impl FromStr for HostMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "native" => Ok(Self::Native),
            "serialized" => Ok(Self::Serialized),
            "legacy" => Ok(Self::Legacy),
            _ => Err(format!(
                "invalid host runtime mode: '{s}'. Valid options are: native, serialized, legacy"
            )),
        }
    }
}

/// The runtime that executes workload invocations for the harness.
///
/// # Examples
///
/// ```
/// use par_scaling::{HostMode, HostRuntime, RuntimeIntrospector, WorkloadSpec};
///
/// let host = HostRuntime::new(HostMode::Serialized);
///
/// let lock = host.query_lock().unwrap();
/// assert!(lock.active);
///
/// assert_eq!(host.execute(&WorkloadSpec::compute_float(4)), 6);
/// ```
#[derive(Debug, Default)]
pub struct HostRuntime {
    mode: HostMode,
    execution_lock: Mutex<()>,
}

impl HostRuntime {
    /// Creates a host runtime operating in the given mode.
    #[must_use]
    pub fn new(mode: HostMode) -> Self {
        Self {
            mode,
            execution_lock: Mutex::new(()),
        }
    }

    /// The mode this host runtime was created with.
    #[must_use]
    pub fn mode(&self) -> HostMode {
        self.mode
    }

    /// Executes one invocation of a workload under this runtime's lock discipline.
    ///
    /// Compute workloads hold the execution lock (if the mode has one) for the whole
    /// invocation. Blocking workloads never hold it.
    pub fn execute(&self, spec: &WorkloadSpec) -> u64 {
        if !self.mode.holds_execution_lock() || spec.is_blocking() {
            return spec.run();
        }

        let _guard = self.execution_lock.lock().expect(ERR_POISONED_LOCK);
        spec.run()
    }
}

impl RuntimeIntrospector for HostRuntime {
    fn query_lock(&self) -> Option<LockState> {
        match self.mode {
            HostMode::Native => Some(LockState {
                active: false,
                removable: true,
            }),
            HostMode::Serialized => Some(LockState {
                active: true,
                removable: true,
            }),
            HostMode::Legacy => None,
        }
    }
}
