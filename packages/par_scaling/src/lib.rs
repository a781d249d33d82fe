#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Diagnoses whether a runtime's threading model delivers real multi-core speedup.
//!
//! A runtime either lets threads execute truly in parallel, or serializes them behind a global
//! execution lock no matter how many threads there are. This package measures which one you
//! are dealing with by running the same workloads sequentially and on a worker pool, and
//! comparing the speedup against the range expected for the runtime's reported mode.
//!
//! The core functionality includes:
//! - [`WorkloadSpec`] - Three comparable workload shapes: floating point compute, hash chain
//!   compute and blocking waits
//! - [`run_sequential()`] and [`run_pooled()`] - The two execution strategies being compared
//! - [`introspect()`] - Captures the [`RuntimeProfile`] of a host runtime
//! - [`SpeedupRecord`] - Speedup derived from a matched pair of [`ExecutionResult`]s
//! - [`analyze()`] - Turns speedups into structured [`Verdict`]s
//! - [`Harness`] - Runs the phases in order and collects a [`BenchmarkReport`]
//!
//! This package is not meant for use in production, serving only as a diagnostic tool.
//!
//! # Host runtimes
//!
//! Native threads are never serialized by a global lock. [`HostRuntime`] can emulate one,
//! holding a process-wide lock while a workload computes and releasing it while the workload
//! blocks, so both sides of the comparison can be observed. The harness only reads the lock
//! state; it never changes it.
//!
//! # Phases
//!
//! A session runs up to three phases, strictly one after another:
//!
//! 1. **Ordinary compute**: floating point accumulation sized by the task size.
//! 2. **Best-case compute**: hash chains sized by a tenth of the task size. Skippable.
//! 3. **I/O-bound**: blocking waits of the configured duration. Skippable.
//!
//! In each phase the sequential run completes before the pooled run starts, so the two never
//! compete for processors.
//!
//! # Example
//!
//! ```
//! use par_scaling::{BenchmarkConfig, Harness, HostMode, HostRuntime, Subject};
//!
//! # fn main() -> par_scaling::Result<()> {
//! let config = BenchmarkConfig::builder()
//!     .task_count(4)
//!     .task_size(1_000)
//!     .thread_count(2)
//!     .skip_io(true)
//!     .build()?;
//!
//! let harness = Harness::new(config, HostRuntime::new(HostMode::Serialized));
//! let report = harness.run()?;
//!
//! for verdict in report.verdicts() {
//!     println!("{}: {}", verdict.subject(), verdict.classification());
//! }
//!
//! assert_eq!(report.verdicts()[0].subject(), Subject::OrdinaryCompute);
//! # Ok(())
//! # }
//! ```

mod classify;
mod config;
mod error;
mod executor;
mod harness;
mod host;
mod measure;
mod pool;
mod render;
mod runtime;
mod workload;

pub use classify::*;
pub use config::*;
pub use error::*;
pub use executor::*;
pub use harness::*;
pub use host::*;
pub use measure::*;
pub use render::*;
pub use runtime::*;
pub use workload::*;

pub(crate) const ERR_POISONED_LOCK: &str =
    "encountered poisoned lock - program validity cannot be guaranteed";
