//! The workload library: three comparable workload shapes and the value type that names them.
//!
//! Every workload function is pure apart from its return value (and, for [`io_wait`], the time
//! the calling thread spends asleep). None of them touch shared mutable state, so any number of
//! threads may invoke them concurrently without external synchronization.

use std::hint::black_box;
use std::thread;
use std::time::Duration;

/// Number of hashing rounds performed by a single [`compute_hash_chain`] invocation.
pub const HASH_CHAIN_ROUNDS: u32 = 1000;

/// The best-case phase runs hash chains seeded from a tenth of the configured task size.
const BEST_CASE_SIZE_DIVISOR: u64 = 10;

/// Identifies which of the workload shapes a [`WorkloadSpec`] describes.
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum WorkloadKind {
    /// Floating point accumulation over an integer range.
    #[display("compute-float")]
    ComputeFloat,

    /// Repeated hashing of a small mutable buffer.
    #[display("compute-hash-chain")]
    ComputeHashChain,

    /// Blocking wait that consumes no processor time.
    #[display("io-wait")]
    IoWait,
}

/// A workload kind together with the parameter that sizes it.
///
/// This is a plain value: it is constructed once per benchmark phase and copied into every
/// worker that executes it.
///
/// # Examples
///
/// ```
/// use par_scaling::{WorkloadKind, WorkloadSpec};
///
/// let spec = WorkloadSpec::compute_float(1_000);
/// assert_eq!(spec.kind(), WorkloadKind::ComputeFloat);
/// assert_eq!(spec.run(), 21_097);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WorkloadSpec {
    kind: WorkloadKind,
    parameter: u64,
}

impl WorkloadSpec {
    /// Sums the square roots of all integers in `[1, n]`.
    #[must_use]
    pub fn compute_float(n: u64) -> Self {
        Self {
            kind: WorkloadKind::ComputeFloat,
            parameter: n,
        }
    }

    /// Hashes a buffer seeded from `n mod 256` for [`HASH_CHAIN_ROUNDS`] rounds.
    #[must_use]
    pub fn compute_hash_chain(n: u64) -> Self {
        Self {
            kind: WorkloadKind::ComputeHashChain,
            parameter: n,
        }
    }

    /// The hash chain workload sized for the best-case phase from the configured task size.
    #[must_use]
    pub fn best_case(task_size: u64) -> Self {
        Self::compute_hash_chain(task_size / BEST_CASE_SIZE_DIVISOR)
    }

    /// Sleeps for `duration`, rounded down to whole milliseconds.
    #[must_use]
    pub fn io_wait(duration: Duration) -> Self {
        Self {
            kind: WorkloadKind::IoWait,
            parameter: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// The workload shape.
    #[must_use]
    pub fn kind(&self) -> WorkloadKind {
        self.kind
    }

    /// The size (compute kinds) or duration in milliseconds (I/O kind).
    #[must_use]
    pub fn parameter(&self) -> u64 {
        self.parameter
    }

    /// Whether the workload spends its time blocked rather than computing.
    ///
    /// Host runtimes release their execution lock around blocking workloads.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self.kind, WorkloadKind::IoWait)
    }

    /// Executes one invocation of the workload on the calling thread.
    pub fn run(&self) -> u64 {
        match self.kind {
            WorkloadKind::ComputeFloat => compute_float(self.parameter),
            WorkloadKind::ComputeHashChain => compute_hash_chain(self.parameter),
            WorkloadKind::IoWait => io_wait(Duration::from_millis(self.parameter)),
        }
    }
}

/// Accumulates `sqrt(i)` for every integer `i` in `[1, n]` and returns the integer part.
#[must_use]
#[expect(
    clippy::cast_precision_loss,
    reason = "precision loss above 2^53 is irrelevant for a synthetic workload"
)]
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "the sum of square roots is non-negative and saturates on conversion"
)]
pub fn compute_float(n: u64) -> u64 {
    let mut total = 0.0_f64;

    for i in 1..=n {
        total += black_box(i as f64).sqrt();
    }

    total as u64
}

/// Hashes a small buffer repeatedly, folding the leading digest bytes into an accumulator.
///
/// The buffer holds the bytes `0..(n mod 256)`. After every round its first byte (if any) is
/// incremented, so each round hashes different input.
#[must_use]
pub fn compute_hash_chain(n: u64) -> u64 {
    let seed_len = usize::try_from(n % 256).expect("value below 256 always fits in usize");

    let mut data: Vec<u8> = (0..=u8::MAX).take(seed_len).collect();
    let mut accumulator = 0_u64;

    for _ in 0..HASH_CHAIN_ROUNDS {
        let digest = blake3::hash(&data);
        let [a, b, c, d, ..] = *digest.as_bytes();

        accumulator = accumulator.wrapping_add(u64::from(u32::from_be_bytes([a, b, c, d])));

        if let Some(first) = data.first_mut() {
            *first = first.wrapping_add(1);
        }
    }

    accumulator
}

/// Blocks the calling thread for `duration` and returns the duration in milliseconds.
pub fn io_wait(duration: Duration) -> u64 {
    thread::sleep(duration);

    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
