//! Runtime introspection: what concurrency-control mode the host runtime is in and how many
//! processors are available to it.

use std::num::NonZero;
use std::thread;

use new_zealand::nz;

/// The state of a runtime's global execution lock as reported by the runtime itself.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "plain data pair, constructed by introspector implementations"
)]
pub struct LockState {
    /// Whether the lock currently serializes execution in this process.
    pub active: bool,

    /// Whether the runtime build is capable of running without the lock at all.
    pub removable: bool,
}

impl LockState {
    /// The assumption used when the runtime cannot answer: the lock is always there.
    pub const CONSERVATIVE: Self = Self {
        active: true,
        removable: false,
    };
}

/// Where the lock state in a [`RuntimeProfile`] came from.
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum LockStateSource {
    /// The runtime answered the query.
    #[display("queried")]
    Queried,

    /// The runtime could not answer, so [`LockState::CONSERVATIVE`] was substituted.
    #[display("assumed")]
    Assumed,
}

/// Read-only access to the concurrency facts of a host runtime.
///
/// The harness only ever reads these facts. It never attempts to change the lock state.
pub trait RuntimeIntrospector {
    /// Queries the execution lock state, or `None` if this runtime has no way to report it.
    fn query_lock(&self) -> Option<LockState>;

    /// Number of logical processors available to the process.
    fn detect_cores(&self) -> NonZero<usize> {
        detect_cores()
    }
}

/// Number of logical processors available to the process, or 1 if that cannot be determined.
#[must_use]
pub fn detect_cores() -> NonZero<usize> {
    thread::available_parallelism().unwrap_or(nz!(1))
}

/// The concurrency facts of one session, captured once before any phase runs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RuntimeProfile {
    lock: LockState,
    lock_source: LockStateSource,
    core_count: NonZero<usize>,
    thread_count: NonZero<usize>,
}

impl RuntimeProfile {
    /// Assembles a profile from already-known facts.
    ///
    /// Most callers want [`introspect()`] instead; this exists for callers that obtained the
    /// facts some other way, such as replaying an earlier session.
    #[must_use]
    pub fn new(lock: LockState, core_count: NonZero<usize>, thread_count: NonZero<usize>) -> Self {
        Self {
            lock,
            lock_source: LockStateSource::Queried,
            core_count,
            thread_count,
        }
    }

    /// Whether the execution lock is active for this process.
    #[must_use]
    pub fn lock_active(&self) -> bool {
        self.lock.active
    }

    /// Whether the runtime build can run without the execution lock.
    #[must_use]
    pub fn lock_removable(&self) -> bool {
        self.lock.removable
    }

    /// Whether threads in this runtime can execute truly in parallel.
    #[must_use]
    pub fn is_parallel(&self) -> bool {
        !self.lock.active
    }

    /// Whether the lock state was reported by the runtime or assumed.
    #[must_use]
    pub fn lock_source(&self) -> LockStateSource {
        self.lock_source
    }

    /// Logical processors detected at introspection time.
    #[must_use]
    pub fn core_count(&self) -> NonZero<usize> {
        self.core_count
    }

    /// Worker threads used by every pooled run of the session.
    #[must_use]
    pub fn thread_count(&self) -> NonZero<usize> {
        self.thread_count
    }
}

/// Captures the [`RuntimeProfile`] of a host runtime.
///
/// If `explicit_threads` is `None`, pooled runs use one thread per detected core. If the
/// runtime cannot report its lock state, the conservative "lock always active" assumption is
/// used instead of failing.
pub fn introspect<I>(introspector: &I, explicit_threads: Option<NonZero<usize>>) -> RuntimeProfile
where
    I: RuntimeIntrospector + ?Sized,
{
    let core_count = introspector.detect_cores();
    let thread_count = explicit_threads.unwrap_or(core_count);

    let (lock, lock_source) = match introspector.query_lock() {
        Some(lock) => (lock, LockStateSource::Queried),
        None => {
            tracing::warn!("runtime cannot report its execution lock state, assuming it is active");
            (LockState::CONSERVATIVE, LockStateSource::Assumed)
        }
    };

    tracing::debug!(
        lock_active = lock.active,
        lock_removable = lock.removable,
        %lock_source,
        core_count = core_count.get(),
        thread_count = thread_count.get(),
        "captured runtime profile"
    );

    RuntimeProfile {
        lock,
        lock_source,
        core_count,
        thread_count,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    struct FakeIntrospector {
        lock: Option<LockState>,
        cores: NonZero<usize>,
        queries: Cell<usize>,
    }

    impl RuntimeIntrospector for FakeIntrospector {
        fn query_lock(&self) -> Option<LockState> {
            self.queries.set(self.queries.get() + 1);
            self.lock
        }

        fn detect_cores(&self) -> NonZero<usize> {
            self.cores
        }
    }

    fn fake(lock: Option<LockState>, cores: usize) -> FakeIntrospector {
        FakeIntrospector {
            lock,
            cores: NonZero::new(cores).unwrap(),
            queries: Cell::new(0),
        }
    }

    #[test]
    fn thread_count_defaults_to_core_count() {
        let introspector = fake(
            Some(LockState {
                active: false,
                removable: true,
            }),
            6,
        );

        let profile = introspect(&introspector, None);

        assert_eq!(profile.core_count().get(), 6);
        assert_eq!(profile.thread_count().get(), 6);
        assert!(profile.is_parallel());
        assert!(profile.lock_removable());
        assert_eq!(profile.lock_source(), LockStateSource::Queried);
    }

    #[test]
    fn explicit_thread_count_wins() {
        let introspector = fake(Some(LockState::CONSERVATIVE), 6);

        let profile = introspect(&introspector, Some(nz!(3)));

        assert_eq!(profile.core_count().get(), 6);
        assert_eq!(profile.thread_count().get(), 3);
    }

    #[test]
    fn unavailable_lock_query_falls_back_to_conservative() {
        let introspector = fake(None, 2);

        let profile = introspect(&introspector, None);

        assert!(profile.lock_active());
        assert!(!profile.lock_removable());
        assert_eq!(profile.lock_source(), LockStateSource::Assumed);
    }

    #[test]
    fn every_introspection_queries_again() {
        let introspector = fake(Some(LockState::CONSERVATIVE), 2);

        _ = introspect(&introspector, None);
        _ = introspect(&introspector, None);

        assert_eq!(introspector.queries.get(), 2);
    }

    #[test]
    fn detected_cores_is_at_least_one() {
        assert!(detect_cores().get() >= 1);
    }
}
