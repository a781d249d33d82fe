//! Classification of measured speedups against the bands expected for the runtime mode.
//!
//! Every function here is a pure decision over its inputs. Nothing is remembered between
//! calls, so the same inputs always produce the same verdict.

use crate::{ExecutionResult, Phase, PhaseMeasurement, RuntimeProfile, SpeedupRecord};

/// Lowest ordinary compute speedup considered excellent when threads run in parallel.
const PARALLEL_COMPUTE_TARGET: f64 = 2.0;

/// Informal ceiling of the ordinary compute band when threads run in parallel.
const PARALLEL_COMPUTE_CEILING: f64 = 5.0;

/// Ordinary compute speedups from here up to the target are approaching the band.
const PARALLEL_COMPUTE_APPROACHING: f64 = 1.5;

/// Highest ordinary compute speedup expected while the execution lock is active.
const SERIALIZED_COMPUTE_CEILING: f64 = 1.2;

/// Fraction of linear scaling the best-case workload should reach.
const BEST_CASE_EFFICIENCY: f64 = 0.85;

/// Fraction of the best-case target still considered good.
const BEST_CASE_GOOD_FRACTION: f64 = 0.7;

/// Fraction of linear scaling blocking workloads should reach in any mode.
const IO_EFFICIENCY: f64 = 0.8;

/// Lowest ordinary-to-best-case speedup ratio that does not suggest hidden serialization.
const EXTENSION_COMPATIBILITY_FLOOR: f64 = 0.9;

/// What a [`Verdict`] is about.
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Subject {
    /// Speedup of the ordinary floating point compute workload.
    #[display("ordinary compute speedup")]
    OrdinaryCompute,

    /// Speedup of the allocation-light hashing workload.
    #[display("best-case compute speedup")]
    BestCaseCompute,

    /// Speedup of the blocking workload.
    #[display("I/O-bound speedup")]
    IoBound,

    /// Sequential compute time, reported for lock-removable builds.
    #[display("single-thread overhead")]
    SingleThreadOverhead,

    /// Ordinary compute speedup relative to best-case speedup.
    #[display("extension compatibility")]
    ExtensionCompatibility,
}

/// The outcome of comparing an observed value with its expected band.
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Classification {
    /// At or above the target.
    #[display("excellent")]
    Excellent,

    /// Below the target but above the acceptable floor.
    #[display("good")]
    Good,

    /// Below the band but close to it.
    #[display("approaching")]
    Approaching,

    /// Below the band.
    #[display("below expected")]
    BelowExpected,

    /// Inside the band for a serialized runtime or a blocking workload.
    #[display("expected")]
    Expected,

    /// Above the ceiling expected while the execution lock is active.
    #[display("unexpected high")]
    UnexpectedHigh,

    /// Outside the band in a way no runtime mode explains.
    #[display("unexpected")]
    Unexpected,

    /// Parallelism is capped by the active execution lock; not a failure.
    #[display("limited by lock")]
    LimitedByLock,

    /// Reported for comparison with other runs, without a band.
    #[display("informational")]
    Informational,

    /// Suggests something in the workload is serialized despite the lock being off.
    #[display("warning")]
    Warning,
}

/// Range of values a metric is expected to fall in.
#[derive(Clone, Copy, Debug, PartialEq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "a range is a lower and an optional upper bound, nothing more"
)]
pub struct Band {
    /// Inclusive lower bound.
    pub lower: f64,

    /// Upper bound, or `None` if the band is open-ended.
    pub upper: Option<f64>,
}

impl Band {
    fn open(lower: f64) -> Self {
        Self { lower, upper: None }
    }

    fn closed(lower: f64, upper: f64) -> Self {
        Self {
            lower,
            upper: Some(upper),
        }
    }
}

/// A classified metric.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Verdict {
    subject: Subject,
    classification: Classification,
    band: Option<Band>,
    observed: f64,
}

impl Verdict {
    fn new(
        subject: Subject,
        classification: Classification,
        band: Option<Band>,
        observed: f64,
    ) -> Self {
        Self {
            subject,
            classification,
            band,
            observed,
        }
    }

    /// The metric this verdict is about.
    #[must_use]
    pub fn subject(&self) -> Subject {
        self.subject
    }

    /// How the observed value compares with the band.
    #[must_use]
    pub fn classification(&self) -> Classification {
        self.classification
    }

    /// The expected band, if the metric has one in this runtime mode.
    #[must_use]
    pub fn band(&self) -> Option<Band> {
        self.band
    }

    /// The observed value: a speedup, a ratio or (for overhead) sequential seconds.
    #[must_use]
    pub fn observed(&self) -> f64 {
        self.observed
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "thread counts are far below the precision limit of f64"
)]
fn threads(profile: &RuntimeProfile) -> f64 {
    profile.thread_count().get() as f64
}

/// Classifies the ordinary compute speedup.
#[must_use]
pub fn classify_ordinary_compute(profile: &RuntimeProfile, record: &SpeedupRecord) -> Verdict {
    let speedup = record.speedup();

    if profile.is_parallel() {
        let classification = if speedup >= PARALLEL_COMPUTE_TARGET {
            Classification::Excellent
        } else if speedup >= PARALLEL_COMPUTE_APPROACHING {
            Classification::Approaching
        } else {
            Classification::BelowExpected
        };

        return Verdict::new(
            Subject::OrdinaryCompute,
            classification,
            Some(Band::closed(PARALLEL_COMPUTE_TARGET, PARALLEL_COMPUTE_CEILING)),
            speedup,
        );
    }

    let classification = if speedup <= SERIALIZED_COMPUTE_CEILING {
        Classification::Expected
    } else {
        Classification::UnexpectedHigh
    };

    Verdict::new(
        Subject::OrdinaryCompute,
        classification,
        Some(Band::closed(0.0, SERIALIZED_COMPUTE_CEILING)),
        speedup,
    )
}

/// Classifies the best-case (allocation-light) compute speedup.
#[must_use]
pub fn classify_best_case(profile: &RuntimeProfile, record: &SpeedupRecord) -> Verdict {
    let speedup = record.speedup();

    if !profile.is_parallel() {
        return Verdict::new(
            Subject::BestCaseCompute,
            Classification::LimitedByLock,
            None,
            speedup,
        );
    }

    let thread_count = threads(profile);
    let target = thread_count * BEST_CASE_EFFICIENCY;
    let floor = target * BEST_CASE_GOOD_FRACTION;

    let classification = if speedup >= target {
        Classification::Excellent
    } else if speedup >= floor {
        Classification::Good
    } else {
        Classification::BelowExpected
    };

    Verdict::new(
        Subject::BestCaseCompute,
        classification,
        Some(Band::closed(floor, thread_count)),
        speedup,
    )
}

/// Classifies the blocking workload speedup, which should scale in every runtime mode.
#[must_use]
pub fn classify_io(profile: &RuntimeProfile, record: &SpeedupRecord) -> Verdict {
    let speedup = record.speedup();
    let lower = threads(profile) * IO_EFFICIENCY;

    let classification = if speedup >= lower {
        Classification::Expected
    } else {
        Classification::Unexpected
    };

    Verdict::new(
        Subject::IoBound,
        classification,
        Some(Band::open(lower)),
        speedup,
    )
}

/// Reports the sequential compute time of a lock-removable build, which pays for its
/// thread safety even on a single thread.
///
/// Returns `None` for builds that cannot remove the lock.
#[must_use]
pub fn classify_single_thread_overhead(
    profile: &RuntimeProfile,
    sequential: &ExecutionResult,
) -> Option<Verdict> {
    profile.lock_removable().then(|| {
        Verdict::new(
            Subject::SingleThreadOverhead,
            Classification::Informational,
            None,
            sequential.elapsed().as_secs_f64(),
        )
    })
}

/// Compares the ordinary compute speedup with the best-case speedup.
///
/// A parallel runtime whose ordinary compute scales much worse than the best case suggests
/// that something the ordinary workload depends on is still serialized. This is a heuristic
/// over single samples, with no variance estimate behind it.
///
/// The best-case speedup is floored at 1. If the best-case phase did not run, the ordinary
/// speedup is compared against that floor.
///
/// Returns `None` unless threads run in parallel.
#[must_use]
pub fn classify_extension_compatibility(
    profile: &RuntimeProfile,
    ordinary: &SpeedupRecord,
    best_case: Option<&SpeedupRecord>,
) -> Option<Verdict> {
    if !profile.is_parallel() {
        return None;
    }

    let ratio = ordinary.speedup() / best_case.map_or(1.0, |b| b.speedup().max(1.0));

    let classification = if ratio >= EXTENSION_COMPATIBILITY_FLOOR {
        Classification::Good
    } else {
        Classification::Warning
    };

    Some(Verdict::new(
        Subject::ExtensionCompatibility,
        classification,
        Some(Band::open(EXTENSION_COMPATIBILITY_FLOOR)),
        ratio,
    ))
}

/// Classifies every metric the measured phases allow.
///
/// Verdicts are ordered: ordinary compute, best case, I/O, single-thread overhead, extension
/// compatibility. Metrics whose phases were skipped are left out, except extension
/// compatibility, which only needs the ordinary compute phase.
#[must_use]
pub fn analyze(profile: &RuntimeProfile, phases: &[PhaseMeasurement]) -> Vec<Verdict> {
    let find = |phase: Phase| phases.iter().find(|m| m.phase() == phase);

    let ordinary = find(Phase::OrdinaryCompute);
    let best_case = find(Phase::BestCaseCompute);
    let io = find(Phase::IoBound);

    let mut verdicts = Vec::with_capacity(5);

    if let Some(ordinary) = ordinary {
        verdicts.push(classify_ordinary_compute(profile, ordinary.speedup()));
    }

    if let Some(best_case) = best_case {
        verdicts.push(classify_best_case(profile, best_case.speedup()));
    }

    if let Some(io) = io {
        verdicts.push(classify_io(profile, io.speedup()));
    }

    if let Some(ordinary) = ordinary {
        verdicts.extend(classify_single_thread_overhead(profile, ordinary.sequential()));
        verdicts.extend(classify_extension_compatibility(
            profile,
            ordinary.speedup(),
            best_case.map(PhaseMeasurement::speedup),
        ));
    }

    verdicts
}
