//! The benchmark session: phases executed in a fixed order against one captured runtime
//! profile.

use std::sync::Arc;

use crate::{
    BenchmarkConfig, ExecutionResult, HostRuntime, Result, RuntimeProfile, SpeedupRecord, Verdict,
    WorkloadSpec, analyze, introspect, measure_pooled, measure_sequential,
};

/// One workload's full sequential run, pooled run and speedup computation.
#[derive(Clone, Copy, Debug, derive_more::Display, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Phase {
    /// Floating point compute, sized by the configured task size.
    #[display("ordinary compute")]
    OrdinaryCompute,

    /// Hash chain compute, sized by a tenth of the configured task size.
    #[display("best-case compute")]
    BestCaseCompute,

    /// Blocking waits of the configured I/O duration.
    #[display("I/O-bound")]
    IoBound,
}

/// The measured outcome of one [`Phase`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseMeasurement {
    phase: Phase,
    sequential: ExecutionResult,
    pooled: ExecutionResult,
    speedup: SpeedupRecord,
}

impl PhaseMeasurement {
    /// Pairs the two runs of a phase and derives their speedup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MismatchedPair`](crate::Error::MismatchedPair) if the runs do not
    /// describe the same task set.
    pub fn new(phase: Phase, sequential: ExecutionResult, pooled: ExecutionResult) -> Result<Self> {
        let speedup = SpeedupRecord::from_pair(&sequential, &pooled)?;

        Ok(Self {
            phase,
            sequential,
            pooled,
            speedup,
        })
    }

    /// Which phase this is.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The baseline run.
    #[must_use]
    pub fn sequential(&self) -> &ExecutionResult {
        &self.sequential
    }

    /// The pooled run.
    #[must_use]
    pub fn pooled(&self) -> &ExecutionResult {
        &self.pooled
    }

    /// The speedup of the pooled run over the baseline.
    #[must_use]
    pub fn speedup(&self) -> &SpeedupRecord {
        &self.speedup
    }
}

/// Everything one session measured and concluded.
#[derive(Clone, Debug, PartialEq)]
pub struct BenchmarkReport {
    profile: RuntimeProfile,
    phases: Vec<PhaseMeasurement>,
    verdicts: Vec<Verdict>,
}

impl BenchmarkReport {
    #[cfg(test)]
    pub(crate) fn for_tests(
        profile: RuntimeProfile,
        phases: Vec<PhaseMeasurement>,
        verdicts: Vec<Verdict>,
    ) -> Self {
        Self {
            profile,
            phases,
            verdicts,
        }
    }

    /// The runtime profile every phase ran against.
    #[must_use]
    pub fn profile(&self) -> &RuntimeProfile {
        &self.profile
    }

    /// The phases that ran, in execution order.
    #[must_use]
    pub fn phases(&self) -> &[PhaseMeasurement] {
        &self.phases
    }

    /// The measurement of a specific phase, if it ran.
    #[must_use]
    pub fn phase(&self, phase: Phase) -> Option<&PhaseMeasurement> {
        self.phases.iter().find(|m| m.phase() == phase)
    }

    /// Every executor run, in execution order.
    pub fn executions(&self) -> impl Iterator<Item = &ExecutionResult> {
        self.phases
            .iter()
            .flat_map(|m| [m.sequential(), m.pooled()])
    }

    /// Every speedup record, in execution order.
    pub fn speedups(&self) -> impl Iterator<Item = &SpeedupRecord> {
        self.phases.iter().map(PhaseMeasurement::speedup)
    }

    /// The verdicts derived from the phases.
    #[must_use]
    pub fn verdicts(&self) -> &[Verdict] {
        &self.verdicts
    }
}

/// Runs benchmark sessions against one host runtime.
///
/// The runtime profile is captured once when the harness is created and reused, unchanged,
/// by every session run on it.
///
/// # Examples
///
/// ```
/// use par_scaling::{BenchmarkConfig, Harness, HostMode, HostRuntime, Phase};
///
/// let config = BenchmarkConfig::builder()
///     .task_count(4)
///     .task_size(1_000)
///     .thread_count(2)
///     .skip_io(true)
///     .build()
///     .unwrap();
///
/// let harness = Harness::new(config, HostRuntime::new(HostMode::Native));
/// let report = harness.run().unwrap();
///
/// assert_eq!(report.phases().len(), 2);
/// assert!(report.phase(Phase::IoBound).is_none());
/// ```
#[derive(Debug)]
pub struct Harness {
    config: BenchmarkConfig,
    host: Arc<HostRuntime>,
    profile: RuntimeProfile,
}

impl Harness {
    /// Creates a harness, introspecting `host` to capture the runtime profile.
    #[must_use]
    pub fn new(config: BenchmarkConfig, host: HostRuntime) -> Self {
        let profile = introspect(&host, config.thread_count());

        Self {
            config,
            host: Arc::new(host),
            profile,
        }
    }

    /// The settings sessions run with.
    #[must_use]
    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// The runtime profile captured at creation.
    #[must_use]
    pub fn profile(&self) -> &RuntimeProfile {
        &self.profile
    }

    /// The phases a session will run, in order, with the workload each one executes.
    #[must_use]
    pub fn planned_phases(&self) -> Vec<(Phase, WorkloadSpec)> {
        let mut phases = vec![(
            Phase::OrdinaryCompute,
            WorkloadSpec::compute_float(self.config.task_size()),
        )];

        if !self.config.skip_best_case() {
            phases.push((
                Phase::BestCaseCompute,
                WorkloadSpec::best_case(self.config.task_size()),
            ));
        }

        if !self.config.skip_io() {
            phases.push((
                Phase::IoBound,
                WorkloadSpec::io_wait(self.config.io_duration()),
            ));
        }

        phases
    }

    /// Runs every planned phase in order and classifies the results.
    ///
    /// Within a phase the sequential run finishes before the pooled run starts, and each phase
    /// finishes before the next one starts.
    ///
    /// # Errors
    ///
    /// The first failing phase aborts the session and its error is returned.
    pub fn run(&self) -> Result<BenchmarkReport> {
        let planned = self.planned_phases();
        let mut phases = Vec::with_capacity(planned.len());

        for (phase, spec) in planned {
            phases.push(self.run_phase(phase, spec)?);
        }

        let verdicts = analyze(&self.profile, &phases);

        Ok(BenchmarkReport {
            profile: self.profile,
            phases,
            verdicts,
        })
    }

    fn run_phase(&self, phase: Phase, spec: WorkloadSpec) -> Result<PhaseMeasurement> {
        let task_count = self.config.task_count();
        let thread_count = self.profile.thread_count();

        tracing::info!(
            %phase,
            workload = %spec.kind(),
            parameter = spec.parameter(),
            task_count = task_count.get(),
            thread_count = thread_count.get(),
            "starting phase"
        );

        let sequential = measure_sequential(&self.host, spec, task_count)?;

        tracing::info!(%phase, elapsed = ?sequential.elapsed(), "sequential run finished");

        let pooled = measure_pooled(&self.host, spec, task_count, thread_count)?;

        tracing::info!(%phase, elapsed = ?pooled.elapsed(), "pooled run finished");

        let measurement = PhaseMeasurement::new(phase, sequential, pooled)?;

        tracing::info!(
            %phase,
            speedup = measurement.speedup().speedup(),
            "phase finished"
        );

        Ok(measurement)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{HostMode, WorkloadKind};

    fn small_config() -> BenchmarkConfig {
        BenchmarkConfig::builder()
            .task_count(4)
            .task_size(500)
            .thread_count(2)
            .io_duration(Duration::from_millis(1))
            .build()
            .unwrap()
    }

    #[test]
    fn plans_all_phases_by_default() {
        let harness = Harness::new(small_config(), HostRuntime::default());

        let planned = harness.planned_phases();

        assert_eq!(
            planned,
            [
                (Phase::OrdinaryCompute, WorkloadSpec::compute_float(500)),
                (Phase::BestCaseCompute, WorkloadSpec::compute_hash_chain(50)),
                (
                    Phase::IoBound,
                    WorkloadSpec::io_wait(Duration::from_millis(1))
                ),
            ]
        );
    }

    #[test]
    fn skip_flags_remove_phases() {
        let config = BenchmarkConfig::builder()
            .skip_best_case(true)
            .skip_io(true)
            .build()
            .unwrap();
        let harness = Harness::new(config, HostRuntime::default());

        let phases: Vec<_> = harness
            .planned_phases()
            .into_iter()
            .map(|(phase, _)| phase)
            .collect();

        assert_eq!(phases, [Phase::OrdinaryCompute]);
    }

    #[test]
    fn profile_uses_explicit_thread_count() {
        let harness = Harness::new(small_config(), HostRuntime::new(HostMode::Serialized));

        assert_eq!(harness.profile().thread_count().get(), 2);
        assert!(harness.profile().lock_active());
    }

    #[cfg_attr(miri, ignore)] // Spawns threads and sleeps.
    #[test]
    fn run_produces_matched_results() {
        let harness = Harness::new(small_config(), HostRuntime::default());

        let report = harness.run().unwrap();

        assert_eq!(report.phases().len(), 3);
        assert_eq!(report.executions().count(), 6);
        assert_eq!(report.speedups().count(), 3);

        for measurement in report.phases() {
            assert_eq!(measurement.sequential().completed(), 4);
            assert_eq!(measurement.pooled().completed(), 4);
            assert_eq!(measurement.pooled().thread_count().get(), 2);
            assert_eq!(
                measurement.sequential().kind(),
                measurement.pooled().kind()
            );
        }

        assert_eq!(
            report.phase(Phase::IoBound).unwrap().speedup().kind(),
            WorkloadKind::IoWait
        );
        assert!(!report.verdicts().is_empty());
    }
}
