//! Integration tests for complete benchmark sessions.
//!
//! These tests run real workloads on real threads. They are ignored under Miri because Miri is
//! far too slow for timing-based assertions.

use std::num::NonZero;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use par_scaling::{
    BenchmarkConfig, Classification, ConfigError, Error, ExecutionError, Harness, HostMode,
    HostRuntime, LockStateSource, Phase, Subject, TaskError, WorkloadKind, WorkloadSpec,
    measure_pooled, measure_sequential, run_pooled, run_sequential,
};
use testing::{with_watchdog, with_watchdog_timeout};

fn nz(value: usize) -> NonZero<usize> {
    NonZero::new(value).unwrap()
}

fn io_config() -> BenchmarkConfig {
    BenchmarkConfig::builder()
        .task_count(8)
        .task_size(1_000)
        .thread_count(4)
        .io_duration(Duration::from_millis(50))
        .skip_best_case(true)
        .build()
        .unwrap()
}

#[cfg_attr(miri, ignore)]
#[test]
fn io_phase_scales_under_every_host_mode() {
    // Three full sessions of sleeping tasks, more than the default watchdog comfortably allows
    // on a loaded machine.
    with_watchdog_timeout(Duration::from_secs(30), || {
        for mode in [HostMode::Native, HostMode::Serialized, HostMode::Legacy] {
            let harness = Harness::new(io_config(), HostRuntime::new(mode));
            let report = harness.run().unwrap();

            let io = report.phase(Phase::IoBound).unwrap();

            assert_eq!(io.sequential().kind(), WorkloadKind::IoWait);
            assert!(io.sequential().elapsed() >= Duration::from_millis(400));
            assert!(
                io.speedup().speedup() > 2.0,
                "{mode}: I/O speedup {} should approach the thread count",
                io.speedup().speedup()
            );

            let io_verdict = report
                .verdicts()
                .iter()
                .find(|v| v.subject() == Subject::IoBound)
                .unwrap();
            assert_eq!(io_verdict.classification(), Classification::Expected);
        }
    });
}

#[cfg_attr(miri, ignore)]
#[test]
fn serialized_host_prevents_compute_scaling() {
    with_watchdog(|| {
        let host = Arc::new(HostRuntime::new(HostMode::Serialized));
        let spec = WorkloadSpec::compute_hash_chain(40);

        let sequential = measure_sequential(&host, spec, nz(16)).unwrap();
        let pooled = measure_pooled(&host, spec, nz(16), nz(4)).unwrap();

        let speedup = par_scaling::speedup(sequential.elapsed(), pooled.elapsed());
        assert!(
            speedup < 1.6,
            "compute speedup {speedup} should be limited by the execution lock"
        );
    });
}

#[cfg_attr(miri, ignore)]
#[test]
fn single_worker_pool_matches_sequential() {
    with_watchdog(|| {
        let host = Arc::new(HostRuntime::new(HostMode::Native));
        let spec = WorkloadSpec::io_wait(Duration::from_millis(20));

        let sequential = measure_sequential(&host, spec, nz(5)).unwrap();
        let pooled = measure_pooled(&host, spec, nz(5), nz(1)).unwrap();

        let speedup = par_scaling::speedup(sequential.elapsed(), pooled.elapsed());
        assert!(
            (0.7..1.4).contains(&speedup),
            "a single worker should take about as long as sequential execution, got {speedup}"
        );
    });
}

#[cfg_attr(miri, ignore)]
#[test]
fn repeated_sessions_keep_profile_and_plan() {
    with_watchdog(|| {
        let config = BenchmarkConfig::builder()
            .task_count(4)
            .task_size(2_000)
            .thread_count(2)
            .io_duration(Duration::from_millis(5))
            .build()
            .unwrap();
        let harness = Harness::new(config, HostRuntime::new(HostMode::Serialized));

        let first = harness.run().unwrap();
        let second = harness.run().unwrap();

        assert_eq!(first.profile(), second.profile());
        assert_eq!(first.profile(), harness.profile());

        let first_phases: Vec<_> = first.phases().iter().map(|m| m.phase()).collect();
        let second_phases: Vec<_> = second.phases().iter().map(|m| m.phase()).collect();
        assert_eq!(first_phases, second_phases);

        let subjects = |report: &par_scaling::BenchmarkReport| -> Vec<Subject> {
            report.verdicts().iter().map(|v| v.subject()).collect()
        };
        assert_eq!(subjects(&first), subjects(&second));
    });
}

#[cfg_attr(miri, ignore)]
#[test]
fn legacy_host_assumes_conservative_lock_state() {
    with_watchdog(|| {
        let config = BenchmarkConfig::builder()
            .task_count(2)
            .task_size(500)
            .thread_count(2)
            .skip_io(true)
            .build()
            .unwrap();
        let harness = Harness::new(config, HostRuntime::new(HostMode::Legacy));

        let profile = harness.profile();
        assert!(profile.lock_active());
        assert!(!profile.lock_removable());
        assert_eq!(profile.lock_source(), LockStateSource::Assumed);

        let report = harness.run().unwrap();

        // Neither the overhead nor the extension verdict applies to a locked legacy build.
        let subjects: Vec<_> = report.verdicts().iter().map(|v| v.subject()).collect();
        assert_eq!(subjects, [Subject::OrdinaryCompute, Subject::BestCaseCompute]);
    });
}

#[test]
fn zero_tasks_is_a_configuration_error() {
    let error = BenchmarkConfig::builder().task_count(0).build().unwrap_err();
    assert_eq!(error, ConfigError::ZeroTaskCount);

    let error: Error = error.into();
    assert!(matches!(error, Error::Config(ConfigError::ZeroTaskCount)));
}

#[cfg_attr(miri, ignore)]
#[test]
fn pooled_run_reports_first_failure() {
    with_watchdog(|| {
        let attempts = Arc::new(AtomicUsize::new(0));

        let task = Arc::new({
            let attempts = Arc::clone(&attempts);
            move || -> Result<(), TaskError> {
                if attempts.fetch_add(1, Ordering::Relaxed) == 3 {
                    return Err(TaskError::Failed("fourth invocation".to_string()));
                }

                Ok(())
            }
        });

        let error = run_pooled(&task, nz(100), nz(4)).unwrap_err();

        assert!(matches!(
            error,
            ExecutionError::Task(TaskError::Failed(ref message)) if message == "fourth invocation"
        ));
    });
}

#[test]
fn sequential_run_counts_every_invocation() {
    let calls = AtomicUsize::new(0);
    let task = || -> Result<(), TaskError> {
        calls.fetch_add(1, Ordering::Relaxed);
        Ok(())
    };

    let timing = run_sequential(&task, nz(7)).unwrap();

    assert_eq!(timing.completed(), 7);
    assert_eq!(calls.load(Ordering::Relaxed), 7);
}
