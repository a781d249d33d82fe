//! Human-readable rendering of a [`BenchmarkReport`].
//!
//! Rendering only formats; printing is left to the caller.

use std::fmt;

use crate::{BenchmarkReport, Classification, PhaseMeasurement, RuntimeProfile, Subject, Verdict};

const RULE_WIDTH: usize = 70;

/// Formats a report as plain text when displayed.
///
/// # Examples
///
/// ```
/// use par_scaling::{BenchmarkConfig, Harness, HostRuntime, ReportText};
///
/// let config = BenchmarkConfig::builder()
///     .task_count(2)
///     .task_size(100)
///     .thread_count(2)
///     .skip_best_case(true)
///     .skip_io(true)
///     .build()
///     .unwrap();
///
/// let report = Harness::new(config, HostRuntime::default()).run().unwrap();
/// let text = ReportText::new(&report).to_string();
///
/// assert!(text.contains("ORDINARY COMPUTE"));
/// ```
#[derive(Debug)]
pub struct ReportText<'a> {
    report: &'a BenchmarkReport,
}

impl<'a> ReportText<'a> {
    /// Wraps a report for display.
    #[must_use]
    pub fn new(report: &'a BenchmarkReport) -> Self {
        Self { report }
    }
}

impl fmt::Display for ReportText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_profile(f, self.report.profile())?;

        let phase_count = self.report.phases().len();
        for (index, measurement) in self.report.phases().iter().enumerate() {
            write_phase(f, index + 1, phase_count, measurement)?;
        }

        writeln!(f)?;
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(f, "ANALYSIS & EXPECTED RANGES")?;
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;

        for verdict in self.report.verdicts() {
            write_verdict(f, verdict)?;
        }

        Ok(())
    }
}

fn write_profile(f: &mut fmt::Formatter<'_>, profile: &RuntimeProfile) -> fmt::Result {
    writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(f, "Threading scaling benchmark")?;
    writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(f, "Lock-removable build : {}", profile.lock_removable())?;
    writeln!(
        f,
        "Lock active at run   : {} ({})",
        profile.lock_active(),
        profile.lock_source()
    )?;
    writeln!(f, "Cores detected       : {}", profile.core_count())?;
    writeln!(f, "Threads              : {}", profile.thread_count())?;
    writeln!(f, "{}", "-".repeat(RULE_WIDTH))
}

fn write_phase(
    f: &mut fmt::Formatter<'_>,
    number: usize,
    total: usize,
    measurement: &PhaseMeasurement,
) -> fmt::Result {
    writeln!(f)?;
    writeln!(
        f,
        "[{number}/{total}] {} WORKLOAD ({})",
        measurement.phase().to_string().to_uppercase(),
        measurement.sequential().kind()
    )?;
    writeln!(f, "{}", "-".repeat(RULE_WIDTH))?;
    writeln!(
        f,
        "Single-thread time      : {:.3} s",
        measurement.sequential().elapsed().as_secs_f64()
    )?;
    writeln!(
        f,
        "Multi-thread time       : {:.3} s",
        measurement.pooled().elapsed().as_secs_f64()
    )?;
    writeln!(
        f,
        "Speedup (single / multi): {:.2}x",
        measurement.speedup().speedup()
    )
}

fn write_verdict(f: &mut fmt::Formatter<'_>, verdict: &Verdict) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{}", verdict.subject().to_string().to_uppercase())?;

    match verdict.subject() {
        Subject::SingleThreadOverhead => {
            writeln!(f, "   Single-thread time: {:.3} s", verdict.observed())?;
        }
        Subject::ExtensionCompatibility => {
            writeln!(f, "   Ordinary / best-case ratio: {:.2}", verdict.observed())?;
        }
        _ => {
            writeln!(f, "   Speedup: {:.2}x", verdict.observed())?;
        }
    }

    if let Some(band) = verdict.band() {
        match band.upper {
            Some(upper) => writeln!(f, "   Expected: {:.2} to {:.2}", band.lower, upper)?,
            None => writeln!(f, "   Expected: at least {:.2}", band.lower)?,
        }
    }

    writeln!(
        f,
        "   {} {}: {}",
        marker(verdict.classification()),
        verdict.classification().to_string().to_uppercase(),
        explanation(verdict)
    )
}

fn marker(classification: Classification) -> &'static str {
    match classification {
        Classification::Excellent
        | Classification::Good
        | Classification::Expected
        | Classification::Informational => "ok",
        _ => "!!",
    }
}

fn explanation(verdict: &Verdict) -> &'static str {
    match (verdict.subject(), verdict.classification()) {
        (Subject::OrdinaryCompute, Classification::Excellent) => "threads run truly in parallel",
        (Subject::OrdinaryCompute, Classification::Approaching) => {
            "approaching the range expected without the execution lock"
        }
        (Subject::OrdinaryCompute, Classification::Expected) => {
            "limited speedup is expected while the execution lock is active"
        }
        (Subject::OrdinaryCompute, Classification::UnexpectedHigh) => {
            "higher speedup than an active execution lock should allow"
        }
        (Subject::BestCaseCompute, Classification::Excellent) => "near-linear scaling",
        (Subject::BestCaseCompute, Classification::Good) => "strong scaling",
        (Subject::BestCaseCompute, Classification::LimitedByLock) => {
            "the execution lock prevents true parallelism"
        }
        (Subject::IoBound, Classification::Expected) => {
            "blocking tasks scale regardless of the execution lock"
        }
        (Subject::IoBound, Classification::Unexpected) => {
            "blocking tasks should scale regardless of the execution lock"
        }
        (Subject::SingleThreadOverhead, _) => {
            "compare with a build that cannot remove the execution lock"
        }
        (Subject::ExtensionCompatibility, Classification::Good) => {
            "ordinary compute scales close to the best case"
        }
        (Subject::ExtensionCompatibility, Classification::Warning) => {
            "ordinary compute scales much worse than the best case; a dependency may serialize it"
        }
        _ => "speedup is below the expected range",
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use new_zealand::nz;

    use super::*;
    use crate::measure::result_for_tests;
    use crate::{ExecutionMode, LockState, Phase, WorkloadKind, analyze};

    fn report_text(lock: LockState) -> String {
        let profile = RuntimeProfile::new(lock, nz!(4), nz!(4));

        let sequential = result_for_tests(
            WorkloadKind::ComputeFloat,
            ExecutionMode::Sequential,
            nz!(8),
            Duration::from_secs(3),
        );
        let pooled = result_for_tests(
            WorkloadKind::ComputeFloat,
            ExecutionMode::Pooled,
            nz!(8),
            Duration::from_secs(1),
        );
        let phases =
            vec![PhaseMeasurement::new(Phase::OrdinaryCompute, sequential, pooled).unwrap()];
        let verdicts = analyze(&profile, &phases);

        let report = BenchmarkReport::for_tests(profile, phases, verdicts);
        ReportText::new(&report).to_string()
    }

    #[test]
    fn renders_phases_and_verdicts() {
        let text = report_text(LockState {
            active: false,
            removable: true,
        });

        assert!(text.contains("[1/1] ORDINARY COMPUTE WORKLOAD (compute-float)"));
        assert!(text.contains("Single-thread time      : 3.000 s"));
        assert!(text.contains("Speedup (single / multi): 3.00x"));
        assert!(text.contains("ORDINARY COMPUTE SPEEDUP"));
        assert!(text.contains("Expected: 2.00 to 5.00"));
        assert!(text.contains("ok EXCELLENT"));
        assert!(text.contains("SINGLE-THREAD OVERHEAD"));
    }

    #[test]
    fn renders_unexpected_results_with_marker() {
        let text = report_text(LockState::CONSERVATIVE);

        assert!(text.contains("!! UNEXPECTED HIGH"));
        assert!(!text.contains("SINGLE-THREAD OVERHEAD"));
    }
}
