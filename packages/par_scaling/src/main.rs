#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]

//! Binary entry point for the par_scaling benchmark.
//!
//! This module is excluded from mutation testing because testing process entry/exit behavior
//! is impractical - it requires spawning subprocesses and checking exit codes.

use std::process::ExitCode;
use std::time::Duration;

use argh::FromArgs;
use par_scaling::{BenchmarkConfig, Harness, HostMode, HostRuntime, ReportText};
use tracing_subscriber::EnvFilter;

/// Benchmark compute-bound and I/O-bound multithreading to see whether threads truly run in
/// parallel.
#[derive(Debug, FromArgs)]
struct Args {
    /// number of tasks to run per measurement (default: 32)
    #[argh(option, default = "32")]
    tasks: usize,

    /// work per compute task, as a loop upper bound (default: 200000)
    #[argh(option, default = "200_000")]
    task_size: u64,

    /// number of threads for pooled runs (default: detected core count)
    #[argh(option)]
    threads: Option<usize>,

    /// duration of each I/O task in milliseconds (default: 50)
    #[argh(option, default = "50")]
    io_duration: u64,

    /// skip the I/O-bound workload
    #[argh(switch)]
    skip_io: bool,

    /// skip the best-case hashing workload
    #[argh(switch)]
    skip_best_case: bool,

    /// host runtime to execute workloads under (native, serialized, legacy; default: native)
    #[argh(option, default = "HostMode::Native")]
    runtime: HostMode,
}

// Binary entry point - mutations would require subprocess testing which is impractical.
#[cfg_attr(test, mutants::skip)]
fn main() -> ExitCode {
    let args: Args = argh::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut builder = BenchmarkConfig::builder()
        .task_count(args.tasks)
        .task_size(args.task_size)
        .io_duration(Duration::from_millis(args.io_duration))
        .skip_io(args.skip_io)
        .skip_best_case(args.skip_best_case);

    if let Some(threads) = args.threads {
        builder = builder.thread_count(threads);
    }

    let config = match builder.build() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let harness = Harness::new(config, HostRuntime::new(args.runtime));

    match harness.run() {
        Ok(report) => {
            print!("{}", ReportText::new(&report));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_flags() {
        let args = Args::from_args(&["par_scaling"], &[]).unwrap();

        assert_eq!(args.tasks, 32);
        assert_eq!(args.task_size, 200_000);
        assert_eq!(args.threads, None);
        assert_eq!(args.io_duration, 50);
        assert!(!args.skip_io);
        assert!(!args.skip_best_case);
        assert_eq!(args.runtime, HostMode::Native);
    }

    #[test]
    fn parses_every_flag() {
        let args = Args::from_args(
            &["par_scaling"],
            &[
                "--tasks",
                "8",
                "--task-size",
                "1000",
                "--threads",
                "4",
                "--io-duration",
                "20",
                "--skip-io",
                "--skip-best-case",
                "--runtime",
                "Serialized",
            ],
        )
        .unwrap();

        assert_eq!(args.tasks, 8);
        assert_eq!(args.task_size, 1_000);
        assert_eq!(args.threads, Some(4));
        assert_eq!(args.io_duration, 20);
        assert!(args.skip_io);
        assert!(args.skip_best_case);
        assert_eq!(args.runtime, HostMode::Serialized);
    }

    #[test]
    fn rejects_unknown_runtime() {
        Args::from_args(&["par_scaling"], &["--runtime", "gil"]).unwrap_err();
    }
}
