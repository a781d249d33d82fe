#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for testing par_scaling.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Two `f64` values closer than this are considered equal by [`approx_eq()`].
pub const F64_TOLERANCE: f64 = 1e-6;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const MIRI_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs a test with a timeout to prevent infinite hangs.
///
/// The timeout is 10 seconds under normal conditions and 60 seconds under Miri, where
/// thread synchronization primitives are significantly slower. Tests that deliberately
/// run long workloads can use [`with_watchdog_timeout()`] instead.
///
/// When the `MUTATION_TESTING` environment variable is set to "1", the watchdog
/// is disabled and the test function is executed directly. This allows mutation
/// testing to properly detect hanging mutations.
///
/// # Panics
///
/// Panics if the test exceeds the timeout (when not in mutation testing mode).
///
/// # Example
///
/// ```rust
/// use testing::with_watchdog;
///
/// with_watchdog(|| {
///     assert_eq!(2 + 2, 4);
/// });
/// ```
pub fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let timeout = if cfg!(miri) {
        MIRI_TIMEOUT
    } else {
        DEFAULT_TIMEOUT
    };

    with_watchdog_timeout(timeout, test_fn)
}

/// Runs a test with a custom timeout to prevent infinite hangs.
///
/// Behaves like [`with_watchdog()`] in every other respect.
///
/// # Panics
///
/// Panics if the test exceeds `timeout` (when not in mutation testing mode).
pub fn with_watchdog_timeout<F, R>(timeout: Duration, test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if std::env::var("MUTATION_TESTING").as_deref() == Ok("1") {
        return test_fn();
    }

    let (tx, rx) = mpsc::channel();

    let test_handle = thread::spawn(move || {
        let result = test_fn();
        // If this fails, the receiver has timed out.
        drop(tx.send(result));
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            test_handle.join().expect("Test thread should not panic");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("Test exceeded {timeout:?} timeout");
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            // Thread panicked, join it to get the panic.
            match test_handle.join() {
                Ok(()) => panic!("Test thread disconnected unexpectedly"),
                Err(e) => std::panic::resume_unwind(e),
            }
        }
    }
}

/// Whether two `f64` values differ by no more than [`F64_TOLERANCE`].
///
/// This is a "correctly performed" floating point equality comparison.
#[must_use]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= F64_TOLERANCE
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn watchdog_returns_correct_value() {
        let result = with_watchdog(|| "hello world");
        assert_eq!(result, "hello world");
    }

    #[test]
    fn watchdog_with_custom_timeout() {
        let result = with_watchdog_timeout(Duration::from_secs(30), || 42);
        assert_eq!(result, 42);
    }

    #[test]
    #[should_panic]
    fn watchdog_propagates_panic() {
        with_watchdog(|| panic!("boom"));
    }

    #[test]
    fn approx_eq_tolerates_rounding() {
        assert!(approx_eq(0.1 + 0.2, 0.3));
        assert!(approx_eq(1.0, 1.0));
        assert!(!approx_eq(1.0, 1.001));
    }
}
