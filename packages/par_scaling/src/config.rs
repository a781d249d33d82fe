use std::num::NonZero;
use std::time::Duration;

use new_zealand::nz;

use crate::ConfigError;

const DEFAULT_TASK_COUNT: NonZero<usize> = nz!(32);
const DEFAULT_TASK_SIZE: u64 = 200_000;
const DEFAULT_IO_DURATION: Duration = Duration::from_millis(50);

/// Validated settings of one benchmark session.
///
/// A `BenchmarkConfig` can only be obtained through [`BenchmarkConfig::builder()`] or
/// [`Default`], both of which guarantee that the counts are usable.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use par_scaling::BenchmarkConfig;
///
/// let config = BenchmarkConfig::builder()
///     .task_count(8)
///     .thread_count(4)
///     .io_duration(Duration::from_millis(10))
///     .skip_best_case(true)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.task_count().get(), 8);
/// assert_eq!(config.thread_count().map(|t| t.get()), Some(4));
///
/// assert!(BenchmarkConfig::builder().task_count(0).build().is_err());
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BenchmarkConfig {
    task_count: NonZero<usize>,
    task_size: u64,
    thread_count: Option<NonZero<usize>>,
    io_duration: Duration,
    skip_best_case: bool,
    skip_io: bool,
}

impl BenchmarkConfig {
    /// Creates a builder starting from the default settings.
    #[must_use]
    pub fn builder() -> BenchmarkConfigBuilder {
        BenchmarkConfigBuilder::new()
    }

    /// Tasks executed by every sequential and pooled run.
    #[must_use]
    pub fn task_count(&self) -> NonZero<usize> {
        self.task_count
    }

    /// Size of each ordinary compute task. The best-case phase uses a tenth of it.
    #[must_use]
    pub fn task_size(&self) -> u64 {
        self.task_size
    }

    /// Explicit worker thread count, or `None` to use one thread per detected core.
    #[must_use]
    pub fn thread_count(&self) -> Option<NonZero<usize>> {
        self.thread_count
    }

    /// How long each I/O task blocks.
    #[must_use]
    pub fn io_duration(&self) -> Duration {
        self.io_duration
    }

    /// Whether the best-case compute phase is skipped.
    #[must_use]
    pub fn skip_best_case(&self) -> bool {
        self.skip_best_case
    }

    /// Whether the I/O phase is skipped.
    #[must_use]
    pub fn skip_io(&self) -> bool {
        self.skip_io
    }
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            task_count: DEFAULT_TASK_COUNT,
            task_size: DEFAULT_TASK_SIZE,
            thread_count: None,
            io_duration: DEFAULT_IO_DURATION,
            skip_best_case: false,
            skip_io: false,
        }
    }
}

/// Builder for a [`BenchmarkConfig`].
///
/// Values are checked only in [`build()`](Self::build), so setters can be called in any order.
#[derive(Clone, Copy, Debug)]
pub struct BenchmarkConfigBuilder {
    task_count: usize,
    task_size: u64,
    thread_count: Option<usize>,
    io_duration: Duration,
    skip_best_case: bool,
    skip_io: bool,
}

impl BenchmarkConfigBuilder {
    fn new() -> Self {
        let defaults = BenchmarkConfig::default();

        Self {
            task_count: defaults.task_count.get(),
            task_size: defaults.task_size,
            thread_count: None,
            io_duration: defaults.io_duration,
            skip_best_case: defaults.skip_best_case,
            skip_io: defaults.skip_io,
        }
    }

    /// Sets how many tasks every run executes.
    ///
    /// Default is 32.
    #[must_use]
    pub fn task_count(mut self, count: usize) -> Self {
        self.task_count = count;
        self
    }

    /// Sets the ordinary compute task size.
    ///
    /// Default is 200000.
    #[must_use]
    pub fn task_size(mut self, size: u64) -> Self {
        self.task_size = size;
        self
    }

    /// Sets the worker thread count for pooled runs.
    ///
    /// Default is one thread per detected core.
    #[must_use]
    pub fn thread_count(mut self, count: usize) -> Self {
        self.thread_count = Some(count);
        self
    }

    /// Sets how long each I/O task blocks.
    ///
    /// Default is 50 milliseconds.
    #[must_use]
    pub fn io_duration(mut self, duration: Duration) -> Self {
        self.io_duration = duration;
        self
    }

    /// Sets whether to skip the best-case compute phase.
    #[must_use]
    pub fn skip_best_case(mut self, skip: bool) -> Self {
        self.skip_best_case = skip;
        self
    }

    /// Sets whether to skip the I/O phase.
    #[must_use]
    pub fn skip_io(mut self, skip: bool) -> Self {
        self.skip_io = skip;
        self
    }

    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroTaskCount`] or [`ConfigError::ZeroThreadCount`] if a count is
    /// zero.
    pub fn build(self) -> Result<BenchmarkConfig, ConfigError> {
        let task_count = NonZero::new(self.task_count).ok_or(ConfigError::ZeroTaskCount)?;

        let thread_count = self
            .thread_count
            .map(|count| NonZero::new(count).ok_or(ConfigError::ZeroThreadCount))
            .transpose()?;

        Ok(BenchmarkConfig {
            task_count,
            task_size: self.task_size,
            thread_count,
            io_duration: self.io_duration,
            skip_best_case: self.skip_best_case,
            skip_io: self.skip_io,
        })
    }
}
