use crate::ExecutionError;
use std::fmt;
use std::time::Duration;

/// Latency summary over a set of successful executions, plus an optional terminal error.
///
/// With `count == 0` the `avg` and `max` are zero and `min` holds the `Duration::MAX`
/// sentinel. Otherwise `min <= avg <= max`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionStats {
    pub min: Duration,
    pub avg: Duration,
    pub max: Duration,
    pub count: u64,
    pub error: Option<ExecutionError>,
}

impl ExecutionStats {
    /// Stats of a worker that never completed an execution.
    pub fn empty() -> Self {
        Self {
            min: Duration::MAX,
            avg: Duration::ZERO,
            max: Duration::ZERO,
            count: 0,
            error: None,
        }
    }

    /// Stats of a worker that aborted on an error. Any partial measurements are discarded.
    pub fn failed(error: ExecutionError) -> Self {
        Self {
            error: Some(error),
            ..Self::empty()
        }
    }

    /// Build stats from a single worker's raw totals.
    pub fn from_totals(count: u64, sum: Duration, min: Duration, max: Duration) -> Self {
        if count == 0 {
            return Self::empty();
        }

        Self {
            min,
            avg: div_duration(sum.as_nanos(), count),
            max,
            count,
            error: None,
        }
    }

    /// Merge per-worker stats into one combined value.
    ///
    /// The combined average is weighted by each worker's count, the extremes are the true
    /// extremes across workers, and every worker error is kept.
    pub fn merge<'a, I>(stats: I) -> Self
    where
        I: IntoIterator<Item = &'a ExecutionStats>,
    {
        let mut count: u64 = 0;
        let mut weighted_nanos: u128 = 0;
        let mut min = Duration::MAX;
        let mut max = Duration::ZERO;
        let mut errors = vec![];

        for stat in stats {
            if let Some(error) = &stat.error {
                errors.push(error.clone());
            }

            if stat.count == 0 {
                continue;
            }

            count += stat.count;
            weighted_nanos += stat.avg.as_nanos() * stat.count as u128;
            min = min.min(stat.min);
            max = max.max(stat.max);
        }

        let error = ExecutionError::join(errors);
        if count == 0 {
            return Self {
                error,
                ..Self::empty()
            };
        }

        Self {
            min,
            avg: div_duration(weighted_nanos, count),
            max,
            count,
            error,
        }
    }

    /// The fastest execution, if any completed.
    pub fn min(&self) -> Option<Duration> {
        (self.count > 0).then_some(self.min)
    }

    /// No execution completed and nothing failed: the budget ran out first.
    pub fn is_timeout(&self) -> bool {
        self.error.is_none() && (self.count == 0 || self.avg.is_zero())
    }

    /// Anything short of at least one measured, error-free execution.
    pub fn is_failed(&self) -> bool {
        self.error.is_some() || self.count == 0 || self.avg.is_zero()
    }

    /// Per-connection statement rate implied by the average latency.
    pub fn qps(&self) -> f64 {
        if self.avg.is_zero() {
            0.
        } else {
            1. / self.avg.as_secs_f64()
        }
    }
}

impl Default for ExecutionStats {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for ExecutionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.min() {
            Some(min) => write!(
                f,
                "count={}, min={:?}, avg={:?}, max={:?}",
                self.count, min, self.avg, self.max
            )?,
            None => write!(f, "count=0")?,
        }

        if let Some(error) = &self.error {
            write!(f, ", error={error}")?;
        }
        Ok(())
    }
}

fn div_duration(nanos: u128, count: u64) -> Duration {
    let avg = nanos / count as u128;
    Duration::from_nanos(avg.min(u64::MAX as u128) as u64)
}

/// Running min/max/sum/count of one worker's execution latencies.
#[derive(Debug, Clone)]
pub struct LatencyRecorder {
    min: Duration,
    max: Duration,
    sum: Duration,
    count: u64,
}

impl LatencyRecorder {
    pub fn new() -> Self {
        Self {
            min: Duration::MAX,
            max: Duration::ZERO,
            sum: Duration::ZERO,
            count: 0,
        }
    }

    pub fn record(&mut self, elapsed: Duration) {
        self.count += 1;
        self.min = self.min.min(elapsed);
        self.max = self.max.max(elapsed);
        self.sum = self.sum.saturating_add(elapsed);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn finish(self) -> ExecutionStats {
        ExecutionStats::from_totals(self.count, self.sum, self.min, self.max)
    }
}

impl Default for LatencyRecorder {
    fn default() -> Self {
        Self::new()
    }
}
