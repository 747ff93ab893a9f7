use crate::{
    ConfigError, BASELINE_WORKERS, ITERATION_DURATION, MIN_GROWTH_FACTOR, RAMP_BASE_WORKERS,
    RAMP_GROWTH_FACTOR, RAMP_STEPS,
};
#[cfg(feature = "rt")]
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parameters of a concurrency ramp.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "rt", derive(Serialize, Deserialize))]
pub struct RampConfig {
    /// Budget of every step, applied to each worker as a shared deadline.
    pub duration: Duration,
    /// Worker count of the first ramp step.
    pub base_workers: usize,
    /// Multiplier between consecutive ramp steps.
    pub growth: usize,
    /// Number of ramp steps after the baseline.
    pub steps: usize,
    /// End the ramp at the first failed or timed-out ramp step.
    pub stop_on_failure: bool,
}

impl RampConfig {
    pub fn new() -> Self {
        Self {
            duration: ITERATION_DURATION,
            base_workers: RAMP_BASE_WORKERS,
            growth: RAMP_GROWTH_FACTOR,
            steps: RAMP_STEPS,
            stop_on_failure: false,
        }
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn base_workers(mut self, base_workers: usize) -> Self {
        self.base_workers = base_workers;
        self
    }

    pub fn growth(mut self, growth: usize) -> Self {
        self.growth = growth;
        self
    }

    pub fn steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn stop_on_failure(mut self, stop_on_failure: bool) -> Self {
        self.stop_on_failure = stop_on_failure;
        self
    }

    pub fn baseline_workers(&self) -> usize {
        BASELINE_WORKERS
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration.is_zero() {
            return Err(ConfigError::ZeroDuration);
        }
        if self.base_workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.growth < MIN_GROWTH_FACTOR {
            return Err(ConfigError::GrowthTooSmall {
                min: MIN_GROWTH_FACTOR,
                got: self.growth,
            });
        }
        if self.steps == 0 {
            return Err(ConfigError::NoSteps);
        }
        self.worker_schedule().map(|_| ())
    }

    /// Worker count of every ramp step, in order.
    pub fn worker_schedule(&self) -> Result<Vec<usize>, ConfigError> {
        // Any growth of at least 2 overflows long before this many steps.
        let mut schedule = Vec::with_capacity(self.steps.min(usize::BITS as usize));
        let mut workers = self.base_workers;
        for step in 0..self.steps {
            if step > 0 {
                workers = workers
                    .checked_mul(self.growth)
                    .ok_or(ConfigError::Overflow(step))?;
            }
            schedule.push(workers);
        }
        Ok(schedule)
    }
}

impl Default for RampConfig {
    fn default() -> Self {
        Self::new()
    }
}
