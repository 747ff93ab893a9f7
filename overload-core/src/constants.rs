use std::time::Duration;

/// Wall-clock budget of every step, baseline included.
pub const ITERATION_DURATION: Duration = Duration::from_secs(60);

/// Worker count used to gate the ramp.
pub const BASELINE_WORKERS: usize = 1;

/// Worker count of the first ramp step.
pub const RAMP_BASE_WORKERS: usize = 50;

/// Multiplier applied to the worker count between ramp steps.
pub const RAMP_GROWTH_FACTOR: usize = 2;

/// Number of ramp steps run after a successful baseline.
pub const RAMP_STEPS: usize = 4;

/// Smallest growth factor that still explores materially higher concurrency.
pub const MIN_GROWTH_FACTOR: usize = 2;
