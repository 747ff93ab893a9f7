//! Metrics emitted while statements execute. No-ops without the `metrics` feature.
use std::time::Duration;

#[cfg(feature = "metrics")]
const LATENCY: &str = "overload_statement_latency";
#[cfg(feature = "metrics")]
const SUCCESS: &str = "overload_statement_success";
#[cfg(feature = "metrics")]
const ERROR: &str = "overload_statement_error";
#[cfg(feature = "metrics")]
const ACTIVE_WORKERS: &str = "overload_active_workers";

pub(crate) fn describe() {
    #[cfg(feature = "metrics")]
    {
        ::metrics::describe_histogram!(
            LATENCY,
            ::metrics::Unit::Nanoseconds,
            "Latency of successful statement executions"
        );
        ::metrics::describe_counter!(SUCCESS, "Successful statement executions");
        ::metrics::describe_counter!(ERROR, "Failed statement executions");
        ::metrics::describe_gauge!(ACTIVE_WORKERS, "Workers currently measuring");
    }
}

#[allow(unused_variables)]
pub(crate) fn record_success(elapsed: Duration) {
    #[cfg(feature = "metrics")]
    {
        ::metrics::histogram!(LATENCY).record(elapsed.as_nanos() as f64);
        ::metrics::counter!(SUCCESS).increment(1);
    }
}

pub(crate) fn record_error() {
    #[cfg(feature = "metrics")]
    ::metrics::counter!(ERROR).increment(1);
}

/// Counts a worker as active until dropped.
pub(crate) struct ActiveWorker(());

impl ActiveWorker {
    pub fn enter() -> Self {
        #[cfg(feature = "metrics")]
        ::metrics::gauge!(ACTIVE_WORKERS).increment(1.);
        Self(())
    }
}

impl Drop for ActiveWorker {
    fn drop(&mut self) {
        #[cfg(feature = "metrics")]
        ::metrics::gauge!(ACTIVE_WORKERS).decrement(1.);
    }
}
