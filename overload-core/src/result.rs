use crate::{ExecutionStats, Query};
#[cfg(feature = "rt")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Where in the ramp a step ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "rt", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "rt", serde(rename_all = "snake_case"))]
pub enum RampPhase {
    Baseline,
    /// One-based index of the ramp step.
    Ramp(usize),
}

impl fmt::Display for RampPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RampPhase::Baseline => f.write_str("baseline"),
            RampPhase::Ramp(idx) => write!(f, "ramp {idx}"),
        }
    }
}

/// One iteration of the ramp at a fixed worker count and budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RampStep {
    pub phase: RampPhase,
    pub worker_count: usize,
    pub duration: Duration,
    pub stats: ExecutionStats,
}

impl RampStep {
    pub fn result(&self, query: &Query) -> RunResult {
        RunResult::new(query, self.worker_count, &self.stats)
    }
}

/// Record handed to whoever persists results.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "rt", derive(Serialize, Deserialize))]
pub struct RunResult {
    pub query: String,
    pub is_failed: bool,
    pub qps: f64,
    pub worker_count: usize,
    pub comment: String,
    pub info: StatsInfo,
}

impl RunResult {
    pub fn new(query: &Query, worker_count: usize, stats: &ExecutionStats) -> Self {
        let comment = match &stats.error {
            Some(error) => format!("error: {error}"),
            None if stats.is_timeout() => "timeout".to_string(),
            None => "ok".to_string(),
        };

        Self {
            query: query.sql.clone(),
            is_failed: stats.is_failed(),
            qps: stats.qps(),
            worker_count,
            comment,
            info: StatsInfo::from(stats),
        }
    }
}

/// Serializable snapshot of [`ExecutionStats`], latencies in milliseconds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "rt", derive(Serialize, Deserialize))]
pub struct StatsInfo {
    pub min_ms: Option<f64>,
    pub avg_ms: f64,
    pub max_ms: f64,
    pub count: u64,
    pub error: Option<String>,
}

impl From<&ExecutionStats> for StatsInfo {
    fn from(stats: &ExecutionStats) -> Self {
        Self {
            min_ms: stats.min().map(as_millis),
            avg_ms: as_millis(stats.avg),
            max_ms: as_millis(stats.max),
            count: stats.count,
            error: stats.error.as_ref().map(ToString::to_string),
        }
    }
}

fn as_millis(dur: Duration) -> f64 {
    dur.as_secs_f64() * 1e3
}
