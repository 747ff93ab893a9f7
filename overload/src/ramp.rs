use crate::cancel::CancelSignal;
use crate::fan_out::FanOutRunner;
use crate::hooks;
use overload_core::{
    ConfigError, Connector, ExecutionStats, Query, RampConfig, RampPhase, RampStep, RunResult,
};
use std::sync::Arc;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

/// Drives one query through the baseline and the concurrency ramp.
pub struct RampController<C> {
    runner: FanOutRunner<C>,
    config: RampConfig,
    schedule: Vec<usize>,
    cancel: CancelSignal,
}

impl<C> RampController<C>
where
    C: Connector + 'static,
{
    pub fn new(connector: C, config: RampConfig) -> Result<Self, ConfigError> {
        Self::with_cancel(Arc::new(connector), config, CancelSignal::never())
    }

    /// Share a connector and stop early once `cancel` fires.
    pub fn with_cancel(
        connector: Arc<C>,
        config: RampConfig,
        cancel: CancelSignal,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let schedule = config.worker_schedule()?;
        hooks::describe();

        Ok(Self {
            runner: FanOutRunner::new(connector, cancel.clone()),
            config,
            schedule,
            cancel,
        })
    }

    pub fn config(&self) -> &RampConfig {
        &self.config
    }

    /// Worker count of every ramp step after the baseline.
    pub fn schedule(&self) -> &[usize] {
        &self.schedule
    }

    pub async fn run(&self, query: &Query) -> RampReport {
        self.run_with(query, |_| {}).await
    }

    /// Run the ramp, handing every finished step to `on_step` before moving on.
    #[instrument(name = "ramp", skip_all, fields(query = %query))]
    pub async fn run_with<F>(&self, query: &Query, mut on_step: F) -> RampReport
    where
        F: FnMut(&RampStep) + Send,
    {
        let mut steps: Vec<RampStep> = Vec::with_capacity(self.schedule.len() + 1);
        let mut state = State::Baseline;

        loop {
            state = match state {
                State::Baseline => {
                    let step = self
                        .step(RampPhase::Baseline, self.config.baseline_workers(), query)
                        .await;

                    let next = if step.stats.error.is_some() {
                        warn!("Baseline failed; not ramping.");
                        State::Done
                    } else if step.stats.is_timeout() {
                        warn!("Baseline never completed an execution; not ramping.");
                        State::Done
                    } else {
                        State::Ramping(0)
                    };

                    on_step(&step);
                    steps.push(step);
                    next
                }
                State::Ramping(idx) if idx < self.schedule.len() => {
                    if self.cancel.is_cancelled() {
                        info!("Cancelled; skipping remaining ramp steps.");
                        State::Done
                    } else {
                        let step = self
                            .step(RampPhase::Ramp(idx + 1), self.schedule[idx], query)
                            .await;
                        let failed = step.stats.is_failed();

                        on_step(&step);
                        steps.push(step);

                        if failed && self.config.stop_on_failure {
                            warn!("Ramp step {} failed; stopping.", idx + 1);
                            State::Done
                        } else {
                            State::Ramping(idx + 1)
                        }
                    }
                }
                State::Ramping(_) => State::Done,
                State::Done => break,
            };
        }

        let stats = steps
            .last()
            .map(|step| step.stats.clone())
            .unwrap_or_default();

        info!("Ramp complete after {} steps: {stats}", steps.len());
        RampReport {
            query: query.clone(),
            steps,
            stats,
        }
    }

    async fn step(&self, phase: RampPhase, workers: usize, query: &Query) -> RampStep {
        debug!("Starting {phase} with {workers} workers");
        let results = self.runner.run(workers, query, self.config.duration).await;
        let stats = ExecutionStats::merge(&results);

        if let Some(error) = &stats.error {
            warn!(
                "{phase} ({workers} workers): {} executions, {} failed workers: {error}",
                stats.count,
                error.error_count()
            );
        } else {
            info!("{phase} ({workers} workers): {stats}");
        }

        RampStep {
            phase,
            worker_count: workers,
            duration: self.config.duration,
            stats,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum State {
    Baseline,
    Ramping(usize),
    Done,
}

/// Every step of one query's ramp plus the final aggregate.
#[derive(Debug, Clone)]
pub struct RampReport {
    pub query: Query,
    pub steps: Vec<RampStep>,
    /// Aggregate of the last step that ran.
    pub stats: ExecutionStats,
}

impl RampReport {
    pub fn worker_counts(&self) -> Vec<usize> {
        self.steps.iter().map(|step| step.worker_count).collect()
    }

    pub fn results(&self) -> Vec<RunResult> {
        self.steps.iter().map(|step| step.result(&self.query)).collect()
    }

    /// Reporting record of the final step.
    pub fn result(&self) -> RunResult {
        let workers = self.steps.last().map(|step| step.worker_count).unwrap_or(0);
        RunResult::new(&self.query, workers, &self.stats)
    }
}
