use crate::cancel::CancelSignal;
use crate::measurer::SingleWorkerMeasurer;
use overload_core::{Connector, ExecutionError, ExecutionStats, Query};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
#[allow(unused)]
use tracing::{debug, error, info, info_span, trace, warn, Instrument};

/// Runs `n` workers against the same deadline and waits for every one of them.
pub struct FanOutRunner<C> {
    connector: Arc<C>,
    cancel: CancelSignal,
}

impl<C> FanOutRunner<C>
where
    C: Connector + 'static,
{
    pub fn new(connector: Arc<C>, cancel: CancelSignal) -> Self {
        Self { connector, cancel }
    }

    /// Measure `query` with `workers` concurrent connections for `duration`.
    ///
    /// Always yields exactly `workers` results, in no particular order.
    pub async fn run(
        &self,
        workers: usize,
        query: &Query,
        duration: Duration,
    ) -> Vec<ExecutionStats> {
        let deadline = Instant::now() + duration;
        let query = Arc::new(query.clone());

        let mut set = WorkerSet::with_capacity(workers);
        for idx in 0..workers {
            let measurer = SingleWorkerMeasurer::new(
                self.connector.clone(),
                query.clone(),
                deadline,
                self.cancel.clone(),
            );
            set.spawn(measurer.run().instrument(info_span!("worker", worker = idx)));
        }

        let results = set.join_all().await;
        debug!("Collected {} worker results.", results.len());
        results
    }
}

/// Worker tasks of one step. Tasks still running when the set is dropped are aborted.
struct WorkerSet {
    tasks: Vec<JoinHandle<ExecutionStats>>,
}

impl WorkerSet {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            tasks: Vec::with_capacity(capacity),
        }
    }

    fn spawn<F>(&mut self, fut: F)
    where
        F: std::future::Future<Output = ExecutionStats> + Send + 'static,
    {
        self.tasks.push(tokio::spawn(fut));
    }

    async fn join_all(mut self) -> Vec<ExecutionStats> {
        let mut results = Vec::with_capacity(self.tasks.len());
        for (idx, task) in self.tasks.iter_mut().enumerate() {
            let stats = match task.await {
                Ok(stats) => stats,
                Err(err) => {
                    error!("Worker {idx} did not finish: {err}");
                    ExecutionStats::failed(ExecutionError::Worker(err.to_string()))
                }
            };
            results.push(stats);
        }
        self.tasks.clear();
        results
    }
}

impl Drop for WorkerSet {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
