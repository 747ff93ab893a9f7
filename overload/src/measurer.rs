use crate::cancel::CancelSignal;
use crate::hooks;
use overload_core::{
    Connection, Connector, ExecutionError, ExecutionStats, LatencyRecorder, Query,
};
use std::error::Error as StdError;
use std::sync::Arc;
use tokio::time::{sleep_until, Instant};
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// One worker: a single connection executing the query back-to-back until its deadline.
pub struct SingleWorkerMeasurer<C> {
    connector: Arc<C>,
    query: Arc<Query>,
    deadline: Instant,
    cancel: CancelSignal,
}

impl<C: Connector> SingleWorkerMeasurer<C> {
    pub fn new(
        connector: Arc<C>,
        query: Arc<Query>,
        deadline: Instant,
        cancel: CancelSignal,
    ) -> Self {
        Self {
            connector,
            query,
            deadline,
            cancel,
        }
    }

    /// Connect, measure, and release the connection.
    pub async fn run(mut self) -> ExecutionStats {
        let _active = hooks::ActiveWorker::enter();

        if self.cancel.is_cancelled() {
            return ExecutionStats::empty();
        }

        let conn = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!("Cancelled while connecting.");
                return ExecutionStats::empty();
            }
            _ = sleep_until(self.deadline) => {
                debug!("Budget exhausted while connecting.");
                return ExecutionStats::empty();
            }
            res = self.connector.connect() => res,
        };

        let mut conn = match conn {
            Ok(conn) => conn,
            Err(err) => {
                let message = error_chain(&err);
                warn!("Failed to connect: {message}");
                return ExecutionStats::failed(ExecutionError::Connect(message));
            }
        };

        let stats = measure(&mut conn, &self.query, self.deadline, &mut self.cancel).await;
        drop(conn);
        stats
    }
}

/// Execute `query` on `conn` until `deadline` passes, cancellation is requested, or a
/// statement fails.
///
/// Running out of time abandons the in-flight statement and keeps what was measured so far.
/// A failed statement discards all measurements and reports the error instead.
pub async fn measure<T: Connection>(
    conn: &mut T,
    query: &Query,
    deadline: Instant,
    cancel: &mut CancelSignal,
) -> ExecutionStats {
    let mut recorder = LatencyRecorder::new();

    loop {
        if cancel.is_cancelled() || Instant::now() >= deadline {
            break;
        }

        let start = Instant::now();
        let res = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Cancelled after {} executions.", recorder.count());
                break;
            }
            _ = sleep_until(deadline) => {
                trace!("Budget exhausted after {} executions.", recorder.count());
                break;
            }
            res = conn.execute(&query.sql) => res,
        };
        let elapsed = start.elapsed();

        if let Err(err) = res {
            hooks::record_error();
            let message = error_chain(&err);
            debug!("Statement failed after {} executions: {message}", recorder.count());
            return ExecutionStats::failed(ExecutionError::Statement(message));
        }

        hooks::record_success(elapsed);
        recorder.record(elapsed);

        if recorder.count() == 1 {
            debug!(
                "First execution took {}",
                humantime::format_duration(elapsed)
            );
        }
    }

    recorder.finish()
}

/// Render an error together with its sources, outermost first.
pub(crate) fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let inner_message = inner.to_string();
        if !message.ends_with(&inner_message) {
            message.push_str(": ");
            message.push_str(&inner_message);
        }
        source = inner.source();
    }
    message
}
