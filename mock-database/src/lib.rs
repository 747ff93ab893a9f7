use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use overload_core::{Connection, Connector};
use rand_distr::{Distribution, Normal};
use std::{
    fmt,
    num::NonZeroU32,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use thiserror::Error;
use tracing::{debug, trace};

const DEFAULT_LATENCY: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MockError {
    #[error("{0}")]
    Connect(String),

    #[error("{0}")]
    Statement(String),
}

/// In-process stand-in for a database server.
///
/// Every statement sleeps for the configured latency (tokio time, so paused-clock tests run
/// instantly) and then succeeds or fails according to the configured rules. Clones share
/// their connection counters.
#[derive(Debug, Clone)]
pub struct MockDatabase {
    behavior: Behavior,
    state: Arc<State>,
}

#[derive(Clone)]
struct Behavior {
    latency: Duration,
    jitter: Option<Normal<f64>>,
    fail_after: Option<(u64, String)>,
    fail_when: Option<(String, String)>,
    refuse: Option<String>,
    fail_connections: Option<(usize, String)>,
    max_connections: Option<(usize, String)>,
    panic_on_connect: usize,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("latency", &self.latency)
            .field("jitter", &self.jitter)
            .field("fail_after", &self.fail_after)
            .field("fail_when", &self.fail_when)
            .field("refuse", &self.refuse)
            .field("fail_connections", &self.fail_connections)
            .field("max_connections", &self.max_connections)
            .field("panic_on_connect", &self.panic_on_connect)
            .field("rate_limited", &self.limiter.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
struct State {
    attempts: AtomicUsize,
    open: AtomicUsize,
    total: AtomicUsize,
    executions: AtomicU64,
}

impl MockDatabase {
    pub fn new() -> Self {
        Self {
            behavior: Behavior {
                latency: DEFAULT_LATENCY,
                jitter: None,
                fail_after: None,
                fail_when: None,
                refuse: None,
                fail_connections: None,
                max_connections: None,
                panic_on_connect: 0,
                limiter: None,
            },
            state: Arc::new(State::default()),
        }
    }

    /// Time every statement takes. Must be non-zero for paused-clock tests to progress.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.behavior.latency = latency;
        self
    }

    /// Add normally distributed noise with the given standard deviation to every statement.
    pub fn jitter(mut self, std_dev: Duration) -> Self {
        self.behavior.jitter = Normal::new(0., std_dev.as_secs_f64()).ok();
        self
    }

    /// Every connection fails its statement after `successes` successful ones.
    pub fn fail_after(mut self, successes: u64, message: &str) -> Self {
        self.behavior.fail_after = Some((successes, message.to_string()));
        self
    }

    /// Statements containing `needle` fail.
    pub fn fail_when(mut self, needle: &str, message: &str) -> Self {
        self.behavior.fail_when = Some((needle.to_string(), message.to_string()));
        self
    }

    /// Every connection attempt fails.
    pub fn refuse_connections(mut self, message: &str) -> Self {
        self.behavior.refuse = Some(message.to_string());
        self
    }

    /// The first `count` connection attempts fail.
    pub fn fail_connections(mut self, count: usize, message: &str) -> Self {
        self.behavior.fail_connections = Some((count, message.to_string()));
        self
    }

    /// Connection attempts fail while `max` connections are open.
    pub fn max_connections(mut self, max: usize, message: &str) -> Self {
        self.behavior.max_connections = Some((max, message.to_string()));
        self
    }

    /// The first `count` connection attempts panic.
    pub fn panic_on_connect(mut self, count: usize) -> Self {
        self.behavior.panic_on_connect = count;
        self
    }

    /// Cap the throughput of the whole database. Uses the wall clock, not tokio time.
    pub fn max_qps(mut self, qps: NonZeroU32) -> Self {
        self.behavior.limiter = Some(Arc::new(rate_limiter(qps)));
        self
    }

    /// Open a connection without going through the connection rules.
    pub fn connection(&self) -> MockConnection {
        self.state.open.fetch_add(1, Ordering::SeqCst);
        self.open_connection()
    }

    pub fn open_connections(&self) -> usize {
        self.state.open.load(Ordering::SeqCst)
    }

    pub fn total_connections(&self) -> usize {
        self.state.total.load(Ordering::SeqCst)
    }

    pub fn executions(&self) -> u64 {
        self.state.executions.load(Ordering::SeqCst)
    }

    fn open_connection(&self) -> MockConnection {
        let id = self.state.total.fetch_add(1, Ordering::SeqCst);
        trace!("Opened mock connection {id}");
        MockConnection {
            id,
            executed: 0,
            behavior: self.behavior.clone(),
            state: self.state.clone(),
        }
    }
}

impl Default for MockDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for MockDatabase {
    type Conn = MockConnection;
    type Error = MockError;

    async fn connect(&self) -> Result<MockConnection, MockError> {
        let attempt = self.state.attempts.fetch_add(1, Ordering::SeqCst);

        if attempt < self.behavior.panic_on_connect {
            panic!("mock database panicked on connection attempt {attempt}");
        }

        if let Some(message) = &self.behavior.refuse {
            return Err(MockError::Connect(message.clone()));
        }

        if let Some((count, message)) = &self.behavior.fail_connections {
            if attempt < *count {
                return Err(MockError::Connect(format!("{message} (attempt {attempt})")));
            }
        }

        match &self.behavior.max_connections {
            Some((max, message)) => {
                let reserved = self
                    .state
                    .open
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |open| {
                        (open < *max).then_some(open + 1)
                    });
                if reserved.is_err() {
                    debug!("Rejecting connection attempt {attempt}: {max} already open");
                    return Err(MockError::Connect(message.clone()));
                }
            }
            None => {
                self.state.open.fetch_add(1, Ordering::SeqCst);
            }
        }

        Ok(self.open_connection())
    }
}

/// A connection to [`MockDatabase`]; decrements the open count when dropped.
#[derive(Debug)]
pub struct MockConnection {
    id: usize,
    executed: u64,
    behavior: Behavior,
    state: Arc<State>,
}

impl MockConnection {
    pub fn id(&self) -> usize {
        self.id
    }

    fn sample_latency(&self) -> Duration {
        match &self.behavior.jitter {
            Some(normal) => {
                let noise = normal.sample(&mut rand::thread_rng());
                let secs = (self.behavior.latency.as_secs_f64() + noise).max(0.);
                Duration::from_secs_f64(secs)
            }
            None => self.behavior.latency,
        }
    }
}

impl Connection for MockConnection {
    type Error = MockError;

    async fn execute(&mut self, sql: &str) -> Result<(), MockError> {
        if let Some(limiter) = &self.behavior.limiter {
            limiter.until_ready().await;
        }

        let latency = self.sample_latency();
        tokio::time::sleep(latency).await;

        if let Some((needle, message)) = &self.behavior.fail_when {
            if sql.contains(needle.as_str()) {
                return Err(MockError::Statement(message.clone()));
            }
        }

        if let Some((successes, message)) = &self.behavior.fail_after {
            if self.executed >= *successes {
                return Err(MockError::Statement(message.clone()));
            }
        }

        self.executed += 1;
        self.state.executions.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.state.open.fetch_sub(1, Ordering::SeqCst);
        trace!("Closed mock connection {}", self.id);
    }
}

/** Utils **/

pub fn rate_limiter(qps: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(qps).allow_burst(NonZeroU32::MIN))
}
