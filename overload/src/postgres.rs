//! PostgreSQL driver built on `tokio-postgres`.
use overload_core::{Connection, Connector};
use tokio::task::JoinHandle;
use tokio_postgres::{CancelToken, Client, Config, NoTls};
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Opens plain-TCP PostgreSQL connections from a connection string.
///
/// Accepts both URI (`postgres://user@host/db`) and key-value (`host=... user=...`) forms.
#[derive(Debug, Clone)]
pub struct PgConnector {
    config: Config,
}

impl PgConnector {
    pub fn new(connstr: &str) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            config: connstr.parse()?,
        })
    }

    pub fn from_config(config: Config) -> Self {
        Self { config }
    }
}

impl Connector for PgConnector {
    type Conn = PgConnection;
    type Error = tokio_postgres::Error;

    async fn connect(&self) -> Result<PgConnection, tokio_postgres::Error> {
        let (client, connection) = self.config.connect(NoTls).await?;
        let driver = tokio::spawn(async move {
            if let Err(err) = connection.await {
                debug!("Connection closed with error: {err}");
            }
        });

        Ok(PgConnection {
            cancel_token: client.cancel_token(),
            client,
            driver,
            in_flight: false,
        })
    }
}

/// A client and the task driving its socket. Dropping it closes the session.
///
/// A statement still running when the connection is dropped (the worker hit its deadline
/// or was cancelled) is cancelled on the server too; closing the socket alone leaves the
/// backend executing it.
pub struct PgConnection {
    client: Client,
    cancel_token: CancelToken,
    driver: JoinHandle<()>,
    in_flight: bool,
}

impl Connection for PgConnection {
    type Error = tokio_postgres::Error;

    async fn execute(&mut self, sql: &str) -> Result<(), tokio_postgres::Error> {
        self.in_flight = true;
        // Simple-query protocol: no prepare round-trip and no parameter handling.
        let res = self.client.batch_execute(sql).await;
        self.in_flight = false;
        res
    }
}

impl Drop for PgConnection {
    fn drop(&mut self) {
        if self.in_flight {
            cancel_in_background(self.cancel_token.clone());
        }
        self.driver.abort();
    }
}

fn cancel_in_background(token: CancelToken) {
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        warn!("No runtime to cancel an abandoned statement on; it keeps running.");
        return;
    };

    handle.spawn(async move {
        match token.cancel_query(NoTls).await {
            Ok(()) => trace!("Cancelled abandoned statement."),
            Err(err) => warn!("Failed to cancel abandoned statement: {err}"),
        }
    });
}
