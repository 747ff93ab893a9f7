//! Seam between the load tester and a database client.
//!
//! The engine only needs two things from a driver: a way to open an exclusive connection,
//! and a way to run a statement on it. Use the `Send` variants ([`Connector`],
//! [`Connection`]) when implementing a driver; the engine spawns one task per worker.
use std::error::Error as StdError;

/// An exclusive connection owned by a single worker.
///
/// Dropping the connection must release it, including while a statement is in flight.
#[trait_variant::make(Connection: Send)]
pub trait LocalConnection: Send {
    type Error: StdError + Send + Sync + 'static;

    /// Run the statement to completion, discarding any rows.
    async fn execute(&mut self, sql: &str) -> Result<(), Self::Error>;
}

/// Opens connections to the database under test.
#[trait_variant::make(Connector: Send)]
pub trait LocalConnector: Send + Sync {
    type Conn: Connection + 'static;
    type Error: StdError + Send + Sync + 'static;

    async fn connect(&self) -> Result<Self::Conn, Self::Error>;
}
