mod config;
mod connection;
mod constants;
mod error;
mod query;
mod result;
mod stats;

pub use config::*;
pub use connection::*;
pub use constants::*;
pub use error::*;
pub use query::*;
pub use result::*;
pub use stats::*;
