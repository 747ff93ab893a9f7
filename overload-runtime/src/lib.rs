//! Command-line runner for [`overload`].
pub mod queries;
pub mod runtime;

mod error;

pub use crate::error::RuntimeError;
pub use crate::queries::parse_queries;
pub use crate::runtime::{OverloadRuntime, RunSummary};
