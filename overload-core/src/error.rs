use std::fmt;
use thiserror::Error;

/// A failure that ended a worker's measurement.
///
/// Timeouts and cancellations are deliberately absent: running out of budget is a normal
/// outcome and is represented by a (possibly zero) count with no error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("failed to connect: {0}")]
    Connect(String),

    #[error("statement failed: {0}")]
    Statement(String),

    #[error("worker task failed: {0}")]
    Worker(String),

    #[error("{}", JoinedMessages(.0))]
    Multiple(Vec<ExecutionError>),
}

impl ExecutionError {
    /// Join several errors into one, flattening nested joins.
    ///
    /// Returns `None` for an empty input and the error itself when there is only one.
    pub fn join<I>(errors: I) -> Option<Self>
    where
        I: IntoIterator<Item = ExecutionError>,
    {
        let mut flat = vec![];
        for error in errors {
            match error {
                ExecutionError::Multiple(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }

        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(ExecutionError::Multiple(flat)),
        }
    }

    /// Messages of every underlying error.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ExecutionError::Multiple(inner) => inner.iter().flat_map(|e| e.messages()).collect(),
            other => vec![other.to_string()],
        }
    }

    /// Number of underlying errors.
    pub fn error_count(&self) -> usize {
        match self {
            ExecutionError::Multiple(inner) => inner.iter().map(ExecutionError::error_count).sum(),
            _ => 1,
        }
    }
}

struct JoinedMessages<'a>(&'a [ExecutionError]);

impl fmt::Display for JoinedMessages<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} errors: ", self.0.len())?;
        for (idx, error) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

/// Invalid ramp configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("iteration duration must be non-zero")]
    ZeroDuration,

    #[error("ramp base worker count must be at least 1")]
    ZeroWorkers,

    #[error("ramp growth factor must be at least {min}, got {got}")]
    GrowthTooSmall { min: usize, got: usize },

    #[error("ramp must have at least one step")]
    NoSteps,

    #[error("worker count overflows at ramp step {0}")]
    Overflow(usize),
}
