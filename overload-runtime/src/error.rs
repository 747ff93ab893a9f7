use overload_core::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("No connection string given; pass --connstr or set CONNSTR.")]
    MissingConnstr,

    #[error("No queries given; pass --query or --file.")]
    NoQueries,

    #[error("Invalid connection string: {0}")]
    Connstr(String),

    #[error("Failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid ramp configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to install metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("Ramp task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
