use overload_runtime::OverloadRuntime;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_FILTER: &str = "overload=info,overload_runtime=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let summary = OverloadRuntime::new().with_args().run().await?;
    let failed = summary.failed().count();
    if failed > 0 {
        tracing::warn!("{failed} of {} queries failed.", summary.reports.len());
    }

    Ok(())
}
