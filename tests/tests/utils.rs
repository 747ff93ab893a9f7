use mock_database::MockDatabase;
use overload::prelude::*;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));
    });

    // Install per test thread rather than globally so `#[traced_test]` tests
    // in the same binary can still claim the global subscriber.
    let subscriber = FmtSubscriber::builder()
        .with_env_filter("overload=debug,mock_database=debug")
        .with_test_writer()
        .finish();
    std::mem::forget(tracing::subscriber::set_default(subscriber));
}

/// Ramp `sql` against `db` and return the report.
#[allow(unused)]
pub async fn ramp(db: MockDatabase, config: RampConfig, sql: &str) -> RampReport {
    RampTest::new(db, sql)
        .config(config)
        .await
        .expect("ramp config must be valid")
}

#[allow(unused)]
pub fn short_config(duration: Duration) -> RampConfig {
    RampConfig::new()
        .duration(duration)
        .base_workers(4)
        .growth(2)
        .steps(3)
}
