mod utils;
#[allow(unused)]
use utils::*;

#[cfg(feature = "integration")]
mod tests {
    use super::*;
    use overload::prelude::*;
    use std::time::Duration;

    fn connector() -> anyhow::Result<PgConnector> {
        let connstr = std::env::var("CONNSTR")?;
        Ok(PgConnector::new(&connstr)?)
    }

    async fn active_statements(sql: &str) -> anyhow::Result<i64> {
        let connstr = std::env::var("CONNSTR")?;
        let (client, connection) = tokio_postgres::connect(&connstr, tokio_postgres::NoTls).await?;
        let driver = tokio::spawn(connection);

        let row = client
            .query_one(
                "SELECT count(*) FROM pg_stat_activity WHERE state = 'active' AND query = $1",
                &[&sql],
            )
            .await?;
        driver.abort();
        Ok(row.get(0))
    }

    #[tokio::test]
    async fn sleeping_query_fills_the_budget() -> anyhow::Result<()> {
        init();

        let report = RampTest::new(connector()?, "SELECT pg_sleep(0.5)")
            .duration(Duration::from_secs(5))
            .base_workers(2)
            .steps(1)
            .await?;

        assert_eq!(report.worker_counts(), vec![1, 2]);
        let baseline = &report.steps[0].stats;
        assert!((8..=10).contains(&baseline.count), "count={}", baseline.count);
        assert!(baseline.avg >= Duration::from_millis(500));
        assert!(report.stats.error.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn syntax_error_stops_at_baseline() -> anyhow::Result<()> {
        init();

        let report = RampTest::new(connector()?, "SELEC 1")
            .duration(Duration::from_secs(2))
            .await?;

        assert_eq!(report.steps.len(), 1);
        let result = report.result();
        assert!(result.is_failed);
        assert!(result.comment.contains("syntax error"), "{}", result.comment);
        Ok(())
    }

    #[tokio::test]
    async fn statement_longer_than_budget_times_out() -> anyhow::Result<()> {
        init();

        let report = RampTest::new(connector()?, "SELECT pg_sleep(10)")
            .duration(Duration::from_secs(1))
            .await?;

        assert_eq!(report.steps.len(), 1);
        assert_eq!(report.result().comment, "timeout");
        Ok(())
    }

    #[tokio::test]
    async fn timed_out_statement_is_cancelled_on_the_server() -> anyhow::Result<()> {
        init();

        let sql = "SELECT pg_sleep(8.25)";
        let report = RampTest::new(connector()?, sql)
            .duration(Duration::from_secs(1))
            .await?;
        assert_eq!(report.result().comment, "timeout");

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(active_statements(sql).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn cancelled_ramp_leaves_no_statement_behind() -> anyhow::Result<()> {
        init();

        let sql = "SELECT pg_sleep(9.25)";
        let (handle, signal) = cancel_pair();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            handle.cancel();
        });

        let report = RampTest::new(connector()?, sql)
            .duration(Duration::from_secs(30))
            .cancel_on(signal)
            .await?;
        assert_eq!(report.steps.len(), 1);
        assert!(report.stats.error.is_none());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(active_statements(sql).await?, 0);
        Ok(())
    }
}
