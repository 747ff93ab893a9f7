mod utils;
#[allow(unused)]
use utils::*;

use mock_database::MockDatabase;
use overload::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn erroring_query_reports_a_single_step() {
    init();

    let db = MockDatabase::new().fail_when("SELEC ", "syntax error at or near \"SELEC\"");
    let report = ramp(db.clone(), RampConfig::default(), "SELEC 1").await;

    assert_eq!(report.steps.len(), 1);
    assert_eq!(report.steps[0].phase, RampPhase::Baseline);
    assert_eq!(report.steps[0].worker_count, 1);

    let result = report.result();
    assert!(result.is_failed);
    assert_eq!(result.qps, 0.);
    assert!(result.comment.contains("SELEC"));
    assert_eq!(db.open_connections(), 0);
}

#[tracing_test::traced_test]
#[tokio::test(start_paused = true)]
async fn every_step_is_logged_with_its_aggregate() {
    let db = MockDatabase::new().latency(Duration::from_millis(100));
    let report = ramp(db, short_config(Duration::from_secs(1)), "SELECT 1").await;

    assert_eq!(report.steps.len(), 4);
    assert!(logs_contain("baseline (1 workers)"));
    assert!(logs_contain("ramp 3 (16 workers)"));
    assert!(logs_contain("Ramp complete after 4 steps"));
    assert!(!logs_contain("not ramping"));
}

#[tracing_test::traced_test]
#[tokio::test(start_paused = true)]
async fn failed_baseline_explains_why_it_stopped() {
    let db = MockDatabase::new().fail_after(0, "permission denied for table accounts");
    let report = ramp(db, RampConfig::default(), "SELECT * FROM accounts").await;

    assert_eq!(report.steps.len(), 1);
    assert!(logs_contain("permission denied for table accounts"));
    assert!(logs_contain("Baseline failed; not ramping."));
}

#[tokio::test(start_paused = true)]
async fn default_ramp_doubles_four_times() {
    init();

    let db = MockDatabase::new().latency(Duration::from_secs(5));
    let report = ramp(db.clone(), RampConfig::default(), "SELECT 1").await;

    let counts = report.worker_counts();
    assert_eq!(counts, vec![1, 50, 100, 200, 400]);
    for pair in counts[1..].windows(2) {
        assert!(pair[1] >= 2 * pair[0]);
    }
    assert!(report.steps.iter().all(|step| step.duration == Duration::from_secs(60)));
    assert!(report.results().iter().all(|res| !res.is_failed));
    assert_eq!(db.open_connections(), 0);
    assert_eq!(db.total_connections(), 751);
}

#[tokio::test(start_paused = true)]
async fn two_second_query_in_a_one_minute_budget() {
    init();

    let db = MockDatabase::new().latency(Duration::from_secs(2));
    let config = RampConfig::new().base_workers(2).steps(1);
    let report = ramp(db, config, "SELECT pg_sleep(2)").await;

    let baseline = &report.steps[0].stats;
    assert!((29..=31).contains(&baseline.count), "count={}", baseline.count);
    assert!(baseline.avg >= Duration::from_millis(1_990));
    assert!(baseline.avg <= Duration::from_millis(2_010));
    assert_eq!(report.worker_counts(), vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn slow_query_times_out_without_ramping() {
    init();

    let db = MockDatabase::new().latency(Duration::from_secs(90));
    let report = ramp(db.clone(), RampConfig::default(), "SELECT pg_sleep(90)").await;

    assert_eq!(report.steps.len(), 1);
    assert!(report.stats.is_timeout());
    assert_eq!(report.result().comment, "timeout");
    assert_eq!(db.open_connections(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancellation_returns_promptly() {
    init();

    let db = MockDatabase::new().latency(Duration::from_millis(40));
    let (handle, signal) = cancel_pair();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.cancel();
    });

    let start = Instant::now();
    let report = RampTest::new(db.clone(), "SELECT 1").cancel_on(signal).await.unwrap();

    // Bounded by one in-flight statement.
    assert!(start.elapsed() <= Duration::from_millis(140));
    assert_eq!(report.steps.len(), 1);
    assert!(report.stats.error.is_none());
    assert!(report.stats.count > 0);
    assert_eq!(db.open_connections(), 0);
}

#[tokio::test(start_paused = true)]
async fn shared_connector_counts_every_worker() {
    init();

    let db = Arc::new(MockDatabase::new().latency(Duration::from_millis(100)));
    let config = short_config(Duration::from_secs(1));

    let first = RampTest::shared(db.clone(), "SELECT 1").config(config.clone()).await.unwrap();
    let second = RampTest::shared(db.clone(), "SELECT 2").config(config).await.unwrap();

    assert_eq!(first.worker_counts(), second.worker_counts());
    assert_eq!(db.total_connections(), 2 * (1 + 4 + 8 + 16));
    assert_eq!(db.open_connections(), 0);
}

#[tokio::test(start_paused = true)]
async fn connection_limit_fails_later_steps_only() {
    init();

    let db = MockDatabase::new()
        .latency(Duration::from_millis(100))
        .max_connections(6, "sorry, too many clients already");
    let report = ramp(db, short_config(Duration::from_secs(1)), "SELECT 1").await;

    assert_eq!(report.worker_counts(), vec![1, 4, 8, 16]);
    let results = report.results();
    assert_eq!(results[1].comment, "ok");
    assert!(results[2].comment.starts_with("error: "));
    assert!(results[2].comment.contains("too many clients"));

    // Healthy workers still report their measurements next to the failures.
    assert_eq!(report.steps[2].stats.error.as_ref().map(|e| e.error_count()), Some(2));
    assert!(report.steps[2].stats.count > 0);
}

#[tokio::test(start_paused = true)]
async fn results_serialize_as_json_lines() {
    init();

    let db = MockDatabase::new().latency(Duration::from_millis(250));
    let report = ramp(db, short_config(Duration::from_secs(1)).steps(1), "SELECT 1").await;

    let lines: Vec<String> = report
        .results()
        .iter()
        .map(|res| serde_json::to_string(res).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);

    let value: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
    assert_eq!(value["query"], "SELECT 1");
    assert_eq!(value["worker_count"], 4);
    assert_eq!(value["comment"], "ok");
    assert_eq!(value["qps"], 4.0);
    assert_eq!(value["info"]["avg_ms"], 250.0);
    assert_eq!(value["info"]["count"], 12);
}
