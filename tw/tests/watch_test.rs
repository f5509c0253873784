//! End-to-end tests of the watch loop through the public API

use std::collections::VecDeque;
use std::time::Duration;

use chrono::NaiveDate;
use tablewatch::{
    Category, Clock, Config, ConsoleReporter, MetadataQuery, MetadataRow, Outcome, QueryError, RunMode, Sleeper,
    WarehouseConfig, WatchError, Watcher,
};

// =============================================================================
// Test doubles
// =============================================================================

struct Cycles {
    pending: VecDeque<Vec<MetadataRow>>,
    calls: usize,
}

impl Cycles {
    fn new(cycles: Vec<Vec<(&str, &str)>>) -> Self {
        let pending = cycles
            .into_iter()
            .map(|rows| rows.into_iter().map(|(id, ts)| MetadataRow::new(id, Some(ts))).collect())
            .collect();
        Self { pending, calls: 0 }
    }
}

impl MetadataQuery for Cycles {
    fn query(&mut self, _sql: &str) -> Result<Vec<MetadataRow>, QueryError> {
        self.calls += 1;
        self.pending
            .pop_front()
            .ok_or_else(|| QueryError::Other("unexpected query".to_string()))
    }
}

struct Pinned;

impl Clock for Pinned {
    fn today(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn stamp(&self) -> String {
        "2024-03-10 09:00:00".to_string()
    }
}

#[derive(Default)]
struct CountingSleeper {
    total: Duration,
    count: usize,
}

impl Sleeper for CountingSleeper {
    fn sleep(&mut self, duration: Duration) {
        self.total += duration;
        self.count += 1;
    }
}

fn config(yaml: &str) -> Config {
    Config::parse(yaml, RunMode::Production, &[], WarehouseConfig::default()).expect("valid config")
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_table_ready_on_second_try() {
    colored::control::set_override(false);
    let mut query = Cycles::new(vec![
        vec![("sales.orders", "2024-03-09 22:00:00")],
        vec![("sales.orders", "2024-03-10 01:00:00")],
    ]);
    let mut sleeper = CountingSleeper::default();
    let mut out: Vec<u8> = Vec::new();

    let result = Watcher::new(
        config("sleep_time: 20\nmax_retry: 5\nsnowflake_tables: [Sales.Orders]\n"),
        &mut query,
    )
    .with_clock(Pinned)
    .with_sleeper(&mut sleeper)
    .with_reporter(ConsoleReporter::new(&mut out))
    .run();

    assert_eq!(result.unwrap(), Outcome::Ready { attempts: 2 });
    assert_eq!(query.calls, 2);
    assert_eq!(sleeper.count, 1);
    assert_eq!(sleeper.total, Duration::from_secs(20 * 60));

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Try #1 (out of 5)"));
    assert!(text.contains("Try #2 (out of 5)"));
    assert!(text.contains("0 Ready; 1 Waiting"));
    assert_eq!(text.matches("UPLOAD_HISTORY").count(), 1, "query text shown on first try only");
}

#[test]
fn test_both_categories_checked_every_cycle() {
    let mut query = Cycles::new(vec![
        vec![("sales.orders", "2024-03-10 01:00:00")],
        vec![("etl.nightly", "2024-03-09 23:59:59")],
        vec![("sales.orders", "2024-03-10 01:00:00")],
        vec![("etl.nightly", "2024-03-10 04:00:00")],
    ]);
    let mut sleeper = CountingSleeper::default();

    let outcome = Watcher::new(
        config("snowflake_tables: [sales.orders]\nsnowflake_tasks: [etl.nightly]\n"),
        &mut query,
    )
    .with_clock(Pinned)
    .with_sleeper(&mut sleeper)
    .run()
    .unwrap();

    assert_eq!(outcome, Outcome::Ready { attempts: 2 });
    assert_eq!(query.calls, 4);
    assert_eq!(sleeper.count, 1);
}

#[test]
fn test_task_failure_reports_category_and_attempt() {
    let mut query = Cycles::new(vec![vec![("sales.orders", "2024-03-10 01:00:00")], vec![]]);

    let err = Watcher::new(
        config("snowflake_tables: [sales.orders]\nsnowflake_tasks: [etl.nightly]\n"),
        &mut query,
    )
    .with_clock(Pinned)
    .with_sleeper(CountingSleeper::default())
    .run()
    .unwrap_err();

    assert!(matches!(
        err,
        WatchError::NoRows {
            category: Category::Task,
            attempt: 1
        }
    ));
    assert!(err.to_string().contains("snowflake tasks"));
}
