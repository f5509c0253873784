//! TableWatch - upstream readiness poller
//!
//! Blocks a pipeline step until every declared warehouse table and task has
//! been refreshed today, a retry budget runs out, or something is wrong with
//! the declaration itself.
//!
//! # Core Concepts
//!
//! - **Resources**: tables and tasks, identified case-insensitively as `schema.name`
//! - **Cycle**: one pass over both categories (tables first, then tasks)
//! - **Waiting vs Unresolved**: stale metadata is retried, missing metadata is fatal
//! - **Retry budget**: `max_retry` cycles, `sleep_time` minutes apart
//!
//! # Modules
//!
//! - [`config`] - YAML configuration loading and validation
//! - [`vars`] - `:name` placeholder substitution
//! - [`resource`] - Resource categories and normalised identifiers
//! - [`query`] - Metadata query trait and SQL rendering
//! - [`snowsql`] - Query service backed by the `snowsql` client
//! - [`evaluate`] - Per-cycle readiness evaluation
//! - [`watcher`] - Retry loop controller
//! - [`report`] - Console status output
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use tablewatch::{Config, RunMode, SnowSql, Watcher};
//!
//! let config = Config::load("watch.yml", RunMode::Production, &[])?;
//! let client = SnowSql::new(config.warehouse.clone());
//! Watcher::new(config, client).run()?;
//! ```

pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod query;
pub mod report;
pub mod resource;
pub mod snowsql;
pub mod vars;
pub mod watcher;

pub use clock::{Clock, Sleeper, SystemClock, ThreadSleeper};
pub use config::{Config, RunMode, WarehouseConfig};
pub use error::{ConfigError, QueryError, WatchError};
pub use evaluate::{CycleResult, ResourceCheck, ResourceStatus, evaluate};
pub use query::{MetadataQuery, MetadataRow, QueryBuilder};
pub use report::{ConsoleReporter, NullReporter, Reporter};
pub use resource::{Category, ResourceId, ResourceSet};
pub use snowsql::SnowSql;
pub use vars::Variable;
pub use watcher::{CycleSummary, Decision, Outcome, RunState, Watcher, decide};

/// Default minutes between cycles
pub const DEFAULT_SLEEP_MINUTES: i64 = 30;

/// Default number of cycles before giving up
pub const DEFAULT_MAX_RETRIES: i64 = 3;

/// Days of metadata history the queries look back over
pub const LOOKBACK_DAYS: u32 = 10;
