//! Error types

use std::path::PathBuf;
use thiserror::Error;

use crate::resource::Category;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("sleep_time can only be between {min} and {max} mins (got {value})")]
    SleepOutOfRange { value: i64, min: i64, max: i64 },

    #[error("max_retry can only be between {min} and {max} times (got {value})")]
    MaxRetryOutOfRange { value: i64, min: i64, max: i64 },
}

/// Errors from the metadata query service
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Query failed (exit status {status}): {stderr}")]
    Failed { status: String, stderr: String },

    #[error("Malformed result row {line:?}")]
    MalformedRow { line: String },

    #[error("{0}")]
    Other(String),
}

/// Terminal failures of a watch invocation
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Query for {category} failed on try #{attempt}: {source}")]
    Query {
        category: Category,
        attempt: u32,
        #[source]
        source: QueryError,
    },

    #[error("Unable to find any of the {category} (no rows returned on try #{attempt})")]
    NoRows { category: Category, attempt: u32 },

    #[error("Unable to get time for {category} {} on try #{attempt}", quoted(.identifiers))]
    Unresolved {
        category: Category,
        identifiers: Vec<String>,
        attempt: u32,
    },

    #[error("Invalid timestamp {value:?} for {category} '{identifier}' on try #{attempt}")]
    InvalidTimestamp {
        category: Category,
        identifier: String,
        value: String,
        attempt: u32,
    },

    #[error(
        "Max retry ({max_retries}) is reached with {waiting} still waiting after try #{attempt}: {}",
        pending_list(.pending)
    )]
    RetryExhausted {
        max_retries: u32,
        attempt: u32,
        waiting: usize,
        /// Resources still stale on the final try, tables first
        pending: Vec<(Category, String)>,
    },
}

impl WatchError {
    /// True when the invocation ran out of retries rather than hitting a data or config problem
    pub fn is_exhausted(&self) -> bool {
        matches!(self, WatchError::RetryExhausted { .. })
    }
}

fn quoted(identifiers: &[String]) -> String {
    identifiers
        .iter()
        .map(|id| format!("'{}'", id))
        .collect::<Vec<_>>()
        .join(", ")
}

fn pending_list(pending: &[(Category, String)]) -> String {
    pending
        .iter()
        .map(|(category, id)| format!("{} '{}'", category, id))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_message_names_identifiers() {
        let err = WatchError::Unresolved {
            category: Category::Table,
            identifiers: vec!["db.tbl2".to_string(), "db.tbl3".to_string()],
            attempt: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("'db.tbl2', 'db.tbl3'"));
        assert!(msg.contains("tables"));
        assert!(msg.contains("try #1"));
    }

    #[test]
    fn test_is_exhausted() {
        let exhausted = WatchError::RetryExhausted {
            max_retries: 2,
            attempt: 2,
            waiting: 1,
            pending: vec![(Category::Table, "db.stale".to_string())],
        };
        assert!(exhausted.is_exhausted());

        let no_rows = WatchError::NoRows {
            category: Category::Task,
            attempt: 1,
        };
        assert!(!no_rows.is_exhausted());
    }

    #[test]
    fn test_exhausted_message_names_pending_resources() {
        let err = WatchError::RetryExhausted {
            max_retries: 2,
            attempt: 2,
            waiting: 2,
            pending: vec![
                (Category::Table, "db.stale".to_string()),
                (Category::Task, "etl.nightly".to_string()),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Max retry (2) is reached with 2 still waiting after try #2: \
             snowflake tables 'db.stale', snowflake tasks 'etl.nightly'"
        );
    }
}
