//! Watch configuration loading and validation

use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::ConfigError;
use crate::resource::{Category, ResourceId, ResourceSet};
use crate::vars::{self, Variable};

/// Valid `sleep_time` range in minutes
pub const SLEEP_MINUTES_RANGE: RangeInclusive<i64> = 15..=60;

/// Valid `max_retry` range
pub const MAX_RETRY_RANGE: RangeInclusive<i64> = 0..=20;

/// Sleep between cycles in unit-test mode
pub const UNIT_TEST_SLEEP: Duration = Duration::from_secs(5);

/// Retry budget in unit-test mode
pub const UNIT_TEST_MAX_RETRIES: u32 = 2;

/// How strictly settings are validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Settings come from the file and are range-checked
    #[default]
    Production,
    /// Settings in the file are ignored in favour of short fixed values
    UnitTest,
}

/// Config file as written on disk
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WatchDocument {
    /// Minutes between cycles
    pub sleep_time: Option<i64>,

    /// Number of cycles before giving up
    pub max_retry: Option<i64>,

    /// Tables checked against upload history
    pub snowflake_tables: Option<Vec<String>>,

    /// Tasks checked against the task log
    pub snowflake_tasks: Option<Vec<String>>,

    /// Per-file overrides of the warehouse settings
    pub warehouse: Option<WarehouseOverrides>,
}

/// Warehouse keys a config file may override
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WarehouseOverrides {
    pub shared_schema: Option<String>,
    pub databases: Option<Vec<String>>,
}

/// Connection and metadata-location settings for the warehouse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseConfig {
    pub account: Option<String>,
    pub user: Option<String>,
    pub role: Option<String>,
    pub warehouse: Option<String>,

    /// Schema holding UPLOAD_HISTORY and TASK_LOG
    pub shared_schema: Option<String>,

    /// Databases whose uploads count towards table readiness
    pub databases: Vec<String>,

    /// Environment label shown in the banner
    pub env: String,

    /// Path to the snowsql client
    pub snowsql_bin: String,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            account: None,
            user: None,
            role: None,
            warehouse: None,
            shared_schema: None,
            databases: Vec::new(),
            env: "NON-PROD".to_string(),
            snowsql_bin: "snowsql".to_string(),
        }
    }
}

impl WarehouseConfig {
    /// Read settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            account: get("SNOWFLAKE_ACCOUNT"),
            user: get("SNOWFLAKE_USER"),
            role: get("SNOWFLAKE_ROLE"),
            warehouse: get("SNOWFLAKE_WAREHOUSE"),
            shared_schema: get("SNOWFLAKE_SHARED_SCHEMA"),
            databases: get("SNOWFLAKE_WATCHER_DATABASES")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            env: get("SNOWFLAKE_ENV").unwrap_or(defaults.env),
            snowsql_bin: get("SNOWSQL_BIN").unwrap_or(defaults.snowsql_bin),
        }
    }

    fn apply(&mut self, overrides: WarehouseOverrides) {
        if let Some(schema) = overrides.shared_schema {
            self.shared_schema = Some(schema);
        }
        if let Some(databases) = overrides.databases {
            self.databases = databases;
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Validated, immutable settings for one watch invocation
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: RunMode,
    pub sleep: Duration,
    pub max_retries: u32,
    pub tables: ResourceSet,
    pub tasks: ResourceSet,
    pub warehouse: WarehouseConfig,
}

impl Config {
    /// Load from a YAML file, taking warehouse settings from the environment
    pub fn load<P: AsRef<Path>>(path: P, mode: RunMode, variables: &[Variable]) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::parse(&content, mode, variables, WarehouseConfig::from_env())?;
        info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Parse YAML text on top of the given warehouse settings
    pub fn parse(
        content: &str,
        mode: RunMode,
        variables: &[Variable],
        warehouse: WarehouseConfig,
    ) -> Result<Self, ConfigError> {
        let doc: WatchDocument = serde_yaml::from_str(content)?;
        Self::from_document(doc, mode, variables, warehouse)
    }

    pub fn from_document(
        doc: WatchDocument,
        mode: RunMode,
        variables: &[Variable],
        mut warehouse: WarehouseConfig,
    ) -> Result<Self, ConfigError> {
        let (sleep, max_retries) = match mode {
            RunMode::UnitTest => {
                debug!("Config::from_document: unit-test mode, ignoring sleep_time/max_retry");
                (UNIT_TEST_SLEEP, UNIT_TEST_MAX_RETRIES)
            }
            RunMode::Production => {
                let minutes = doc.sleep_time.unwrap_or(crate::DEFAULT_SLEEP_MINUTES);
                if !SLEEP_MINUTES_RANGE.contains(&minutes) {
                    return Err(ConfigError::SleepOutOfRange {
                        value: minutes,
                        min: *SLEEP_MINUTES_RANGE.start(),
                        max: *SLEEP_MINUTES_RANGE.end(),
                    });
                }

                let retries = doc.max_retry.unwrap_or(crate::DEFAULT_MAX_RETRIES);
                if !MAX_RETRY_RANGE.contains(&retries) {
                    return Err(ConfigError::MaxRetryOutOfRange {
                        value: retries,
                        min: *MAX_RETRY_RANGE.start(),
                        max: *MAX_RETRY_RANGE.end(),
                    });
                }

                // Both ranges are non-negative and small, so the casts are lossless
                (Duration::from_secs(minutes as u64 * 60), retries as u32)
            }
        };

        if let Some(overrides) = doc.warehouse {
            warehouse.apply(overrides);
        }

        let tables = declare(Category::Table, doc.snowflake_tables.unwrap_or_default(), variables);
        let tasks = declare(Category::Task, doc.snowflake_tasks.unwrap_or_default(), variables);

        Ok(Self {
            mode,
            sleep,
            max_retries,
            tables,
            tasks,
            warehouse,
        })
    }

    /// Declared resources for one category
    pub fn resources(&self, category: Category) -> &ResourceSet {
        match category {
            Category::Table => &self.tables,
            Category::Task => &self.tasks,
        }
    }

    /// Number of distinct resources across both categories
    pub fn total_count(&self) -> usize {
        self.tables.len() + self.tasks.len()
    }
}

fn declare(category: Category, raw: Vec<String>, variables: &[Variable]) -> ResourceSet {
    let mut set = ResourceSet::new();
    for entry in raw {
        let resolved = vars::substitute(&entry, variables);
        for name in vars::unresolved(&resolved) {
            warn!(%category, identifier = %resolved, placeholder = %name, "Unresolved placeholder left in identifier");
        }
        if !set.insert(ResourceId::new(&resolved)) {
            debug!(%category, identifier = %resolved, "Duplicate identifier collapsed");
        }
    }
    set
}
