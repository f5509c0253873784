//! Metadata query seam and SQL rendering

use crate::config::WarehouseConfig;
use crate::error::QueryError;
use crate::resource::{Category, ResourceSet};

/// One row of a metadata query: identifier and latest update, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRow {
    pub identifier: String,
    pub timestamp: Option<String>,
}

impl MetadataRow {
    pub fn new(identifier: impl Into<String>, timestamp: Option<&str>) -> Self {
        Self {
            identifier: identifier.into(),
            timestamp: timestamp.map(str::to_string),
        }
    }
}

/// Read-only access to warehouse metadata
///
/// Implementations receive opaque query text and return tabular rows. Calls
/// are blocking; any failure is final for the invocation.
pub trait MetadataQuery {
    fn query(&mut self, sql: &str) -> Result<Vec<MetadataRow>, QueryError>;
}

impl<Q: MetadataQuery + ?Sized> MetadataQuery for &mut Q {
    fn query(&mut self, sql: &str) -> Result<Vec<MetadataRow>, QueryError> {
        (**self).query(sql)
    }
}

/// Renders the per-category readiness queries
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    shared_schema: Option<String>,
    databases: Vec<String>,
    lookback_days: u32,
}

impl QueryBuilder {
    pub fn new(warehouse: &WarehouseConfig) -> Self {
        Self {
            shared_schema: warehouse.shared_schema.clone(),
            databases: warehouse.databases.clone(),
            lookback_days: crate::LOOKBACK_DAYS,
        }
    }

    /// Query text for `category`, filtered to the declared identifiers
    pub fn build(&self, category: Category, resources: &ResourceSet) -> String {
        let filter = quote_list(resources.iter().map(|id| id.as_str()));
        match category {
            Category::Table => {
                let db_clause = if self.databases.is_empty() {
                    String::new()
                } else {
                    format!(
                        "\n  AND db_name IN ({})",
                        quote_list(self.databases.iter().map(String::as_str))
                    )
                };
                format!(
                    "SELECT LOWER(schema_name || '.' || table_name), MAX(last_update_time)::VARCHAR AS end_time\n\
                     FROM {}\n\
                     WHERE last_update_time::date > current_date - {}{}\n  \
                     AND LOWER(schema_name || '.' || table_name) IN ({})\n\
                     GROUP BY 1",
                    self.qualify("UPLOAD_HISTORY"),
                    self.lookback_days,
                    db_clause,
                    filter,
                )
            }
            Category::Task => format!(
                "SELECT LOWER(db_schema || '.' || task), MAX(log_time)::VARCHAR AS end_time\n\
                 FROM {}\n\
                 WHERE log_time::date > current_date - {}\n  \
                 AND action = 'end'\n  \
                 AND LOWER(db_schema || '.' || task) IN ({})\n\
                 GROUP BY 1",
                self.qualify("TASK_LOG"),
                self.lookback_days,
                filter,
            ),
        }
    }

    fn qualify(&self, table: &str) -> String {
        match &self.shared_schema {
            Some(schema) => format!("{}.{}", schema, table),
            None => table.to_string(),
        }
    }
}

/// `'a','b'` with embedded quotes doubled
fn quote_list<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items
        .map(|item| format!("'{}'", item.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(",")
}
