//! Readiness evaluation for one category in one cycle
//!
//! Evaluation is pure: the same declared set, rows and date always produce
//! the same [`CycleResult`]. Whether a result is acceptable (every identifier
//! observed, every timestamp parseable) is decided separately by
//! [`CycleResult::ensure_resolved`], which is where fatal conditions become
//! [`WatchError`]s.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::WatchError;
use crate::query::MetadataRow;
use crate::resource::{Category, ResourceId, ResourceSet};

/// Readiness of a single resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceStatus {
    /// Updated on or after today
    Ready,
    /// Last update predates today
    Waiting { observed: NaiveDate },
    /// No timestamp was returned for this identifier
    Unresolved,
    /// A timestamp was returned but has no leading `YYYY-MM-DD`
    Malformed,
}

impl ResourceStatus {
    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::Waiting { .. })
    }
}

/// One declared resource and what this cycle learned about it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceCheck {
    pub id: ResourceId,
    pub timestamp: Option<String>,
    pub status: ResourceStatus,
}

/// Per-category outcome of one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleResult {
    pub category: Category,
    pub today: NaiveDate,
    /// Rows the query returned, matching or not
    pub rows_returned: usize,
    /// Declared resources in declaration order
    pub checks: Vec<ResourceCheck>,
}

impl CycleResult {
    pub fn waiting_count(&self) -> usize {
        self.checks.iter().filter(|c| c.status.is_waiting()).count()
    }

    pub fn ready_count(&self) -> usize {
        self.checks.iter().filter(|c| c.status == ResourceStatus::Ready).count()
    }

    /// Identifiers with no observed timestamp
    pub fn unresolved(&self) -> Vec<&ResourceId> {
        self.checks
            .iter()
            .filter(|c| c.status == ResourceStatus::Unresolved)
            .map(|c| &c.id)
            .collect()
    }

    /// Turn fatal statuses into an error, tagged with the attempt that saw them
    pub fn ensure_resolved(&self, attempt: u32) -> Result<(), WatchError> {
        if self.checks.is_empty() {
            return Ok(());
        }

        if self.rows_returned == 0 {
            return Err(WatchError::NoRows {
                category: self.category,
                attempt,
            });
        }

        let missing = self.unresolved();
        if !missing.is_empty() {
            return Err(WatchError::Unresolved {
                category: self.category,
                identifiers: missing.iter().map(|id| id.to_string()).collect(),
                attempt,
            });
        }

        if let Some(bad) = self.checks.iter().find(|c| c.status == ResourceStatus::Malformed) {
            return Err(WatchError::InvalidTimestamp {
                category: self.category,
                identifier: bad.id.to_string(),
                value: bad.timestamp.clone().unwrap_or_default(),
                attempt,
            });
        }

        Ok(())
    }
}

/// Calendar date at the front of a warehouse timestamp
pub fn timestamp_date(timestamp: &str) -> Option<NaiveDate> {
    let prefix = timestamp.trim().get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Evaluate one category's query rows against its declared resources
pub fn evaluate(category: Category, declared: &ResourceSet, rows: &[MetadataRow], today: NaiveDate) -> CycleResult {
    let mut observed: HashMap<&ResourceId, Option<&str>> = declared.iter().map(|id| (id, None)).collect();

    for row in rows {
        let id = ResourceId::new(&row.identifier);
        let Some(ts) = row.timestamp.as_deref() else {
            debug!(%category, identifier = %id, "evaluate: row has no timestamp");
            continue;
        };
        match observed.get_mut(&id) {
            Some(slot) => *slot = Some(ts),
            None => debug!(%category, identifier = %id, "evaluate: ignoring undeclared row"),
        }
    }

    let checks = declared
        .iter()
        .map(|id| {
            let timestamp = observed.get(id).copied().flatten();
            let status = match timestamp {
                None => ResourceStatus::Unresolved,
                Some(ts) => match timestamp_date(ts) {
                    None => ResourceStatus::Malformed,
                    Some(date) if date >= today => ResourceStatus::Ready,
                    Some(date) => ResourceStatus::Waiting { observed: date },
                },
            };
            ResourceCheck {
                id: id.clone(),
                timestamp: timestamp.map(str::to_string),
                status,
            }
        })
        .collect();

    CycleResult {
        category,
        today,
        rows_returned: rows.len(),
        checks,
    }
}
