//! Metadata query service backed by the `snowsql` command-line client

use std::process::{Command, Stdio};

use tracing::debug;

use crate::config::WarehouseConfig;
use crate::error::QueryError;
use crate::query::{MetadataQuery, MetadataRow};

/// Runs each query through a fresh `snowsql` process
///
/// Credentials not covered by [`WarehouseConfig`] (password, key pair,
/// connection profiles) are left to snowsql's own environment and config.
#[derive(Debug, Clone)]
pub struct SnowSql {
    config: WarehouseConfig,
}

impl SnowSql {
    pub fn new(config: WarehouseConfig) -> Self {
        Self { config }
    }

    /// Arguments passed to snowsql for `sql`
    pub fn args(&self, sql: &str) -> Vec<String> {
        let mut args = Vec::new();
        let connection = [
            ("-a", &self.config.account),
            ("-u", &self.config.user),
            ("-r", &self.config.role),
            ("-w", &self.config.warehouse),
        ];
        for (flag, value) in connection {
            if let Some(value) = value {
                args.push(flag.to_string());
                args.push(value.clone());
            }
        }
        for option in [
            "output_format=tsv",
            "header=false",
            "timing=false",
            "friendly=false",
            "quiet=true",
            "exit_on_error=true",
        ] {
            args.push("-o".to_string());
            args.push(option.to_string());
        }
        args.push("-q".to_string());
        args.push(sql.to_string());
        args
    }
}

impl MetadataQuery for SnowSql {
    fn query(&mut self, sql: &str) -> Result<Vec<MetadataRow>, QueryError> {
        let program = &self.config.snowsql_bin;
        debug!(%program, "SnowSql::query: running");

        let output = Command::new(program)
            .args(self.args(sql))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| QueryError::Launch {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(QueryError::Failed {
                status: output.status.to_string(),
                stderr,
            });
        }

        parse_tsv(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse `identifier<TAB>timestamp` lines; empty or `NULL` timestamps are absent
pub fn parse_tsv(stdout: &str) -> Result<Vec<MetadataRow>, QueryError> {
    let mut rows = Vec::new();
    for line in stdout.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let (identifier, timestamp) = line.split_once('\t').ok_or_else(|| QueryError::MalformedRow {
            line: line.to_string(),
        })?;
        let timestamp = match timestamp.trim() {
            "" | "NULL" => None,
            ts => Some(ts),
        };
        rows.push(MetadataRow::new(identifier.trim(), timestamp));
    }
    Ok(rows)
}
