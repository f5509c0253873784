//! CLI argument parsing for tablewatch

use clap::Parser;
use std::path::PathBuf;

use crate::config::RunMode;
use crate::vars::Variable;

/// Wait for upstream Snowflake tables and tasks to be refreshed today
#[derive(Parser, Debug)]
#[command(name = "tw")]
#[command(author, version, about = "Watch a list of tables/tasks until they are ready", long_about = None)]
pub struct Cli {
    /// YAML file listing the tables and tasks to check
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub config_file: PathBuf,

    /// Print the queries only, without running them
    #[arg(short = 'd', long = "dry-run", alias = "dry_run")]
    pub dry_run: bool,

    /// Use short fixed sleep/retry settings instead of the file's
    #[arg(short = 'u', long = "unit-test", alias = "unit_test")]
    pub unit_test: bool,

    /// Placeholder replacement, NAME=VALUE (repeatable)
    #[arg(short = 'v', long = "variable", value_name = "NAME=VALUE")]
    pub variables: Vec<Variable>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl Cli {
    pub fn mode(&self) -> RunMode {
        if self.unit_test {
            RunMode::UnitTest
        } else {
            RunMode::Production
        }
    }
}
