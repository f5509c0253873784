//! Human-readable status output

use std::io::{self, Write};
use std::time::Duration;

use colored::*;

use crate::config::{Config, RunMode};
use crate::evaluate::{CycleResult, ResourceStatus};
use crate::resource::Category;
use crate::watcher::Outcome;

/// Observer for watch progress; every hook defaults to a no-op
pub trait Reporter {
    fn banner(&mut self, _config: &Config, _dry_run: bool) {}

    fn attempt_started(&mut self, _stamp: &str, _attempt: u32, _max_retries: u32) {}

    fn query_text(&mut self, _category: Category, _sql: &str, _dry_run: bool) {}

    fn category_checked(&mut self, _result: &CycleResult) {}

    fn waiting(&mut self, _stamp: &str, _ready: usize, _waiting: usize, _sleep: Duration) {}

    fn finished(&mut self, _outcome: &Outcome) {}
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn banner(&mut self, config: &Config, dry_run: bool) {
        (**self).banner(config, dry_run)
    }

    fn attempt_started(&mut self, stamp: &str, attempt: u32, max_retries: u32) {
        (**self).attempt_started(stamp, attempt, max_retries)
    }

    fn query_text(&mut self, category: Category, sql: &str, dry_run: bool) {
        (**self).query_text(category, sql, dry_run)
    }

    fn category_checked(&mut self, result: &CycleResult) {
        (**self).category_checked(result)
    }

    fn waiting(&mut self, stamp: &str, ready: usize, waiting: usize, sleep: Duration) {
        (**self).waiting(stamp, ready, waiting, sleep)
    }

    fn finished(&mut self, outcome: &Outcome) {
        (**self).finished(outcome)
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {}

/// Writes status lines to a terminal (stdout by default)
pub struct ConsoleReporter<W: Write = io::Stdout> {
    out: W,
}

impl ConsoleReporter {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn format_sleep(sleep: Duration) -> String {
    let secs = sleep.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{} mins", secs / 60)
    } else {
        format!("{} secs", secs)
    }
}

// Status output is best effort; a closed stdout must not fail the watch
impl<W: Write> Reporter for ConsoleReporter<W> {
    fn banner(&mut self, config: &Config, dry_run: bool) {
        let wh = &config.warehouse;
        let _ = writeln!(self.out, "Snowflake Configuration:");
        let _ = writeln!(self.out, "ACCOUNT = {}", wh.account.as_deref().unwrap_or("-"));
        let _ = writeln!(self.out, "USER    = {}", wh.user.as_deref().unwrap_or("-"));
        let _ = writeln!(self.out, "ENV     = {}", wh.env);
        let _ = writeln!(self.out);
        let _ = writeln!(self.out, "MAX RETRY  = {}", config.max_retries);
        let _ = writeln!(self.out, "SLEEP TIME = {}", format_sleep(config.sleep));
        let _ = writeln!(self.out);
        if dry_run {
            let _ = writeln!(self.out, "{}", "*** DRY RUN ***".yellow().bold());
        }
        if config.mode == RunMode::UnitTest {
            let _ = writeln!(self.out, "{}", "*** UNIT TEST ***".yellow().bold());
        }
    }

    fn attempt_started(&mut self, stamp: &str, attempt: u32, max_retries: u32) {
        let _ = writeln!(
            self.out,
            "[{}] Try #{} (out of {}):",
            stamp.dimmed(),
            attempt,
            max_retries
        );
        let _ = writeln!(self.out);
    }

    fn query_text(&mut self, category: Category, sql: &str, dry_run: bool) {
        if dry_run {
            let _ = writeln!(self.out, "-- {} (not executed)", category);
        } else {
            let _ = writeln!(self.out, "-- {}", category);
        }
        let _ = writeln!(self.out, "{}", sql.dimmed());
        let _ = writeln!(self.out);
    }

    fn category_checked(&mut self, result: &CycleResult) {
        let _ = writeln!(self.out, "------------->");
        for check in &result.checks {
            let status = match &check.status {
                ResourceStatus::Ready => {
                    format!("READY [{}]", check.timestamp.as_deref().unwrap_or_default()).green()
                }
                ResourceStatus::Waiting { observed } => {
                    format!("WAITING [current={} not >= today={}]", observed, result.today).yellow()
                }
                ResourceStatus::Unresolved => "UNRESOLVED [no update time found]".red(),
                ResourceStatus::Malformed => format!(
                    "UNRESOLVED [unreadable time {:?}]",
                    check.timestamp.as_deref().unwrap_or_default()
                )
                .red(),
            };
            let _ = writeln!(self.out, "{} => {}", check.id, status);
        }
    }

    fn waiting(&mut self, stamp: &str, ready: usize, waiting: usize, sleep: Duration) {
        let _ = writeln!(self.out);
        let _ = writeln!(self.out, "[{}] Continue to wait...", stamp.dimmed());
        let _ = writeln!(
            self.out,
            "{} Ready; {} Waiting (next try in {})",
            ready.to_string().green(),
            waiting.to_string().yellow(),
            format_sleep(sleep)
        );
        let _ = writeln!(self.out);
    }

    fn finished(&mut self, outcome: &Outcome) {
        let _ = writeln!(self.out);
        match outcome {
            Outcome::Ready { attempts } => {
                let _ = writeln!(self.out, "{} All ready after {} tries", "✓".green(), attempts);
            }
            Outcome::DryRun { queries } => {
                let _ = writeln!(self.out, "{} Dry run: {} queries rendered", "✓".green(), queries.len());
            }
        }
    }
}
