//! Retry loop controller
//!
//! A watch invocation is a small state machine:
//!
//! ```text
//!            ┌──────── sleep, attempt += 1 ────────┐
//!            ▼                                      │
//!        Checking ── waiting > 0, attempt < max ──► WaitingToRetry
//!            │
//!            ├── waiting == 0 ─────────────────────► Succeeded
//!            ├── waiting > 0, attempt >= max ──────► Exhausted
//!            └── query error / unresolved ─────────► Failed
//! ```
//!
//! Each cycle re-checks every declared resource from scratch; a resource that
//! was ready on an earlier attempt must still be ready on the final one.

use tracing::{debug, info, warn};

use crate::clock::{Clock, Sleeper, SystemClock, ThreadSleeper};
use crate::config::Config;
use crate::error::WatchError;
use crate::evaluate::{CycleResult, evaluate};
use crate::query::{MetadataQuery, QueryBuilder};
use crate::report::{NullReporter, Reporter};
use crate::resource::Category;

/// Per-invocation progress, replaced by its successor on every retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunState {
    /// 1-based cycle number
    pub attempt: u32,
    /// Declared resources across both categories
    pub total: usize,
}

impl RunState {
    pub fn start(total: usize) -> Self {
        Self { attempt: 1, total }
    }

    /// State for the following cycle
    pub fn next(self) -> Self {
        Self {
            attempt: self.attempt + 1,
            ..self
        }
    }
}

/// What to do after a cycle that raised no error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Succeed,
    Retry,
    Exhaust,
}

/// Transition out of `Checking`
pub fn decide(state: &RunState, waiting: usize, max_retries: u32) -> Decision {
    if waiting == 0 {
        Decision::Succeed
    } else if state.attempt < max_retries {
        Decision::Retry
    } else {
        Decision::Exhaust
    }
}

/// Results of every non-empty category in one cycle, tables first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub results: Vec<CycleResult>,
}

impl CycleSummary {
    pub fn waiting(&self) -> usize {
        self.results.iter().map(CycleResult::waiting_count).sum()
    }

    pub fn ready(&self) -> usize {
        self.results.iter().map(CycleResult::ready_count).sum()
    }

    /// Identifiers still waiting, in check order
    pub fn pending(&self) -> Vec<(Category, String)> {
        self.results
            .iter()
            .flat_map(|result| {
                result
                    .checks
                    .iter()
                    .filter(|check| check.status.is_waiting())
                    .map(move |check| (result.category, check.id.to_string()))
            })
            .collect()
    }
}

/// How a successful invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Everything was ready on the given attempt
    Ready { attempts: u32 },
    /// Nothing was queried; these are the queries that would have run
    DryRun { queries: Vec<(Category, String)> },
}

/// Polls warehouse metadata until every declared resource is ready
pub struct Watcher<Q, C = SystemClock, S = ThreadSleeper, R = NullReporter> {
    config: Config,
    query: Q,
    builder: QueryBuilder,
    clock: C,
    sleeper: S,
    reporter: R,
    dry_run: bool,
}

impl<Q: MetadataQuery> Watcher<Q> {
    pub fn new(config: Config, query: Q) -> Self {
        let builder = QueryBuilder::new(&config.warehouse);
        Self {
            config,
            query,
            builder,
            clock: SystemClock,
            sleeper: ThreadSleeper,
            reporter: NullReporter,
            dry_run: false,
        }
    }
}

impl<Q, C, S, R> Watcher<Q, C, S, R>
where
    Q: MetadataQuery,
    C: Clock,
    S: Sleeper,
    R: Reporter,
{
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Watcher<Q, C2, S, R> {
        Watcher {
            config: self.config,
            query: self.query,
            builder: self.builder,
            clock,
            sleeper: self.sleeper,
            reporter: self.reporter,
            dry_run: self.dry_run,
        }
    }

    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> Watcher<Q, C, S2, R> {
        Watcher {
            config: self.config,
            query: self.query,
            builder: self.builder,
            clock: self.clock,
            sleeper,
            reporter: self.reporter,
            dry_run: self.dry_run,
        }
    }

    pub fn with_reporter<R2: Reporter>(self, reporter: R2) -> Watcher<Q, C, S, R2> {
        Watcher {
            config: self.config,
            query: self.query,
            builder: self.builder,
            clock: self.clock,
            sleeper: self.sleeper,
            reporter,
            dry_run: self.dry_run,
        }
    }

    /// Build queries without running them
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Run cycles until everything is ready, retries run out, or a cycle fails
    pub fn run(&mut self) -> Result<Outcome, WatchError> {
        self.reporter.banner(&self.config, self.dry_run);

        if self.dry_run {
            return Ok(self.render_queries());
        }

        let max_retries = self.config.max_retries;
        let mut state = RunState::start(self.config.total_count());
        info!(total = state.total, max_retries, "Watch started");

        loop {
            self.reporter
                .attempt_started(&self.clock.stamp(), state.attempt, max_retries);

            let summary = self.check_cycle(&state)?;
            let waiting = summary.waiting();
            debug!(attempt = state.attempt, waiting, ready = summary.ready(), "Cycle complete");

            match decide(&state, waiting, max_retries) {
                Decision::Succeed => {
                    info!(attempt = state.attempt, "All resources ready");
                    let outcome = Outcome::Ready {
                        attempts: state.attempt,
                    };
                    self.reporter.finished(&outcome);
                    return Ok(outcome);
                }
                Decision::Retry => {
                    info!(attempt = state.attempt, waiting, "Continue to wait");
                    self.reporter.waiting(
                        &self.clock.stamp(),
                        state.total - waiting,
                        waiting,
                        self.config.sleep,
                    );
                    self.sleeper.sleep(self.config.sleep);
                    state = state.next();
                }
                Decision::Exhaust => {
                    warn!(attempt = state.attempt, waiting, max_retries, "Max retry reached");
                    return Err(WatchError::RetryExhausted {
                        max_retries,
                        attempt: state.attempt,
                        waiting,
                        pending: summary.pending(),
                    });
                }
            }
        }
    }

    /// One pass over both categories
    ///
    /// Empty categories are skipped without querying. Any query failure or
    /// unresolved identifier ends the cycle immediately.
    pub fn check_cycle(&mut self, state: &RunState) -> Result<CycleSummary, WatchError> {
        let today = self.clock.today();
        let mut summary = CycleSummary::default();

        for category in Category::ALL {
            let resources = self.config.resources(category);
            if resources.is_empty() {
                debug!(%category, "check_cycle: nothing declared, skipping");
                continue;
            }

            let sql = self.builder.build(category, resources);
            if state.attempt == 1 {
                self.reporter.query_text(category, &sql, false);
            }

            let rows = self.query.query(&sql).map_err(|source| WatchError::Query {
                category,
                attempt: state.attempt,
                source,
            })?;
            debug!(%category, rows = rows.len(), "check_cycle: query returned");

            let result = evaluate(category, resources, &rows, today);
            self.reporter.category_checked(&result);
            result.ensure_resolved(state.attempt)?;
            summary.results.push(result);
        }

        Ok(summary)
    }

    fn render_queries(&mut self) -> Outcome {
        let mut queries = Vec::new();
        for category in Category::ALL {
            let resources = self.config.resources(category);
            if resources.is_empty() {
                continue;
            }
            let sql = self.builder.build(category, resources);
            self.reporter.query_text(category, &sql, true);
            queries.push((category, sql));
        }
        info!(queries = queries.len(), "Dry run complete");
        let outcome = Outcome::DryRun { queries };
        self.reporter.finished(&outcome);
        outcome
    }
}
