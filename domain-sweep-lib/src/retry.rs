//! The sweep: an initial pass plus retry passes over failed domains.
//!
//! `Sweep` owns the run state. Each pass hands the pending domains to the
//! `BatchRunner`, merges the results and keeps only the failures as the next
//! pending set. Passes never overlap. The run stops as soon as nothing is
//! pending or the retry budget is spent.

use crate::checker::DomainChecker;
use crate::concurrent::{BatchRunner, ConcurrencyGate};
use crate::error::SweepError;
use crate::types::{CheckResult, Status, SweepConfig, SweepEvent, SweepReport};
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc::UnboundedSender;

/// Latest result per domain within one run, remembering first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    order: Vec<String>,
    latest: HashMap<String, CheckResult>,
}

impl ResultSet {
    /// Insert or overwrite the result for its domain.
    pub fn insert(&mut self, result: CheckResult) {
        if !self.latest.contains_key(&result.domain) {
            self.order.push(result.domain.clone());
        }
        self.latest.insert(result.domain.clone(), result);
    }

    pub fn get(&self, domain: &str) -> Option<&CheckResult> {
        self.latest.get(domain)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Results in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &CheckResult> {
        self.order.iter().filter_map(|domain| self.latest.get(domain))
    }

    fn domains_with(&self, status: Status) -> Vec<String> {
        self.iter()
            .filter(|r| r.status == status)
            .map(|r| r.domain.clone())
            .collect()
    }
}

#[derive(Debug)]
struct RunState {
    attempt: usize,
    pending: Vec<String>,
    results: ResultSet,
}

impl RunState {
    fn new(input: &[String]) -> Self {
        let mut seen = HashSet::new();
        let pending = input
            .iter()
            .filter(|domain| seen.insert(domain.as_str()))
            .cloned()
            .collect();

        Self {
            attempt: 0,
            pending,
            results: ResultSet::default(),
        }
    }

    fn merge(&mut self, results: Vec<CheckResult>) {
        self.pending = results
            .iter()
            .filter(|r| r.status.is_failed())
            .map(|r| r.domain.clone())
            .collect();
        for result in results {
            self.results.insert(result);
        }
        self.attempt += 1;
    }

    fn into_report(self) -> SweepReport {
        let results = &self.results;
        SweepReport {
            registered: results.domains_with(Status::Registered),
            unregistered: results.domains_with(Status::Unregistered),
            failed: results.domains_with(Status::Failed),
            results: results.iter().cloned().collect(),
            passes: self.attempt,
            exhausted: !self.pending.is_empty(),
        }
    }
}

/// A configured sweep, ready to run over any number of domain lists.
///
/// # Example
///
/// ```rust,no_run
/// use domain_sweep_lib::{Sweep, SweepConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let sweep = Sweep::from_config(&SweepConfig::default())?;
///     let domains = vec!["ab.im".to_string(), "cd.im".to_string()];
///     let report = sweep.run(&domains).await;
///     println!("available: {:?}", report.unregistered);
///     Ok(())
/// }
/// ```
pub struct Sweep {
    runner: BatchRunner,
    retry_budget: usize,
    events: Option<UnboundedSender<SweepEvent>>,
}

impl Sweep {
    pub fn new(runner: BatchRunner, retry_budget: usize) -> Self {
        Self {
            runner,
            retry_budget,
            events: None,
        }
    }

    /// Validate `config` and assemble checker, gate and runner from it.
    pub fn from_config(config: &SweepConfig) -> Result<Self, SweepError> {
        let checker = DomainChecker::from_config(config)?;
        let runner = BatchRunner::new(checker, ConcurrencyGate::new(config.concurrency))
            .with_request_delay(config.request_delay);
        Ok(Self::new(runner, config.retry_budget))
    }

    /// Stream pass boundaries and per-domain progress to `events`.
    pub fn with_events(mut self, events: UnboundedSender<SweepEvent>) -> Self {
        self.runner = self.runner.with_events(events.clone());
        self.events = Some(events);
        self
    }

    pub fn runner(&self) -> &BatchRunner {
        &self.runner
    }

    pub fn retry_budget(&self) -> usize {
        self.retry_budget
    }

    /// Run the initial pass and up to `retry_budget` retry passes.
    ///
    /// Duplicate input domains are checked once. Dropping the returned future
    /// cancels the current pass and releases every permit it held.
    pub async fn run(&self, domains: &[String]) -> SweepReport {
        let mut state = RunState::new(domains);

        while !state.pending.is_empty() && state.attempt <= self.retry_budget {
            let pass = state.attempt;
            let total = state.pending.len();
            tracing::info!(pass, total, "starting pass");
            self.emit(SweepEvent::PassStarted { pass, total });

            let results = self.runner.run_batch(pass, &state.pending).await;
            state.merge(results);

            tracing::info!(pass, failed = state.pending.len(), "pass finished");
            self.emit(SweepEvent::PassFinished {
                pass,
                failed: state.pending.clone(),
            });
        }

        if !state.pending.is_empty() {
            tracing::warn!(
                failed = state.pending.len(),
                passes = state.attempt,
                "retry budget exhausted with domains still failing"
            );
        }

        state.into_report()
    }

    fn emit(&self, event: SweepEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(domain: &str, status: Status) -> CheckResult {
        CheckResult {
            domain: domain.to_string(),
            status,
            source_code: Some(200),
            error: status.is_failed().then(|| "200: x".to_string()),
        }
    }

    #[test]
    fn test_result_set_overwrites_in_place() {
        let mut set = ResultSet::default();
        set.insert(result("ab.im", Status::Failed));
        set.insert(result("cd.im", Status::Registered));
        set.insert(result("ab.im", Status::Unregistered));

        assert_eq!(set.len(), 2);
        let order: Vec<_> = set.iter().map(|r| r.domain.as_str()).collect();
        assert_eq!(order, vec!["ab.im", "cd.im"]);
        assert_eq!(set.get("ab.im").unwrap().status, Status::Unregistered);
    }

    #[test]
    fn test_run_state_dedupes_input() {
        let input: Vec<String> = ["ab.im", "cd.im", "ab.im"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let state = RunState::new(&input);
        assert_eq!(state.pending, vec!["ab.im", "cd.im"]);
        assert_eq!(state.attempt, 0);
    }

    #[test]
    fn test_merge_recomputes_pending() {
        let input = vec!["ab.im".to_string(), "cd.im".to_string()];
        let mut state = RunState::new(&input);

        state.merge(vec![
            result("ab.im", Status::Failed),
            result("cd.im", Status::Registered),
        ]);
        assert_eq!(state.pending, vec!["ab.im"]);
        assert_eq!(state.attempt, 1);

        state.merge(vec![result("ab.im", Status::Unregistered)]);
        assert!(state.pending.is_empty());

        let report = state.into_report();
        assert_eq!(report.registered, vec!["cd.im"]);
        assert_eq!(report.unregistered, vec!["ab.im"]);
        assert!(report.failed.is_empty());
        assert_eq!(report.passes, 2);
        assert!(!report.exhausted);
    }
}
