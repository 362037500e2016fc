//! Bounded concurrent execution of domain checks.
//!
//! `ConcurrencyGate` is a counting gate over a tokio semaphore. `BatchRunner`
//! drives one pass: it spawns a task per domain, each of which holds a permit
//! for the duration of its check, and collects the results back into input
//! order. A panicking check becomes a `Failed` result for that domain only.

use crate::checker::DomainChecker;
use crate::error::SweepError;
use crate::types::{CheckResult, ProgressEvent, SweepEvent};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{AbortHandle, JoinError};

/// Counting admission gate shared by every check of a batch.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl ConcurrencyGate {
    /// Create a gate with `limit` permits (at least one).
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// Wait for a permit. The permit is returned to the gate when dropped.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, SweepError> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| SweepError::internal("concurrency gate closed"))
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of permits currently held.
    pub fn in_flight(&self) -> usize {
        self.limit - self.semaphore.available_permits()
    }
}

/// Aborts every spawned check if the batch future is dropped mid-pass, so
/// cancelled work gives its permits back.
struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

/// Runs one pass over a list of domains through a `ConcurrencyGate`.
///
/// The runner keeps no state between passes.
#[derive(Clone)]
pub struct BatchRunner {
    checker: DomainChecker,
    gate: ConcurrencyGate,
    request_delay: Duration,
    events: Option<UnboundedSender<SweepEvent>>,
}

impl BatchRunner {
    pub fn new(checker: DomainChecker, gate: ConcurrencyGate) -> Self {
        Self {
            checker,
            gate,
            request_delay: Duration::ZERO,
            events: None,
        }
    }

    /// Pause each check for `delay` after it finishes, while still holding
    /// its permit. This spaces out requests to rate-limited sources.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Send a `SweepEvent::Checked` for every landed result.
    pub fn with_events(mut self, events: UnboundedSender<SweepEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Check every domain once.
    ///
    /// # Arguments
    ///
    /// * `pass` - Pass number, only used to label progress events
    /// * `domains` - Domains to check, in input order
    ///
    /// # Returns
    ///
    /// One `CheckResult` per input domain, at the same index.
    pub async fn run_batch(&self, pass: usize, domains: &[String]) -> Vec<CheckResult> {
        let total = domains.len();

        let handles: Vec<_> = domains
            .iter()
            .map(|domain| {
                let checker = self.checker.clone();
                let gate = self.gate.clone();
                let delay = self.request_delay;
                let domain = domain.clone();

                tokio::spawn(async move {
                    let _permit = match gate.acquire().await {
                        Ok(permit) => permit,
                        Err(e) => return CheckResult::fault(&domain, e.to_string()),
                    };
                    let result = checker.check(&domain).await;
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    result
                })
            })
            .collect();

        let _guard = AbortOnDrop(handles.iter().map(|h| h.abort_handle()).collect());

        let mut landing: FuturesUnordered<_> = handles
            .into_iter()
            .enumerate()
            .map(|(index, handle)| async move { (index, handle.await) })
            .collect();

        let mut slots: Vec<Option<CheckResult>> = vec![None; total];
        let mut completed = 0;

        while let Some((index, joined)) = landing.next().await {
            let domain = &domains[index];
            let result = match joined {
                Ok(result) => result,
                Err(err) => {
                    let message = fault_message(err);
                    tracing::warn!(%domain, error = %message, "check faulted");
                    CheckResult::fault(domain, message)
                }
            };

            completed += 1;
            self.emit(SweepEvent::Checked(ProgressEvent {
                pass,
                index,
                completed,
                total,
                domain: domain.clone(),
                status: result.status,
                source_code: result.source_code,
                detail: result.detail(),
            }));
            slots[index] = Some(result);
        }

        slots
            .into_iter()
            .zip(domains)
            .map(|(slot, domain)| {
                slot.unwrap_or_else(|| CheckResult::fault(domain, "check did not complete"))
            })
            .collect()
    }

    fn emit(&self, event: SweepEvent) {
        if let Some(events) = &self.events {
            // A closed receiver only means nobody is watching.
            let _ = events.send(event);
        }
    }
}

fn fault_message(err: JoinError) -> String {
    if err.is_cancelled() {
        return "check was cancelled".to_string();
    }
    let panic = err.into_panic();
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("check panicked: {}", message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("check panicked: {}", message)
    } else {
        "check panicked".to_string()
    }
}
