//! Single-domain checker.
//!
//! `DomainChecker` makes one primary attempt and, only when the primary
//! verdict is `Failed`, one fallback attempt. It never retries on its own;
//! repeated attempts over time belong to the sweep's retry passes.

use crate::classify::classify;
use crate::error::SweepError;
use crate::protocols::{build_transport, LookupTransport};
use crate::types::{CheckResult, Status, SweepConfig};
use std::sync::Arc;
use std::time::Duration;

/// Checks one domain against a primary and an optional fallback source.
///
/// # Example
///
/// ```rust,no_run
/// use domain_sweep_lib::{DomainChecker, SweepConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let checker = DomainChecker::from_config(&SweepConfig::default())?;
///     let result = checker.check("ab.im").await;
///     println!("{} is {}", result.domain, result.status);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct DomainChecker {
    primary: Arc<dyn LookupTransport>,
    fallback: Option<Arc<dyn LookupTransport>>,
    timeout: Duration,
}

impl DomainChecker {
    /// Create a checker from explicit transports.
    pub fn new(
        primary: Arc<dyn LookupTransport>,
        fallback: Option<Arc<dyn LookupTransport>>,
        timeout: Duration,
    ) -> Self {
        Self {
            primary,
            fallback,
            timeout,
        }
    }

    /// Validate the configuration and build its transports.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config.validate()` fails or a
    /// transport cannot be constructed. Nothing touches the network or spawns
    /// a process before this returns.
    pub fn from_config(config: &SweepConfig) -> Result<Self, SweepError> {
        config.validate()?;

        let primary = build_transport(&config.primary, config)?;
        let fallback = config
            .fallback
            .as_ref()
            .map(|source| build_transport(source, config))
            .transpose()?;

        Ok(Self::new(primary, fallback, config.timeout))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Check one domain.
    ///
    /// # Returns
    ///
    /// A `CheckResult` whose code and error come from whichever transport
    /// decided the verdict: the fallback's whenever it was consulted.
    pub async fn check(&self, domain: &str) -> CheckResult {
        let outcome = self.primary.attempt(domain, self.timeout).await;
        let status = classify(&outcome, self.primary.kind());
        tracing::debug!(
            %domain,
            source = %self.primary.kind(),
            code = ?outcome.code,
            %status,
            "primary attempt"
        );

        if status != Status::Failed {
            return CheckResult::from_outcome(domain, status, &outcome);
        }

        let Some(fallback) = &self.fallback else {
            return CheckResult::from_outcome(domain, status, &outcome);
        };

        let outcome = fallback.attempt(domain, self.timeout).await;
        let status = classify(&outcome, fallback.kind());
        tracing::debug!(
            %domain,
            source = %fallback.kind(),
            code = ?outcome.code,
            %status,
            "fallback attempt"
        );

        CheckResult::from_outcome(domain, status, &outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Payload, RawOutcome, SourceKind};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        kind: SourceKind,
        outcome: RawOutcome,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(kind: SourceKind, outcome: RawOutcome) -> Arc<Self> {
            Arc::new(Self {
                kind,
                outcome,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LookupTransport for Fixed {
        fn kind(&self) -> SourceKind {
            self.kind
        }

        async fn attempt(&self, _domain: &str, _timeout: Duration) -> RawOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    const TIMEOUT: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn test_primary_verdict_skips_fallback() {
        let primary = Fixed::new(
            SourceKind::JsonApi,
            RawOutcome::completed(200, Payload::Json(json!({"code": 200, "data": {"Domain Name": "x"}}))),
        );
        let fallback = Fixed::new(SourceKind::RawApi, RawOutcome::unreachable("unused"));
        let checker = DomainChecker::new(primary.clone(), Some(fallback.clone()), TIMEOUT);

        let result = checker.check("cd.im").await;
        assert_eq!(result.status, Status::Registered);
        assert_eq!(result.source_code, Some(200));
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fallback_supersedes_failed_primary() {
        let primary = Fixed::new(
            SourceKind::JsonApi,
            RawOutcome::completed(500, Payload::Text("oops".to_string())),
        );
        let fallback = Fixed::new(
            SourceKind::RawApi,
            RawOutcome::completed(200, Payload::Json(json!({"status": 1, "data": {"raw": "Not found"}}))),
        );
        let checker = DomainChecker::new(primary, Some(fallback.clone()), TIMEOUT);

        let result = checker.check("ab.im").await;
        assert_eq!(result.status, Status::Unregistered);
        assert_eq!(result.source_code, Some(200));
        assert!(result.error.is_none());
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_both_failed_reports_fallback_error() {
        let primary = Fixed::new(
            SourceKind::JsonApi,
            RawOutcome::completed(500, Payload::Text("primary".to_string())),
        );
        let fallback = Fixed::new(
            SourceKind::RawApi,
            RawOutcome::completed(429, Payload::Text("slow down".to_string())),
        );
        let checker = DomainChecker::new(primary, Some(fallback), TIMEOUT);

        let result = checker.check("ab.im").await;
        assert_eq!(result.status, Status::Failed);
        assert_eq!(result.source_code, Some(429));
        assert_eq!(result.error.as_deref(), Some("429: slow down"));
    }

    #[tokio::test]
    async fn test_no_fallback_keeps_primary_failure() {
        let primary = Fixed::new(SourceKind::Whois, RawOutcome::unreachable("spawn failed"));
        let checker = DomainChecker::new(primary, None, TIMEOUT);

        let result = checker.check("ab.im").await;
        assert_eq!(result.status, Status::Failed);
        assert_eq!(result.source_code, None);
        assert_eq!(result.error.as_deref(), Some("spawn failed"));
    }

    #[test]
    fn test_from_config_validates_first() {
        let mut config = SweepConfig::default();
        config.concurrency = 0;
        assert!(DomainChecker::from_config(&config).is_err());

        let checker = DomainChecker::from_config(&SweepConfig::default()).unwrap();
        assert!(checker.has_fallback());
        assert_eq!(checker.timeout(), Duration::from_secs(10));
    }
}
