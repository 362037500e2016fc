//! Subprocess transport around the system's WHOIS client.
//!
//! The client is run once per attempt as `<binary> <domain>`. Its exit code
//! becomes the outcome code and the combined stdout/stderr, case-folded, the
//! payload. Matching on that text is left to the classifier.

use super::LookupTransport;
use crate::types::{Payload, RawOutcome, SourceKind};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Transport that shells out to a WHOIS client.
#[derive(Debug, Clone)]
pub struct WhoisTransport {
    /// Executable name or path (e.g. "whois")
    binary: String,
}

impl WhoisTransport {
    pub fn new<B: Into<String>>(binary: B) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }
}

impl Default for WhoisTransport {
    fn default() -> Self {
        Self::new("whois")
    }
}

#[async_trait]
impl LookupTransport for WhoisTransport {
    fn kind(&self) -> SourceKind {
        SourceKind::Whois
    }

    async fn attempt(&self, domain: &str, timeout: Duration) -> RawOutcome {
        // The child is killed if the timeout drops the pending future.
        let child = Command::new(&self.binary)
            .arg(domain)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::debug!(binary = %self.binary, %domain, error = %e, "whois spawn failed");
                return RawOutcome::unreachable(format!(
                    "failed to execute '{}': {}",
                    self.binary, e
                ));
            }
            Err(_) => {
                tracing::debug!(%domain, ?timeout, "whois timed out");
                return RawOutcome::unreachable(format!(
                    "whois timed out after {:?}",
                    timeout
                ));
            }
        };

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        let text = text.to_lowercase();

        match output.status.code() {
            Some(code) => RawOutcome::completed(code, Payload::Text(text)),
            // Killed by a signal: the process ran but left no exit code.
            None => RawOutcome::unreachable(format!(
                "whois terminated without an exit code ({})",
                output.status
            )),
        }
    }
}

/// Check whether the WHOIS binary can be spawned at all.
///
/// Used to warn before a sweep whose every check would fail at spawn time.
pub async fn is_whois_available(binary: &str) -> bool {
    Command::new(binary)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_exit_zero_keeps_output() {
        let transport = WhoisTransport::new("echo");
        let outcome = transport.attempt("AB.IM", Duration::from_secs(5)).await;

        assert_eq!(outcome.code, Some(0));
        assert_eq!(outcome.payload, Payload::Text("ab.im\n".to_string()));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_reported() {
        let transport = WhoisTransport::new("false");
        let outcome = transport.attempt("ab.im", Duration::from_secs(5)).await;

        assert_eq!(outcome.code, Some(1));
    }

    #[tokio::test]
    async fn test_missing_binary_has_no_code() {
        let transport = WhoisTransport::new("definitely-not-a-whois-binary");
        let outcome = transport.attempt("ab.im", Duration::from_secs(5)).await;

        assert_eq!(outcome.code, None);
        assert!(outcome
            .error_text()
            .contains("failed to execute 'definitely-not-a-whois-binary'"));
    }

    #[tokio::test]
    async fn test_timeout_has_no_code() {
        // `sleep 5` stands in for a hung client.
        let transport = WhoisTransport::new("sleep");
        let outcome = transport.attempt("5", Duration::from_millis(100)).await;

        assert_eq!(outcome.code, None);
        assert!(outcome.error_text().contains("timed out"));
    }

    #[tokio::test]
    async fn test_is_whois_available() {
        assert!(!is_whois_available("definitely-not-a-whois-binary").await);
    }
}
