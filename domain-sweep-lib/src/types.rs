//! Core data types for the sweep pipeline.
//!
//! This module defines the records that flow through the pipeline (raw
//! transport outcomes, per-domain check results, progress events) and the
//! configuration bundle handed to every component's constructor.

use crate::error::SweepError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default primary aggregator endpoint (`code`/`data."Domain Name"` envelope).
pub const DEFAULT_PRIMARY_URL: &str = "https://v2.xxapi.cn/api/whois";

/// Default fallback aggregator endpoint (`status`/`data.raw` envelope).
pub const DEFAULT_FALLBACK_URL: &str = "https://api.whoiscx.com/whois/";

/// Canonical verdict for one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The source reports an existing registration.
    Registered,
    /// The source reports no registration (available).
    Unregistered,
    /// The lookup failed or the answer was ambiguous.
    Failed,
}

impl Status {
    pub fn is_failed(self) -> bool {
        self == Status::Failed
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Registered => "registered",
            Status::Unregistered => "unregistered",
            Status::Failed => "failed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a raw transport outcome.
///
/// HTTP transports keep the parsed JSON body when it parses and the raw text
/// otherwise. The subprocess transport and every transport-level failure use
/// `Text`.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(serde_json::Value),
    Text(String),
}

impl Payload {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Payload::Json(value) => Some(value),
            Payload::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Json(_) => None,
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Json(value) => write!(f, "{}", value),
            Payload::Text(text) => f.write_str(text),
        }
    }
}

/// What one transport attempt produced.
///
/// `code` is the HTTP status or process exit code. It is `None` only when the
/// transport never produced a response (spawn failure, connection error,
/// timeout), in which case `payload` holds the error text.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOutcome {
    pub code: Option<i32>,
    pub payload: Payload,
}

impl RawOutcome {
    /// A completed exchange with a response code.
    pub fn completed(code: i32, payload: Payload) -> Self {
        Self {
            code: Some(code),
            payload,
        }
    }

    /// The transport could not produce any response.
    pub fn unreachable<M: Into<String>>(message: M) -> Self {
        Self {
            code: None,
            payload: Payload::Text(message.into()),
        }
    }

    /// Human-readable failure detail: `"<code>: <payload>"`, or the payload
    /// verbatim when there is no code.
    pub fn error_text(&self) -> String {
        match self.code {
            Some(code) => format!("{}: {}", code, self.payload),
            None => self.payload.to_string(),
        }
    }
}

/// Result of checking one domain in one pass.
///
/// `error` is present exactly when `status` is `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// The domain that was checked (e.g. "ab.im")
    pub domain: String,

    pub status: Status,

    /// Response code of the transport whose verdict stands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_code: Option<i32>,

    /// Failure detail, only for failed checks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckResult {
    /// Build a result from the outcome that decided it.
    pub fn from_outcome(domain: &str, status: Status, outcome: &RawOutcome) -> Self {
        Self {
            domain: domain.to_string(),
            status,
            source_code: outcome.code,
            error: status.is_failed().then(|| outcome.error_text()),
        }
    }

    /// A check that faulted before any transport produced a response.
    pub fn fault<M: Into<String>>(domain: &str, message: M) -> Self {
        Self {
            domain: domain.to_string(),
            status: Status::Failed,
            source_code: None,
            error: Some(message.into()),
        }
    }

    /// Short progress detail like `(HTTP 200)` or `(code 1) error: ...`.
    pub fn detail(&self) -> String {
        let code = match self.source_code {
            Some(code) => format!("(code {})", code),
            None => "(no response)".to_string(),
        };
        match &self.error {
            Some(error) => format!("{} error: {}", code, error),
            None => code,
        }
    }
}

/// Which kind of data source a transport talks to.
///
/// The kind selects both the transport implementation and the classifier rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Local `whois` client run as a subprocess
    Whois,
    /// Aggregator API answering `{"code": 200, "data": {"Domain Name": ...}}`
    JsonApi,
    /// Aggregator API answering `{"status": 1, "data": {"raw": "..."}}`
    RawApi,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Whois => "whois",
            SourceKind::JsonApi => "json-api",
            SourceKind::RawApi => "raw-api",
        }
    }

    pub fn is_http(self) -> bool {
        !matches!(self, SourceKind::Whois)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "whois" => Ok(SourceKind::Whois),
            "json-api" | "json" => Ok(SourceKind::JsonApi),
            "raw-api" | "raw" => Ok(SourceKind::RawApi),
            other => Err(format!(
                "unknown source '{}', expected one of: whois, json-api, raw-api",
                other
            )),
        }
    }
}

/// One configured data source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Base URL for HTTP sources; ignored for `Whois`
    pub base_url: String,
    /// Opaque credential sent as a bearer token by HTTP sources
    pub api_key: Option<String>,
}

impl SourceConfig {
    pub fn whois() -> Self {
        Self {
            kind: SourceKind::Whois,
            base_url: String::new(),
            api_key: None,
        }
    }

    pub fn json_api<U: Into<String>>(base_url: U) -> Self {
        Self {
            kind: SourceKind::JsonApi,
            base_url: base_url.into(),
            api_key: None,
        }
    }

    pub fn raw_api<U: Into<String>>(base_url: U) -> Self {
        Self {
            kind: SourceKind::RawApi,
            base_url: base_url.into(),
            api_key: None,
        }
    }

    /// Source of the given kind at its default endpoint.
    pub fn default_for(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Whois => Self::whois(),
            SourceKind::JsonApi => Self::json_api(DEFAULT_PRIMARY_URL),
            SourceKind::RawApi => Self::raw_api(DEFAULT_FALLBACK_URL),
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }
}

/// Configuration bundle for one sweep.
///
/// Built once (see `config` for the file/env layering) and passed by
/// reference into every component.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    /// Maximum number of checks holding a permit at once
    /// Default: 20, Range: 1-100
    pub concurrency: usize,

    /// Additional passes over failed domains after the first
    /// Default: 2
    pub retry_budget: usize,

    /// Timeout for each individual transport call
    /// Default: 10 seconds
    pub timeout: Duration,

    /// Pause held inside the permit after each check
    /// Default: none
    pub request_delay: Duration,

    pub primary: SourceConfig,

    /// Consulted only when the primary verdict is `Failed`
    pub fallback: Option<SourceConfig>,

    /// Executable used by `Whois` sources
    /// Default: "whois"
    pub whois_binary: String,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            concurrency: 20,
            retry_budget: 2,
            timeout: Duration::from_secs(10),
            request_delay: Duration::ZERO,
            primary: SourceConfig::json_api(DEFAULT_PRIMARY_URL),
            fallback: Some(SourceConfig::raw_api(DEFAULT_FALLBACK_URL)),
            whois_binary: "whois".to_string(),
        }
    }
}

impl SweepConfig {
    /// Set the concurrency limit, capped to 1-100.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, 100);
        self
    }

    pub fn with_retry_budget(mut self, retry_budget: usize) -> Self {
        self.retry_budget = retry_budget;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_primary(mut self, primary: SourceConfig) -> Self {
        self.primary = primary;
        self
    }

    pub fn with_fallback(mut self, fallback: Option<SourceConfig>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_whois_binary<B: Into<String>>(mut self, binary: B) -> Self {
        self.whois_binary = binary.into();
        self
    }

    /// All configured sources, primary first.
    pub fn sources(&self) -> impl Iterator<Item = &SourceConfig> {
        std::iter::once(&self.primary).chain(self.fallback.iter())
    }

    /// Check configuration preconditions before any transport is built.
    ///
    /// # Errors
    ///
    /// Returns `SweepError::ConfigError` if:
    /// - concurrency is outside 1-100 or the timeout is zero
    /// - an HTTP source has a base URL that is not an http(s) URL
    /// - an API key is configured but blank
    /// - a WHOIS source is selected with a blank binary name
    pub fn validate(&self) -> Result<(), SweepError> {
        if !(1..=100).contains(&self.concurrency) {
            return Err(SweepError::config(format!(
                "concurrency must be between 1 and 100, got {}",
                self.concurrency
            )));
        }

        if self.timeout.is_zero() {
            return Err(SweepError::config("timeout must be greater than zero"));
        }

        for source in self.sources() {
            if source.kind.is_http() {
                let url = reqwest::Url::parse(&source.base_url).map_err(|e| {
                    SweepError::config(format!(
                        "invalid {} base URL '{}': {}",
                        source.kind, source.base_url, e
                    ))
                })?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(SweepError::config(format!(
                        "{} base URL must use http or https, got '{}'",
                        source.kind,
                        url.scheme()
                    )));
                }
            } else if self.whois_binary.trim().is_empty() {
                return Err(SweepError::config(
                    "whois binary name cannot be empty when a whois source is selected",
                ));
            }

            if let Some(key) = &source.api_key {
                if key.trim().is_empty() {
                    return Err(SweepError::config(format!(
                        "API key for {} source is set but blank",
                        source.kind
                    )));
                }
            }
        }

        Ok(())
    }
}

/// One landed check, as reported to the progress observer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    /// Pass number, 0 for the initial pass
    pub pass: usize,
    /// Position of the domain in this pass's input
    pub index: usize,
    /// How many checks of this pass have landed, including this one
    pub completed: usize,
    pub total: usize,
    pub domain: String,
    pub status: Status,
    pub source_code: Option<i32>,
    pub detail: String,
}

/// Notifications emitted while a sweep runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SweepEvent {
    PassStarted { pass: usize, total: usize },
    Checked(ProgressEvent),
    /// `failed` is the pending set going into the next pass
    PassFinished { pass: usize, failed: Vec<String> },
}

/// Final partition of a sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepReport {
    pub registered: Vec<String>,
    pub unregistered: Vec<String>,
    pub failed: Vec<String>,
    /// Latest result per domain, in first-seen order
    pub results: Vec<CheckResult>,
    /// Number of passes actually run
    pub passes: usize,
    /// True when the retry budget ran out with domains still failing
    pub exhausted: bool,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn result_for(&self, domain: &str) -> Option<&CheckResult> {
        self.results.iter().find(|r| r.domain == domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_text_with_code() {
        let outcome = RawOutcome::completed(502, Payload::Text("Bad Gateway".to_string()));
        assert_eq!(outcome.error_text(), "502: Bad Gateway");
    }

    #[test]
    fn test_error_text_without_code() {
        let outcome = RawOutcome::unreachable("connection refused");
        assert_eq!(outcome.error_text(), "connection refused");
    }

    #[test]
    fn test_error_text_json_payload() {
        let outcome = RawOutcome::completed(200, Payload::Json(json!({"code": 500})));
        assert_eq!(outcome.error_text(), r#"200: {"code":500}"#);
    }

    #[test]
    fn test_payload_keeps_its_variant() {
        // Text that looks like JSON stays text.
        let text = Payload::Text("{\"code\": 200}".to_string());
        assert_eq!(text.as_text(), Some("{\"code\": 200}"));
        assert!(text.as_json().is_none());

        let json = Payload::Json(serde_json::json!({"code": 200}));
        assert!(json.as_text().is_none());
        assert_eq!(json.to_string(), "{\"code\":200}");
    }

    #[test]
    fn test_check_result_error_only_when_failed() {
        let outcome = RawOutcome::completed(200, Payload::Text("ok".to_string()));

        let ok = CheckResult::from_outcome("ab.im", Status::Registered, &outcome);
        assert_eq!(ok.source_code, Some(200));
        assert!(ok.error.is_none());

        let failed = CheckResult::from_outcome("ab.im", Status::Failed, &outcome);
        assert_eq!(failed.error.as_deref(), Some("200: ok"));
    }

    #[test]
    fn test_fault_has_no_code() {
        let result = CheckResult::fault("ab.im", "task panicked");
        assert_eq!(result.status, Status::Failed);
        assert_eq!(result.source_code, None);
        assert_eq!(result.error.as_deref(), Some("task panicked"));
    }

    #[test]
    fn test_source_kind_parse() {
        assert_eq!("whois".parse::<SourceKind>(), Ok(SourceKind::Whois));
        assert_eq!("JSON-API".parse::<SourceKind>(), Ok(SourceKind::JsonApi));
        assert_eq!("raw".parse::<SourceKind>(), Ok(SourceKind::RawApi));
        assert!("rdap".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_with_concurrency_clamps() {
        assert_eq!(SweepConfig::default().with_concurrency(0).concurrency, 1);
        assert_eq!(SweepConfig::default().with_concurrency(500).concurrency, 100);
        assert_eq!(SweepConfig::default().with_concurrency(8).concurrency, 8);
    }

    #[test]
    fn test_sources_order() {
        let config = SweepConfig::default();
        let kinds: Vec<_> = config.sources().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SourceKind::JsonApi, SourceKind::RawApi]);

        let config = config.with_fallback(None);
        assert_eq!(config.sources().count(), 1);
    }

    #[test]
    fn test_validate_defaults() {
        assert!(SweepConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = SweepConfig::default();
        config.concurrency = 0;
        assert!(config.validate().unwrap_err().is_config_error());

        let config = SweepConfig::default().with_timeout(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = SweepConfig::default().with_primary(SourceConfig::json_api("not a url"));
        assert!(config.validate().is_err());

        let config =
            SweepConfig::default().with_primary(SourceConfig::json_api("ftp://example.com/api"));
        assert!(config.validate().is_err());

        let config = SweepConfig::default().with_primary(
            SourceConfig::json_api(DEFAULT_PRIMARY_URL).with_api_key(Some("  ".to_string())),
        );
        assert!(config.validate().is_err());

        let config = SweepConfig::default()
            .with_primary(SourceConfig::whois())
            .with_whois_binary("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let value = serde_json::to_value(Status::Unregistered).unwrap();
        assert_eq!(value, json!("unregistered"));
    }
}
