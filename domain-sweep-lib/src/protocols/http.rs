//! HTTP transport for WHOIS aggregator APIs.
//!
//! Both supported aggregators are queried with a plain GET and the domain as a
//! query parameter. The `RawApi` flavour additionally asks for the raw WHOIS
//! text with `raw=1`. The body is kept as JSON when it parses and as text
//! otherwise; judging it is the classifier's job.

use super::LookupTransport;
use crate::error::SweepError;
use crate::types::{Payload, RawOutcome, SourceConfig, SourceKind};
use async_trait::async_trait;
use std::time::Duration;

/// Transport for one aggregator endpoint.
///
/// The inner `reqwest::Client` pools connections, so one transport should be
/// shared by every check of a sweep.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    kind: SourceKind,
    base_url: String,
    api_key: Option<String>,
}

impl HttpTransport {
    /// Create a transport for an HTTP source.
    ///
    /// # Errors
    ///
    /// Returns `SweepError::TransportSetup` if the source is not an HTTP kind
    /// or the HTTP client cannot be built.
    pub fn new(source: &SourceConfig) -> Result<Self, SweepError> {
        if !source.kind.is_http() {
            return Err(SweepError::transport_setup(
                source.kind.as_str(),
                "not an HTTP source",
            ));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("domain-sweep/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SweepError::transport_setup(source.kind.as_str(), e.to_string()))?;

        Ok(Self {
            client,
            kind: source.kind,
            base_url: source.base_url.clone(),
            api_key: source.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn query(&self, domain: &str) -> Vec<(&'static str, String)> {
        let mut query = vec![("domain", domain.to_string())];
        if self.kind == SourceKind::RawApi {
            query.push(("raw", "1".to_string()));
        }
        query
    }
}

#[async_trait]
impl LookupTransport for HttpTransport {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn attempt(&self, domain: &str, timeout: Duration) -> RawOutcome {
        let mut request = self
            .client
            .get(&self.base_url)
            .query(&self.query(domain))
            .timeout(timeout);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return unreachable_from(e, timeout),
        };

        let code = i32::from(response.status().as_u16());
        let body = match response.text().await {
            Ok(body) => body,
            // Headers arrived, so the source did answer; keep its code.
            Err(e) => {
                return RawOutcome::completed(
                    code,
                    Payload::Text(format!("failed to read response body: {}", e)),
                )
            }
        };

        tracing::debug!(source = %self.kind, %domain, code, "http lookup finished");

        let payload = match serde_json::from_str::<serde_json::Value>(&body) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::Text(body),
        };
        RawOutcome::completed(code, payload)
    }
}

fn unreachable_from(err: reqwest::Error, timeout: Duration) -> RawOutcome {
    if err.is_timeout() {
        RawOutcome::unreachable(format!("request timed out after {:?}", timeout))
    } else if err.is_connect() {
        RawOutcome::unreachable(format!("connection failed: {}", err))
    } else {
        RawOutcome::unreachable(err.to_string())
    }
}
