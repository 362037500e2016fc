//! Lookup transports.
//!
//! A transport performs one raw query against one data source for one domain.
//! Every failure mode (spawn error, connection error, timeout, non-zero exit)
//! comes back inside the `RawOutcome`; `attempt` never returns an error.

/// HTTP aggregator APIs
pub mod http;

/// Local WHOIS client run as a subprocess
pub mod whois;

pub use http::HttpTransport;
pub use whois::{is_whois_available, WhoisTransport};

use crate::error::SweepError;
use crate::types::{RawOutcome, SourceConfig, SourceKind, SweepConfig};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// One data source capable of a single raw lookup.
#[async_trait]
pub trait LookupTransport: Send + Sync {
    /// Which classifier rule applies to this transport's outcomes.
    fn kind(&self) -> SourceKind;

    /// Query the source for `domain`, bounded by `timeout`.
    async fn attempt(&self, domain: &str, timeout: Duration) -> RawOutcome;
}

/// Construct the transport for a configured source.
///
/// # Errors
///
/// Returns `SweepError::TransportSetup` if the HTTP client cannot be built.
pub fn build_transport(
    source: &SourceConfig,
    config: &SweepConfig,
) -> Result<Arc<dyn LookupTransport>, SweepError> {
    let transport: Arc<dyn LookupTransport> = match source.kind {
        SourceKind::Whois => Arc::new(WhoisTransport::new(config.whois_binary.clone())),
        SourceKind::JsonApi | SourceKind::RawApi => Arc::new(HttpTransport::new(source)?),
    };
    Ok(transport)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_transport_kinds() {
        let config = SweepConfig::default();

        let primary = build_transport(&config.primary, &config).unwrap();
        assert_eq!(primary.kind(), SourceKind::JsonApi);

        let whois = build_transport(&SourceConfig::whois(), &config).unwrap();
        assert_eq!(whois.kind(), SourceKind::Whois);

        let raw = build_transport(&SourceConfig::default_for(SourceKind::RawApi), &config).unwrap();
        assert_eq!(raw.kind(), SourceKind::RawApi);
    }
}
