//! # Domain Sweep Library
//!
//! Checks large candidate sets of domain names for registration status
//! through WHOIS-like sources, with bounded concurrency, a primary/fallback
//! source chain and retry passes over failures.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domain_sweep_lib::generate::{generate_candidates, Alphabet};
//! use domain_sweep_lib::{Sweep, SweepConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let domains = generate_candidates(&Alphabet::default(), 2, "im")?;
//!     let sweep = Sweep::from_config(&SweepConfig::default().with_concurrency(50))?;
//!     let report = sweep.run(&domains).await;
//!
//!     println!("available: {}", report.unregistered.join(", "));
//!     println!("still failing: {}", report.failed.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! - **Transports** (`protocols`): one raw lookup, subprocess or HTTP
//! - **Classifier** (`classify`): raw outcome to registered/unregistered/failed
//! - **Checker**: primary attempt, fallback only on failure
//! - **Gate and batch runner**: one pass, bounded by a semaphore
//! - **Sweep**: initial pass plus retry passes over the failed set

pub use checker::DomainChecker;
pub use classify::classify;
pub use concurrent::{BatchRunner, ConcurrencyGate};
pub use config::{
    env_config_path, env_layer_from, load_env_config, ConfigManager, FileConfig, Settings,
    SettingsLayer,
};
pub use error::SweepError;
pub use protocols::{build_transport, HttpTransport, LookupTransport, WhoisTransport};
pub use report::{OutputWriter, RunInfo};
pub use retry::{ResultSet, Sweep};
pub use types::{
    CheckResult, Payload, ProgressEvent, RawOutcome, SourceConfig, SourceKind, Status,
    SweepConfig, SweepEvent, SweepReport, DEFAULT_FALLBACK_URL, DEFAULT_PRIMARY_URL,
};

// Public modules
pub mod generate;
pub mod protocols;
pub mod report;
pub mod suffixes;
pub mod utils;

// Internal modules, re-exported above
mod checker;
mod classify;
mod concurrent;
mod config;
mod error;
mod retry;
mod types;

/// Type alias for convenience
pub type Result<T> = std::result::Result<T, SweepError>;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
