//! Error handling for sweep setup and persistence.
//!
//! Per-domain lookup failures never surface here: they are carried as values
//! in `RawOutcome` and `CheckResult`. `SweepError` covers the things that stop
//! a run before or after the pipeline itself, such as a bad configuration, an
//! unreadable suffix file or an unwritable output directory.

use std::fmt;

/// Main error type for sweep operations.
#[derive(Debug, Clone)]
pub enum SweepError {
    /// Invalid domain or suffix input
    InvalidDomain { domain: String, reason: String },

    /// Invalid candidate generation parameters
    InvalidGeneration { reason: String },

    /// Configuration errors (invalid settings, missing credentials, etc.)
    ConfigError { message: String },

    /// Transport could not be constructed (e.g. HTTP client builder failure)
    TransportSetup { source_name: String, message: String },

    /// JSON/TOML parsing errors
    ParseError { message: String },

    /// File I/O errors when reading inputs or writing results
    FileError { path: String, message: String },

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl SweepError {
    /// Create a new invalid domain error.
    pub fn invalid_domain<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        Self::InvalidDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a new generation error.
    pub fn invalid_generation<R: Into<String>>(reason: R) -> Self {
        Self::InvalidGeneration {
            reason: reason.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new transport setup error.
    pub fn transport_setup<S: Into<String>, M: Into<String>>(source_name: S, message: M) -> Self {
        Self::TransportSetup {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error was raised by a configuration precondition.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigError { .. } | Self::TransportSetup { .. })
    }
}

impl fmt::Display for SweepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDomain { domain, reason } => {
                write!(f, "Invalid domain '{}': {}", domain, reason)
            }
            Self::InvalidGeneration { reason } => {
                write!(f, "Invalid generation parameters: {}", reason)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::TransportSetup {
                source_name,
                message,
            } => {
                write!(f, "Failed to set up {} transport: {}", source_name, message)
            }
            Self::ParseError { message } => {
                write!(f, "Parse error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for SweepError {}

impl From<reqwest::Error> for SweepError {
    fn from(err: reqwest::Error) -> Self {
        Self::transport_setup("http", err.to_string())
    }
}

impl From<serde_json::Error> for SweepError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError {
            message: format!("JSON parsing failed: {}", err),
        }
    }
}

impl From<toml::de::Error> for SweepError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError {
            message: format!("Failed to parse TOML configuration: {}", err),
        }
    }
}

impl From<std::io::Error> for SweepError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}
