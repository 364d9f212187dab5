//! Error taxonomy for tool resolution
//!
//! Every failure inside the engine ends up as one of these variants before it
//! reaches the invoking layer. The type is `Clone` because a single failed
//! upstream fetch is handed to every caller waiting on the same cache key.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Resolution errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Network failure, timeout, 5xx, or an undecodable response body
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The provider refused the request (4xx: credentials, quota, bad request)
    #[error("Provider rejected request: {0}")]
    ProviderRejected(String),

    /// The provider answered successfully but had nothing for the query
    #[error("No match: {0}")]
    NoMatch(String),

    /// A financial symbol that is neither a known coin nor a plausible ticker
    #[error("Unresolved symbol: {0}")]
    SymbolUnresolved(String),

    /// The requested forecast day lies beyond what the entity provides
    #[error("Requested day is {requested} days ahead but the forecast covers {available} days")]
    HorizonExceeded { requested: u32, available: u32 },

    /// A required provider, credential or entity is not configured
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    /// Tool arguments failed validation
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

/// Stable, serializable identifier for each error variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ProviderUnavailable,
    ProviderRejected,
    NoMatch,
    SymbolUnresolved,
    HorizonExceeded,
    ConfigurationMissing,
    InvalidArguments,
}

impl ErrorKind {
    /// snake_case name, identical to the serde representation
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProviderUnavailable => "provider_unavailable",
            Self::ProviderRejected => "provider_rejected",
            Self::NoMatch => "no_match",
            Self::SymbolUnresolved => "symbol_unresolved",
            Self::HorizonExceeded => "horizon_exceeded",
            Self::ConfigurationMissing => "configuration_missing",
            Self::InvalidArguments => "invalid_arguments",
        }
    }
}

impl ResolveError {
    /// The taxonomy kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ProviderUnavailable(_) => ErrorKind::ProviderUnavailable,
            Self::ProviderRejected(_) => ErrorKind::ProviderRejected,
            Self::NoMatch(_) => ErrorKind::NoMatch,
            Self::SymbolUnresolved(_) => ErrorKind::SymbolUnresolved,
            Self::HorizonExceeded { .. } => ErrorKind::HorizonExceeded,
            Self::ConfigurationMissing(_) => ErrorKind::ConfigurationMissing,
            Self::InvalidArguments(_) => ErrorKind::InvalidArguments,
        }
    }

    /// Classify a non-success HTTP status returned by `provider`
    ///
    /// 408 and 5xx are transient; every other 4xx (including 429 quota
    /// exhaustion) is a rejection.
    pub fn from_status(provider: &str, status: StatusCode, body: &str) -> Self {
        let body = body.trim();
        let detail = if body.is_empty() {
            format!("{provider} returned HTTP {status}")
        } else {
            format!("{provider} returned HTTP {status}: {}", truncate(body, 200))
        };

        if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
            Self::ProviderUnavailable(detail)
        } else {
            Self::ProviderRejected(detail)
        }
    }

    /// Classify a transport-level failure talking to `provider`
    pub fn from_transport(provider: &str, err: &reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_status(provider, status, "");
        }

        if err.is_timeout() {
            Self::ProviderUnavailable(format!("{provider} timed out"))
        } else if err.is_decode() {
            Self::ProviderUnavailable(format!("{provider} sent an undecodable response: {err}"))
        } else if err.is_builder() {
            Self::ConfigurationMissing(format!("{provider} request could not be built: {err}"))
        } else {
            Self::ProviderUnavailable(format!("{provider} request failed: {err}"))
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

/// Result type alias for resolution operations
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Convert ResolveError to the tool framework error
impl From<ResolveError> for voice_tools::Error {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::InvalidArguments(msg) => voice_tools::Error::InvalidParameters(msg),
            other => voice_tools::Error::Resolution {
                kind: other.kind().as_str().to_string(),
                message: other.to_string(),
            },
        }
    }
}
