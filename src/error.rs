//! Error taxonomy for the OAuth exchange subsystem
//!
//! No error here is retried internally: every failure is surfaced verbatim to
//! the caller with its kind and, where applicable, the offending HTTP status.

use crate::models::AuthProviderType;
use std::fmt;
use thiserror::Error;

/// Which of the two external calls an exchange failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeStep {
    TokenExchange,
    ProfileFetch,
}

impl fmt::Display for ExchangeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenExchange => f.write_str("token exchange"),
            Self::ProfileFetch => f.write_str("profile fetch"),
        }
    }
}

/// OAuth authentication errors.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// An enabled provider is missing required credentials. Raised while the
    /// registry is built at startup, never at call time.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The requested provider is not registered or not enabled. Expected and
    /// recoverable; no network call was made.
    #[error("provider {0} is not available")]
    ProviderUnavailable(AuthProviderType),

    /// The token endpoint answered with a non-200 status.
    #[error("token exchange failed with status {status}")]
    TokenExchangeFailed { status: u16 },

    /// The profile endpoint answered with a non-200 status.
    #[error("profile fetch failed with status {status}")]
    ProfileFetchFailed { status: u16 },

    /// A response body could not be parsed into the provider's wire shape.
    #[error("malformed {step} response: {detail}")]
    MalformedResponse { step: ExchangeStep, detail: String },

    /// The fixed request deadline elapsed before the provider answered.
    #[error("{step} timed out")]
    TransportTimeout { step: ExchangeStep },

    /// A non-timeout transport failure (connect, TLS, body read).
    #[error("{step} transport error: {detail}")]
    Transport { step: ExchangeStep, detail: String },
}
