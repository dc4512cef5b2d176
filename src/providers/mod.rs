//! OAuth provider implementations
//!
//! One value-type implementation per external identity service, all behind
//! the [`OAuthProvider`] capability. Each provider performs the same strict
//! two-step sequence — token POST, then profile GET — and differs only in
//! endpoints, wire shapes, and normalization quirks. The quirks are
//! load-bearing and covered by tests.

pub mod facebook;
pub mod github;
pub mod google;
pub mod registry;
pub mod weibo;

pub use facebook::FacebookProvider;
pub use github::GithubProvider;
pub use google::GoogleProvider;
pub use registry::ProviderRegistry;
pub use weibo::WeiboProvider;

use crate::error::{ExchangeStep, OAuthError};
use crate::models::{AuthProviderType, AuthenticationResult, AuthorizationExchange};
use crate::transport::{TransportError, TransportResponse};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// Capability implemented by every identity provider.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Which variant this is; used by the registry and by callers that need
    /// to disambiguate result provenance.
    fn provider_type(&self) -> AuthProviderType;

    /// Build the authorize-redirect URL. Pure: no I/O, deterministic for
    /// identical inputs. Embeds the client id, a fixed `response_type=code`,
    /// and the URL-encoded redirect target.
    fn authorize_url(&self, redirect_url: &str) -> String;

    /// Exchange an authorization code for a normalized result.
    ///
    /// Exactly one attempt at each of the two external calls, in strict
    /// sequence; any failure is terminal for this call.
    ///
    /// # Errors
    ///
    /// Returns `TokenExchangeFailed`/`ProfileFetchFailed` for non-200
    /// statuses, `MalformedResponse` when a body does not parse,
    /// `TransportTimeout` when the fixed deadline elapses, and `Transport`
    /// for other network failures.
    async fn authenticate(
        &self,
        exchange: &AuthorizationExchange,
    ) -> Result<AuthenticationResult, OAuthError>;
}

/// Standard authorization-code token request body, shared by every provider.
pub(crate) fn token_request_params<'a>(
    client_id: &'a str,
    client_secret: &'a str,
    exchange: &'a AuthorizationExchange,
) -> [(&'static str, &'a str); 5] {
    [
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("grant_type", "authorization_code"),
        ("code", &exchange.code),
        ("redirect_uri", &exchange.redirect_url),
    ]
}

pub(crate) fn map_transport_err(step: ExchangeStep, err: TransportError) -> OAuthError {
    match err {
        TransportError::Timeout => OAuthError::TransportTimeout { step },
        TransportError::Network(detail) => OAuthError::Transport { step, detail },
    }
}

/// Fail fast on anything but 200, with the exact offending status.
pub(crate) fn ensure_status(
    step: ExchangeStep,
    response: &TransportResponse,
) -> Result<(), OAuthError> {
    if response.status == 200 {
        return Ok(());
    }
    log::warn!("{step} answered with status {}", response.status);
    match step {
        ExchangeStep::TokenExchange => Err(OAuthError::TokenExchangeFailed {
            status: response.status,
        }),
        ExchangeStep::ProfileFetch => Err(OAuthError::ProfileFetchFailed {
            status: response.status,
        }),
    }
}

/// Parse a response body into the provider's wire shape, parsed once and
/// discarded after normalization.
pub(crate) fn parse_body<T: DeserializeOwned>(
    step: ExchangeStep,
    body: &str,
) -> Result<T, OAuthError> {
    serde_json::from_str(body).map_err(|e| OAuthError::MalformedResponse {
        step,
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_request_carries_the_five_standard_fields() {
        let exchange = AuthorizationExchange::new("the-code", "https://example.com/callback");
        let params = token_request_params("id", "secret", &exchange);
        assert_eq!(
            params,
            [
                ("client_id", "id"),
                ("client_secret", "secret"),
                ("grant_type", "authorization_code"),
                ("code", "the-code"),
                ("redirect_uri", "https://example.com/callback"),
            ]
        );
    }

    #[test]
    fn ensure_status_accepts_only_200() {
        let ok = TransportResponse::new(200, "{}");
        assert!(ensure_status(ExchangeStep::TokenExchange, &ok).is_ok());

        let redirected = TransportResponse::new(302, "");
        match ensure_status(ExchangeStep::TokenExchange, &redirected) {
            Err(OAuthError::TokenExchangeFailed { status }) => assert_eq!(status, 302),
            other => panic!("unexpected: {other:?}"),
        }

        let denied = TransportResponse::new(401, "");
        match ensure_status(ExchangeStep::ProfileFetch, &denied) {
            Err(OAuthError::ProfileFetchFailed { status }) => assert_eq!(status, 401),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parse_body_reports_the_failing_step() {
        let result: Result<serde_json::Value, _> =
            parse_body(ExchangeStep::ProfileFetch, "not json");
        match result {
            Err(OAuthError::MalformedResponse { step, .. }) => {
                assert_eq!(step, ExchangeStep::ProfileFetch);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn transport_errors_keep_the_step() {
        match map_transport_err(ExchangeStep::TokenExchange, TransportError::Timeout) {
            OAuthError::TransportTimeout { step } => assert_eq!(step, ExchangeStep::TokenExchange),
            other => panic!("unexpected: {other:?}"),
        }
        match map_transport_err(
            ExchangeStep::ProfileFetch,
            TransportError::Network("refused".to_string()),
        ) {
            OAuthError::Transport { step, detail } => {
                assert_eq!(step, ExchangeStep::ProfileFetch);
                assert_eq!(detail, "refused");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
