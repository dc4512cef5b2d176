//! GitHub provider
//!
//! The token endpoint only answers with JSON when asked via the `Accept`
//! header, carries no identity id, and OAuth-app tokens usually have no
//! expiry, so the id comes from the profile and a fixed fallback TTL stands
//! in for a missing `expires_in`. Display name prefers the profile `name`
//! over the `login` handle; the profile URL prefers `html_url` and falls
//! back to the canonical login-based template.

use crate::error::ExchangeStep;
use crate::models::{AuthProviderType, AuthenticationResult, AuthorizationExchange};
use crate::providers::{
    ensure_status, map_transport_err, parse_body, token_request_params, OAuthProvider,
};
use crate::transport::HttpTransport;
use crate::OAuthError;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const PROFILE_URL: &str = "https://api.github.com/user";

/// OAuth-app tokens do not expire; a bounded TTL is substituted so the
/// result always carries a populated duration.
const FALLBACK_EXPIRES_IN: u64 = 3600;

pub struct GithubProvider {
    client_id: String,
    client_secret: String,
    transport: Arc<dyn HttpTransport>,
}

#[derive(Debug, Deserialize)]
struct GithubToken {
    access_token: String,
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    id: u64,
    login: String,
    name: Option<String>,
    avatar_url: String,
    html_url: Option<String>,
}

impl GithubProvider {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            transport,
        }
    }
}

#[async_trait]
impl OAuthProvider for GithubProvider {
    fn provider_type(&self) -> AuthProviderType {
        AuthProviderType::Github
    }

    fn authorize_url(&self, redirect_url: &str) -> String {
        format!(
            "{AUTHORIZE_URL}?client_id={}&response_type=code&redirect_uri={}",
            self.client_id,
            urlencoding::encode(redirect_url)
        )
    }

    async fn authenticate(
        &self,
        exchange: &AuthorizationExchange,
    ) -> Result<AuthenticationResult, OAuthError> {
        let params = token_request_params(&self.client_id, &self.client_secret, exchange);
        log::debug!("github: requesting access token");
        let response = self
            .transport
            .post_form(TOKEN_URL, &params, &[("Accept", "application/json")])
            .await
            .map_err(|e| map_transport_err(ExchangeStep::TokenExchange, e))?;
        ensure_status(ExchangeStep::TokenExchange, &response)?;
        let token: GithubToken = parse_body(ExchangeStep::TokenExchange, &response.body)?;

        let authorization = format!("Bearer {}", token.access_token);
        log::debug!("github: fetching authenticated user");
        let response = self
            .transport
            .get(
                PROFILE_URL,
                &[
                    ("Authorization", &authorization),
                    ("Accept", "application/vnd.github+json"),
                ],
            )
            .await
            .map_err(|e| map_transport_err(ExchangeStep::ProfileFetch, e))?;
        ensure_status(ExchangeStep::ProfileFetch, &response)?;
        let user: GithubUser = parse_body(ExchangeStep::ProfileFetch, &response.body)?;

        let profile_url = user
            .html_url
            .unwrap_or_else(|| format!("https://github.com/{}", user.login));
        let display_name = user.name.unwrap_or_else(|| user.login.clone());
        Ok(AuthenticationResult {
            provider: AuthProviderType::Github,
            authentication_id: user.id.to_string(),
            access_token: token.access_token,
            expires_in: Duration::from_secs(token.expires_in.unwrap_or(FALLBACK_EXPIRES_IN)),
            display_name,
            profile_url,
            image_url: user.avatar_url,
            authenticated_at: Utc::now(),
        })
    }
}
