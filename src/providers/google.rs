//! Google provider
//!
//! Standard OpenID-flavored code exchange against the `googleapis` token
//! endpoint, profile from the `v2/userinfo` endpoint with a Bearer header.
//! The profile `link` field is only present for accounts that still have a
//! public profile page; the fallback template uses the opaque id.

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

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const PROFILE_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Scopes needed to read the signed-in user's public profile.
const SCOPE: &str = "openid profile";

pub struct GoogleProvider {
    client_id: String,
    client_secret: String,
    transport: Arc<dyn HttpTransport>,
}

#[derive(Debug, Deserialize)]
struct GoogleToken {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct GoogleUser {
    id: String,
    name: String,
    picture: String,
    link: Option<String>,
}

impl GoogleProvider {
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
impl OAuthProvider for GoogleProvider {
    fn provider_type(&self) -> AuthProviderType {
        AuthProviderType::Google
    }

    fn authorize_url(&self, redirect_url: &str) -> String {
        format!(
            "{AUTHORIZE_URL}?client_id={}&response_type=code&scope={}&redirect_uri={}",
            self.client_id,
            urlencoding::encode(SCOPE),
            urlencoding::encode(redirect_url)
        )
    }

    async fn authenticate(
        &self,
        exchange: &AuthorizationExchange,
    ) -> Result<AuthenticationResult, OAuthError> {
        let params = token_request_params(&self.client_id, &self.client_secret, exchange);
        log::debug!("google: requesting access token");
        let response = self
            .transport
            .post_form(TOKEN_URL, &params, &[])
            .await
            .map_err(|e| map_transport_err(ExchangeStep::TokenExchange, e))?;
        ensure_status(ExchangeStep::TokenExchange, &response)?;
        let token: GoogleToken = parse_body(ExchangeStep::TokenExchange, &response.body)?;

        let authorization = format!("Bearer {}", token.access_token);
        log::debug!("google: fetching userinfo");
        let response = self
            .transport
            .get(PROFILE_URL, &[("Authorization", &authorization)])
            .await
            .map_err(|e| map_transport_err(ExchangeStep::ProfileFetch, e))?;
        ensure_status(ExchangeStep::ProfileFetch, &response)?;
        let user: GoogleUser = parse_body(ExchangeStep::ProfileFetch, &response.body)?;

        let profile_url = user
            .link
            .unwrap_or_else(|| format!("https://profiles.google.com/{}", user.id));
        Ok(AuthenticationResult {
            provider: AuthProviderType::Google,
            authentication_id: user.id,
            access_token: token.access_token,
            expires_in: Duration::from_secs(token.expires_in),
            display_name: user.name,
            profile_url,
            image_url: user.picture,
            authenticated_at: Utc::now(),
        })
    }
}
