//! Facebook provider
//!
//! Code exchange against the Graph API token endpoint, profile from
//! `me?fields=id,name,link`. The `link` field requires an app permission
//! most integrations do not hold, so the id-based template is the usual
//! profile URL. The avatar is the deterministic Graph picture URL rather
//! than a profile field.

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

const AUTHORIZE_URL: &str = "https://www.facebook.com/v19.0/dialog/oauth";
const TOKEN_URL: &str = "https://graph.facebook.com/v19.0/oauth/access_token";
const PROFILE_URL: &str = "https://graph.facebook.com/v19.0/me?fields=id,name,link";

pub struct FacebookProvider {
    client_id: String,
    client_secret: String,
    transport: Arc<dyn HttpTransport>,
}

#[derive(Debug, Deserialize)]
struct FacebookToken {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct FacebookUser {
    id: String,
    name: String,
    link: Option<String>,
}

impl FacebookProvider {
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
impl OAuthProvider for FacebookProvider {
    fn provider_type(&self) -> AuthProviderType {
        AuthProviderType::Facebook
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
        log::debug!("facebook: requesting access token");
        let response = self
            .transport
            .post_form(TOKEN_URL, &params, &[])
            .await
            .map_err(|e| map_transport_err(ExchangeStep::TokenExchange, e))?;
        ensure_status(ExchangeStep::TokenExchange, &response)?;
        let token: FacebookToken = parse_body(ExchangeStep::TokenExchange, &response.body)?;

        let authorization = format!("Bearer {}", token.access_token);
        log::debug!("facebook: fetching profile");
        let response = self
            .transport
            .get(PROFILE_URL, &[("Authorization", &authorization)])
            .await
            .map_err(|e| map_transport_err(ExchangeStep::ProfileFetch, e))?;
        ensure_status(ExchangeStep::ProfileFetch, &response)?;
        let user: FacebookUser = parse_body(ExchangeStep::ProfileFetch, &response.body)?;

        let profile_url = user
            .link
            .unwrap_or_else(|| format!("https://www.facebook.com/{}", user.id));
        let image_url = format!("https://graph.facebook.com/{}/picture?type=large", user.id);
        Ok(AuthenticationResult {
            provider: AuthProviderType::Facebook,
            authentication_id: user.id,
            access_token: token.access_token,
            expires_in: Duration::from_secs(token.expires_in),
            display_name: user.name,
            profile_url,
            image_url,
            authenticated_at: Utc::now(),
        })
    }
}
