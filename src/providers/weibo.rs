//! Weibo provider
//!
//! Token endpoint returns the user id (`uid`) alongside the access token, so
//! the identity id comes from the token response, not the profile. The
//! public profile URL prefers the user's human-readable `domain` alias and
//! falls back to the opaque `idstr` only when no alias is set; that fallback
//! is part of the contract.

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

const AUTHORIZE_URL: &str = "https://api.weibo.com/oauth2/authorize";
const TOKEN_URL: &str = "https://api.weibo.com/oauth2/access_token";
const PROFILE_URL: &str = "https://api.weibo.com/2/users/show.json";

pub struct WeiboProvider {
    client_id: String,
    client_secret: String,
    transport: Arc<dyn HttpTransport>,
}

#[derive(Debug, Deserialize)]
struct WeiboToken {
    access_token: String,
    expires_in: u64,
    uid: String,
}

#[derive(Debug, Deserialize)]
struct WeiboUser {
    screen_name: String,
    domain: Option<String>,
    idstr: String,
    profile_image_url: String,
}

impl WeiboProvider {
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
impl OAuthProvider for WeiboProvider {
    fn provider_type(&self) -> AuthProviderType {
        AuthProviderType::Weibo
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
        log::debug!("weibo: requesting access token");
        let response = self
            .transport
            .post_form(TOKEN_URL, &params, &[])
            .await
            .map_err(|e| map_transport_err(ExchangeStep::TokenExchange, e))?;
        ensure_status(ExchangeStep::TokenExchange, &response)?;
        let token: WeiboToken = parse_body(ExchangeStep::TokenExchange, &response.body)?;

        let profile_url = format!("{PROFILE_URL}?uid={}", token.uid);
        let authorization = format!("OAuth2 {}", token.access_token);
        log::debug!("weibo: fetching profile for uid {}", token.uid);
        let response = self
            .transport
            .get(&profile_url, &[("Authorization", &authorization)])
            .await
            .map_err(|e| map_transport_err(ExchangeStep::ProfileFetch, e))?;
        ensure_status(ExchangeStep::ProfileFetch, &response)?;
        let user: WeiboUser = parse_body(ExchangeStep::ProfileFetch, &response.body)?;

        // Prefer the human-readable alias; the opaque idstr only when the
        // alias is absent.
        let profile_alias = user.domain.as_deref().unwrap_or(&user.idstr);
        Ok(AuthenticationResult {
            provider: AuthProviderType::Weibo,
            authentication_id: token.uid,
            access_token: token.access_token,
            expires_in: Duration::from_secs(token.expires_in),
            display_name: user.screen_name,
            profile_url: format!("https://weibo.com/{profile_alias}"),
            image_url: user.profile_image_url,
            authenticated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ok_json, status, StubTransport};

    fn provider(stub: Arc<StubTransport>) -> WeiboProvider {
        WeiboProvider::new("weibo-id", "weibo-secret", stub)
    }

    fn exchange() -> AuthorizationExchange {
        AuthorizationExchange::new("the-code", "https://blog.example.com/auth/callback")
    }

    const TOKEN_BODY: &str =
        r#"{"access_token":"2.00abc","expires_in":157679999,"uid":"7654321"}"#;

    #[test]
    fn authorize_url_embeds_encoded_redirect_and_is_pure() {
        let stub = Arc::new(StubTransport::sequence(vec![]));
        let provider = provider(Arc::clone(&stub));

        let url = provider.authorize_url("https://blog.example.com/auth/callback?from=/");
        assert_eq!(
            url,
            "https://api.weibo.com/oauth2/authorize?client_id=weibo-id&response_type=code\
             &redirect_uri=https%3A%2F%2Fblog.example.com%2Fauth%2Fcallback%3Ffrom%3D%2F"
        );

        // Deterministic and no network call.
        assert_eq!(
            url,
            provider.authorize_url("https://blog.example.com/auth/callback?from=/")
        );
        assert_eq!(stub.request_count(), 0);
    }

    #[tokio::test]
    async fn exchange_normalizes_token_and_profile() {
        let user = r#"{"screen_name":"Rusty","domain":"rusty","idstr":"7654321",
                       "profile_image_url":"https://tvax1.sinaimg.cn/rusty.jpg"}"#;
        let stub = Arc::new(StubTransport::sequence(vec![
            ok_json(TOKEN_BODY),
            ok_json(user),
        ]));

        let result = provider(Arc::clone(&stub))
            .authenticate(&exchange())
            .await
            .unwrap();

        // Identity id comes from the token response, expiry is seconds.
        assert_eq!(result.provider, AuthProviderType::Weibo);
        assert_eq!(result.authentication_id, "7654321");
        assert_eq!(result.access_token, "2.00abc");
        assert_eq!(result.expires_in, Duration::from_secs(157_679_999));
        assert_eq!(result.display_name, "Rusty");
        assert_eq!(result.profile_url, "https://weibo.com/rusty");
        assert_eq!(result.image_url, "https://tvax1.sinaimg.cn/rusty.jpg");

        let requests = stub.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].url, TOKEN_URL);
        assert_eq!(requests[0].param("grant_type"), Some("authorization_code"));
        assert_eq!(requests[0].param("code"), Some("the-code"));
        assert_eq!(
            requests[0].param("redirect_uri"),
            Some("https://blog.example.com/auth/callback")
        );
        assert_eq!(requests[1].method, "GET");
        assert_eq!(
            requests[1].url,
            "https://api.weibo.com/2/users/show.json?uid=7654321"
        );
        assert_eq!(requests[1].header("Authorization"), Some("OAuth2 2.00abc"));
    }

    #[tokio::test]
    async fn profile_url_falls_back_to_idstr_without_domain() {
        let user = r#"{"screen_name":"Rusty","idstr":"7654321",
                       "profile_image_url":"https://tvax1.sinaimg.cn/rusty.jpg"}"#;
        let stub = Arc::new(StubTransport::sequence(vec![
            ok_json(TOKEN_BODY),
            ok_json(user),
        ]));

        let result = provider(stub).authenticate(&exchange()).await.unwrap();
        assert_eq!(result.profile_url, "https://weibo.com/7654321");
    }

    #[tokio::test]
    async fn failed_token_exchange_skips_the_profile_fetch() {
        let stub = Arc::new(StubTransport::sequence(vec![status(403, "denied")]));

        let err = provider(Arc::clone(&stub))
            .authenticate(&exchange())
            .await
            .unwrap_err();
        match err {
            OAuthError::TokenExchangeFailed { status } => assert_eq!(status, 403),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(stub.request_count(), 1);
    }

    #[tokio::test]
    async fn unparseable_token_body_skips_the_profile_fetch() {
        let stub = Arc::new(StubTransport::sequence(vec![ok_json("<html>oops</html>")]));

        let err = provider(Arc::clone(&stub))
            .authenticate(&exchange())
            .await
            .unwrap_err();
        match err {
            OAuthError::MalformedResponse { step, .. } => {
                assert_eq!(step, ExchangeStep::TokenExchange);
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(stub.request_count(), 1);
    }

    #[tokio::test]
    async fn failed_profile_fetch_surfaces_its_status() {
        let stub = Arc::new(StubTransport::sequence(vec![
            ok_json(TOKEN_BODY),
            status(502, "bad gateway"),
        ]));

        let err = provider(stub).authenticate(&exchange()).await.unwrap_err();
        match err {
            OAuthError::ProfileFetchFailed { status } => assert_eq!(status, 502),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unparseable_profile_body_reports_the_profile_step() {
        let stub = Arc::new(StubTransport::sequence(vec![
            ok_json(TOKEN_BODY),
            ok_json("{\"screen_name\":"),
        ]));

        let err = provider(stub).authenticate(&exchange()).await.unwrap_err();
        match err {
            OAuthError::MalformedResponse { step, .. } => {
                assert_eq!(step, ExchangeStep::ProfileFetch);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
