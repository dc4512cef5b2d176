//! End-to-end exchange properties over the registry and a stub transport.
//!
//! Run with `cargo test --features testing`.

use rand::Rng as _;
use signet::testing::{RecordedRequest, StubReply, StubTransport};
use signet::transport::TransportResponse;
use signet::{
    AuthProviderType, AuthorizationExchange, ExchangeStep, OAuthError, ProviderRegistry,
    ProviderSettings, Settings,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn weibo_settings() -> Settings {
    Settings {
        providers: vec![ProviderSettings {
            provider: AuthProviderType::Weibo,
            client_id: Some("weibo-id".to_string()),
            client_secret: Some("weibo-secret".to_string()),
            enabled: true,
            ..Default::default()
        }],
        ..Default::default()
    }
}

/// Stub that answers like the weibo endpoints but derives every field from
/// the authorization code, so results can be matched back to their call.
fn echoing_reply(request: &RecordedRequest) -> StubReply {
    let delay = Duration::from_millis(rand::rng().random_range(5..40));
    let body = if request.method == "POST" {
        let code = request.param("code").expect("token request carries a code");
        let n = code.trim_start_matches("code-").to_string();
        format!(
            r#"{{"access_token":"token-{n}","expires_in":{}, "uid":"uid-{n}"}}"#,
            1000 + n.parse::<u64>().unwrap()
        )
    } else {
        let n = request
            .url
            .rsplit("uid=uid-")
            .next()
            .expect("profile request names a uid")
            .to_string();
        format!(
            r#"{{"screen_name":"user-{n}","idstr":"uid-{n}",
                "profile_image_url":"https://img.example.com/{n}.png"}}"#
        )
    };
    StubReply::Delayed(delay, TransportResponse::new(200, body))
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_exchanges_do_not_cross_talk() -> anyhow::Result<()> {
    const CALLS: usize = 16;

    let stub = Arc::new(StubTransport::respond_with(echoing_reply));
    let registry = Arc::new(ProviderRegistry::with_transport(
        &weibo_settings(),
        Arc::clone(&stub) as Arc<dyn signet::HttpTransport>,
    )?);

    let mut handles = Vec::new();
    for n in 0..CALLS {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            let exchange = AuthorizationExchange::new(
                format!("code-{n}"),
                "https://blog.example.com/auth/callback",
            );
            let result = registry
                .authenticate(AuthProviderType::Weibo, &exchange)
                .await?;
            Ok::<_, OAuthError>((n, result))
        }));
    }

    for handle in handles {
        let (n, result) = handle.await??;
        // Each call sees only its own token, uid, and profile data.
        assert_eq!(result.authentication_id, format!("uid-{n}"));
        assert_eq!(result.access_token, format!("token-{n}"));
        assert_eq!(
            result.expires_in,
            Duration::from_secs(1000 + u64::try_from(n)?)
        );
        assert_eq!(result.display_name, format!("user-{n}"));
        assert_eq!(result.profile_url, format!("https://weibo.com/uid-{n}"));
        assert_eq!(result.image_url, format!("https://img.example.com/{n}.png"));
    }

    // Exactly one token and one profile request per call.
    assert_eq!(stub.request_count(), CALLS * 2);
    Ok(())
}

#[tokio::test]
async fn stalled_provider_times_out_at_the_deadline() -> anyhow::Result<()> {
    let deadline = Duration::from_millis(50);
    let stub = Arc::new(StubTransport::respond_with(|_| StubReply::Hang).with_deadline(deadline));
    let registry = ProviderRegistry::with_transport(
        &weibo_settings(),
        Arc::clone(&stub) as Arc<dyn signet::HttpTransport>,
    )?;

    let exchange = AuthorizationExchange::new("code-0", "https://blog.example.com/auth/callback");
    let started = Instant::now();
    let err = registry
        .authenticate(AuthProviderType::Weibo, &exchange)
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    match err {
        OAuthError::TransportTimeout { step } => assert_eq!(step, ExchangeStep::TokenExchange),
        other => panic!("unexpected: {other:?}"),
    }
    // Deadline plus generous scheduling tolerance, never an indefinite block.
    assert!(elapsed >= deadline - Duration::from_millis(10));
    assert!(elapsed < deadline + Duration::from_secs(1));
    assert_eq!(stub.request_count(), 1);
    Ok(())
}

#[tokio::test]
async fn disabled_provider_never_reaches_the_network() -> anyhow::Result<()> {
    let mut settings = weibo_settings();
    settings.providers[0].enabled = false;

    let stub = Arc::new(StubTransport::respond_with(echoing_reply));
    let registry = ProviderRegistry::with_transport(
        &settings,
        Arc::clone(&stub) as Arc<dyn signet::HttpTransport>,
    )?;

    let exchange = AuthorizationExchange::new("code-0", "https://blog.example.com/auth/callback");
    let err = registry
        .authenticate(AuthProviderType::Weibo, &exchange)
        .await
        .unwrap_err();
    assert!(matches!(err, OAuthError::ProviderUnavailable(AuthProviderType::Weibo)));
    assert_eq!(stub.request_count(), 0);
    Ok(())
}

#[test]
fn authorize_url_round_trips_the_redirect_through_encoding() -> anyhow::Result<()> {
    let stub = Arc::new(StubTransport::respond_with(echoing_reply));
    let registry = ProviderRegistry::with_transport(
        &weibo_settings(),
        Arc::clone(&stub) as Arc<dyn signet::HttpTransport>,
    )?;

    let redirect = "https://blog.example.com/auth/callback?return=/articles&lang=zh_CN";
    let authorize = registry.authorize_url(AuthProviderType::Weibo, redirect)?;

    // The encoded redirect_uri decodes back to the exact original value.
    let parsed = url::Url::parse(&authorize)?;
    let redirect_uri = parsed
        .query_pairs()
        .find(|(name, _)| name == "redirect_uri")
        .map(|(_, value)| value.into_owned())
        .expect("authorize URL carries redirect_uri");
    assert_eq!(redirect_uri, redirect);

    let response_type = parsed
        .query_pairs()
        .find(|(name, _)| name == "response_type")
        .map(|(_, value)| value.into_owned());
    assert_eq!(response_type.as_deref(), Some("code"));
    assert_eq!(stub.request_count(), 0);
    Ok(())
}
