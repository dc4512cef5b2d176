//! Provider registry
//!
//! Built once at startup from an explicit list of configured providers.
//! A provider with `enabled = false` is simply absent from the registry —
//! a first-class state, not a failure — while an enabled provider with
//! missing credentials is a fatal misconfiguration. After construction the
//! registry is read-only and safe for unbounded concurrent lookups.

use crate::error::OAuthError;
use crate::models::{AuthProviderType, AuthenticationResult, AuthorizationExchange};
use crate::providers::{
    FacebookProvider, GithubProvider, GoogleProvider, OAuthProvider, WeiboProvider,
};
use crate::settings::{ProviderSettings, Settings};
use crate::transport::{HttpClient, HttpTransport};
use std::collections::HashMap;
use std::sync::Arc;

pub struct ProviderRegistry {
    providers: HashMap<AuthProviderType, Arc<dyn OAuthProvider>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.enabled_providers())
            .finish()
    }
}

impl ProviderRegistry {
    /// Build the registry with the production transport, shared by every
    /// provider.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::Configuration` when an enabled provider is
    /// missing credentials or the shared HTTP client cannot be built.
    pub fn from_settings(settings: &Settings) -> Result<Self, OAuthError> {
        let transport = HttpClient::new()
            .map_err(|e| OAuthError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Self::with_transport(settings, Arc::new(transport))
    }

    /// Build the registry over an injected transport.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::Configuration` when an enabled provider is
    /// missing credentials.
    pub fn with_transport(
        settings: &Settings,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, OAuthError> {
        let mut providers: HashMap<AuthProviderType, Arc<dyn OAuthProvider>> = HashMap::new();

        for provider_settings in &settings.providers {
            let tag = provider_settings.provider;
            if !provider_settings.enabled {
                log::info!("oauth provider {tag} is disabled");
                continue;
            }

            let client_id = required_credential(provider_settings, "client_id")?;
            let client_secret = required_credential(provider_settings, "client_secret")?;
            let transport = Arc::clone(&transport);

            let provider: Arc<dyn OAuthProvider> = match tag {
                AuthProviderType::Weibo => {
                    Arc::new(WeiboProvider::new(client_id, client_secret, transport))
                }
                AuthProviderType::Github => {
                    Arc::new(GithubProvider::new(client_id, client_secret, transport))
                }
                AuthProviderType::Google => {
                    Arc::new(GoogleProvider::new(client_id, client_secret, transport))
                }
                AuthProviderType::Facebook => {
                    Arc::new(FacebookProvider::new(client_id, client_secret, transport))
                }
            };

            log::info!("registered oauth provider {tag}");
            // Re-registering the same tag just replaces the instance.
            providers.insert(tag, provider);
        }

        Ok(Self { providers })
    }

    /// Look up a configured provider.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::ProviderUnavailable` for an unregistered or
    /// disabled provider. No network call is made.
    pub fn get(&self, provider: AuthProviderType) -> Result<Arc<dyn OAuthProvider>, OAuthError> {
        self.providers
            .get(&provider)
            .cloned()
            .ok_or(OAuthError::ProviderUnavailable(provider))
    }

    /// Authorize-redirect URL for the given provider. Pure; no I/O.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::ProviderUnavailable` for an unregistered
    /// provider.
    pub fn authorize_url(
        &self,
        provider: AuthProviderType,
        redirect_url: &str,
    ) -> Result<String, OAuthError> {
        Ok(self.get(provider)?.authorize_url(redirect_url))
    }

    /// Resolve an authorization code into a normalized result.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::ProviderUnavailable` for an unregistered
    /// provider, or any exchange failure from the provider itself.
    pub async fn authenticate(
        &self,
        provider: AuthProviderType,
        exchange: &AuthorizationExchange,
    ) -> Result<AuthenticationResult, OAuthError> {
        self.get(provider)?.authenticate(exchange).await
    }

    /// Tags with a configured, enabled provider, in declaration order.
    #[must_use]
    pub fn enabled_providers(&self) -> Vec<AuthProviderType> {
        AuthProviderType::ALL
            .into_iter()
            .filter(|tag| self.providers.contains_key(tag))
            .collect()
    }
}

fn required_credential(settings: &ProviderSettings, field: &str) -> Result<String, OAuthError> {
    let value = match field {
        "client_id" => settings.get_client_id(),
        _ => settings.get_client_secret(),
    };
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(OAuthError::Configuration(format!(
            "provider {} is enabled but missing {field}",
            settings.provider
        ))),
    }
}
