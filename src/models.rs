//! Core data model for third-party sign-in
//!
//! These are the provider-agnostic values that cross the subsystem boundary:
//! the provider tag, the transient callback input, and the normalized
//! authentication result handed back to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Supported external identity services. Exactly one provider implementation
/// exists per tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProviderType {
    Weibo,
    Github,
    Google,
    Facebook,
}

impl AuthProviderType {
    /// All known provider tags, in registry order.
    pub const ALL: [Self; 4] = [Self::Weibo, Self::Github, Self::Google, Self::Facebook];

    /// Lowercase name used in configuration and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weibo => "weibo",
            Self::Github => "github",
            Self::Google => "google",
            Self::Facebook => "facebook",
        }
    }
}

impl fmt::Display for AuthProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weibo" => Ok(Self::Weibo),
            "github" => Ok(Self::Github),
            "google" => Ok(Self::Google),
            "facebook" => Ok(Self::Facebook),
            other => Err(format!("unknown auth provider: {other}")),
        }
    }
}

/// Callback input for one authorization-code exchange: the code issued by the
/// provider and the redirect URL that produced it. Call-scoped, never stored.
#[derive(Debug, Clone)]
pub struct AuthorizationExchange {
    pub code: String,
    pub redirect_url: String,
}

impl AuthorizationExchange {
    #[must_use]
    pub fn new(code: impl Into<String>, redirect_url: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            redirect_url: redirect_url.into(),
        }
    }
}

/// Normalized result of a successful authorization-code exchange.
///
/// Every field is populated: where a provider omits an optional wire field,
/// the provider substitutes its documented deterministic fallback during
/// normalization. Constructed once per exchange and immutable afterwards;
/// the caller decides what, if anything, to persist.
#[derive(Debug, Clone)]
pub struct AuthenticationResult {
    /// Which provider produced this result.
    pub provider: AuthProviderType,
    /// Stable unique identifier within the provider's namespace (the
    /// provider's opaque user id, not the display name).
    pub authentication_id: String,
    /// Opaque bearer credential.
    pub access_token: String,
    /// Time-to-live of the access token from the moment of exchange.
    pub expires_in: Duration,
    pub display_name: String,
    /// Fully qualified URL to the user's public profile.
    pub profile_url: String,
    /// Fully qualified URL to the user's avatar.
    pub image_url: String,
    /// Moment the exchange completed.
    pub authenticated_at: DateTime<Utc>,
}

impl AuthenticationResult {
    /// Absolute expiry of the access token, saturating at the largest
    /// representable timestamp for absurd wire-supplied lifetimes.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        let secs = i64::try_from(self.expires_in.as_secs()).unwrap_or(i64::MAX);
        chrono::Duration::try_seconds(secs)
            .and_then(|ttl| self.authenticated_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
