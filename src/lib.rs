#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Third-party OAuth sign-in: exchange an authorization code issued by an
//! external identity provider for a normalized [`AuthenticationResult`].
//!
//! The flow has two halves. Before the external redirect, ask the
//! [`ProviderRegistry`] for a provider's authorize URL (pure, no I/O). On
//! callback, hand the received code and redirect URL back as an
//! [`AuthorizationExchange`]; the provider performs the token exchange and
//! profile fetch in strict sequence, with a fixed per-request timeout and no
//! internal retries, and normalizes the provider-specific wire shapes into
//! one result type.

/// Version of the signet library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod i18n;
pub mod models;
pub mod providers;
pub mod settings;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use error::{ExchangeStep, OAuthError};
pub use models::{AuthProviderType, AuthenticationResult, AuthorizationExchange};
pub use providers::{OAuthProvider, ProviderRegistry};
pub use settings::{ProviderSettings, Settings};
pub use transport::{HttpClient, HttpTransport, REQUEST_TIMEOUT};
