//! Configuration
//!
//! Settings are read once at process start and immutable thereafter.
//! Loaded with the following priority (highest to lowest):
//! 1. Environment variables (credential env names per provider, `RUST_LOG`)
//! 2. `Settings.toml` in `SIGNET_SECRETS_DIR` (if set and present)
//! 3. `Settings.toml` in the current directory (if present)
//! 4. Defaults

use crate::models::AuthProviderType;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub providers: Vec<ProviderSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Per-provider configuration: credentials and the enabled flag.
///
/// Credentials can be given directly or named via `*_env` environment
/// variables; the environment wins when both are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub provider: AuthProviderType,

    // Direct values (can be overridden by environment variables)
    pub client_id: Option<String>,
    pub client_secret: Option<String>,

    // Environment variable names for overrides
    pub client_id_env: Option<String>,
    pub client_secret_env: Option<String>,

    pub enabled: bool,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            provider: AuthProviderType::Weibo,
            client_id: None,
            client_secret: None,
            client_id_env: None,
            client_secret_env: None,
            enabled: true,
        }
    }
}

impl Settings {
    /// Load settings from configuration files and environment variables and
    /// initialize logging.
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file cannot be read or parsed.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_env_file();
        // Logging may already be initialized by the host application.
        let _ = env_logger::try_init();

        let mut settings = Self::default();

        let default_config_path = std::path::PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            let toml_content = fs::read_to_string(&default_config_path)?;
            settings = basic_toml::from_str(&toml_content)?;
            log::info!("loaded settings from {}", default_config_path.display());
        }

        if let Ok(secrets_dir) = std::env::var("SIGNET_SECRETS_DIR") {
            let secrets_path = std::path::Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                let secrets_toml_content = fs::read_to_string(&secrets_path)?;
                settings = basic_toml::from_str(&secrets_toml_content)?;
                log::info!("overriding settings from {}", secrets_path.display());
            } else {
                log::info!(
                    "SIGNET_SECRETS_DIR set but no Settings.toml found at {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Providers flagged as enabled (credentials unchecked; the registry
    /// validates those).
    #[must_use]
    pub fn enabled_providers(&self) -> Vec<&ProviderSettings> {
        self.providers.iter().filter(|p| p.enabled).collect()
    }

    /// Settings for one provider tag, if configured at all.
    #[must_use]
    pub fn provider(&self, tag: AuthProviderType) -> Option<&ProviderSettings> {
        self.providers.iter().find(|p| p.provider == tag)
    }

    /// Load environment variables from a `.env` file, if present.
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }
}

impl ProviderSettings {
    /// Client id, checking the named environment variable first, then the
    /// direct value.
    #[must_use]
    pub fn get_client_id(&self) -> Option<String> {
        if let Some(env_var) = &self.client_id_env {
            if let Ok(value) = std::env::var(env_var) {
                return Some(value);
            }
        }
        self.client_id.clone()
    }

    /// Client secret, checking the named environment variable first, then
    /// the direct value.
    #[must_use]
    pub fn get_client_secret(&self) -> Option<String> {
        if let Some(env_var) = &self.client_secret_env {
            if let Ok(value) = std::env::var(env_var) {
                return Some(value);
            }
        }
        self.client_secret.clone()
    }
}
