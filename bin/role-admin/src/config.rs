//! Centralized CLI configuration.
//!
//! Loaded via the `config` crate from `OPEN_CONSOLE_`-prefixed environment
//! variables, with `__` separating nested keys:
//!
//! ```text
//! OPEN_CONSOLE_ZITADEL__DOMAIN=idp.example.com
//! OPEN_CONSOLE_ZITADEL__ORGANIZATION_ID=...
//! OPEN_CONSOLE_ZITADEL__PROJECT_ID=...
//! OPEN_CONSOLE_ZITADEL__API_TOKEN=...
//! OPEN_CONSOLE_OIDC__ISSUER_URL=https://idp.example.com
//! ```

use crate::error::AdminError;
use open_console_iam::ZitadelConfig;
use open_console_platform_access::OidcConfig;
use serde::Deserialize;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "OPEN_CONSOLE";

/// CLI configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct AdminConfig {
    /// How caller identities are read from token claims.
    #[serde(default)]
    pub oidc: OidcConfig,

    /// Identity provider connection. Only commands that talk to the
    /// provider need it.
    #[serde(default)]
    pub zitadel: Option<ZitadelConfig>,
}

impl AdminConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a present setting is malformed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_source(environment())
    }

    /// Loads configuration from an explicit environment source.
    ///
    /// # Errors
    ///
    /// Returns an error if a present setting is malformed.
    pub fn from_source(source: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    /// Returns the identity provider connection settings.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if they were not provided.
    pub fn require_zitadel(&self) -> Result<&ZitadelConfig, AdminError> {
        self.zitadel.as_ref().ok_or_else(|| AdminError::Configuration {
            details: format!("{ENV_PREFIX}_ZITADEL__* settings are required for this command"),
        })
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
