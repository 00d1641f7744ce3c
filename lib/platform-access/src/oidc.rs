//! OIDC (OpenID Connect) claim configuration.
//!
//! Token verification happens upstream; by the time claims reach this crate
//! they are trusted. What remains configurable is where in those claims the
//! caller's identity and roles live.

use crate::claims::{ClaimsExtractor, DEFAULT_ROLES_CLAIM, DEFAULT_ROLES_CLAIM_MARKER};
use serde::{Deserialize, Serialize};

/// Configuration for reading identities out of OIDC token claims.
///
/// Every field has a default, so the whole section can be omitted when
/// loading from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OidcConfig {
    /// Expected `iss` claim (e.g., "https://idp.example.com").
    /// When unset, the issuer is not checked.
    #[serde(default)]
    issuer_url: Option<String>,
    /// The claim name holding a flat list of roles.
    /// Default: "roles"
    #[serde(default = "default_roles_claim")]
    roles_claim: String,
    /// Substring identifying further role claims, such as
    /// "urn:zitadel:iam:org:project:roles".
    /// Default: "roles"
    #[serde(default = "default_roles_claim_marker")]
    roles_claim_marker: String,
    /// Claim consulted for the email address when `email` is absent.
    /// Only used if its value looks like an email address.
    /// Default: "preferred_username"
    #[serde(default = "default_email_fallback_claim")]
    email_fallback_claim: String,
}

fn default_roles_claim() -> String {
    DEFAULT_ROLES_CLAIM.to_string()
}

fn default_roles_claim_marker() -> String {
    DEFAULT_ROLES_CLAIM_MARKER.to_string()
}

fn default_email_fallback_claim() -> String {
    "preferred_username".to_string()
}

impl Default for OidcConfig {
    fn default() -> Self {
        Self {
            issuer_url: None,
            roles_claim: default_roles_claim(),
            roles_claim_marker: default_roles_claim_marker(),
            email_fallback_claim: default_email_fallback_claim(),
        }
    }
}

impl OidcConfig {
    /// Creates a configuration expecting tokens from `issuer_url`.
    #[must_use]
    pub fn new(issuer_url: String) -> Self {
        Self {
            issuer_url: Some(issuer_url),
            ..Self::default()
        }
    }

    /// Creates a configuration builder for more customization.
    #[must_use]
    pub fn builder() -> OidcConfigBuilder {
        OidcConfigBuilder::new()
    }

    /// Returns the expected issuer, if one is configured.
    #[must_use]
    pub fn issuer_url(&self) -> Option<&str> {
        self.issuer_url.as_deref()
    }

    /// Returns the name of the flat role list claim.
    #[must_use]
    pub fn roles_claim(&self) -> &str {
        &self.roles_claim
    }

    /// Returns the substring marking additional role claims.
    #[must_use]
    pub fn roles_claim_marker(&self) -> &str {
        &self.roles_claim_marker
    }

    /// Returns the claim used as email fallback.
    #[must_use]
    pub fn email_fallback_claim(&self) -> &str {
        &self.email_fallback_claim
    }

    /// Builds a claims extractor for the configured role claims.
    #[must_use]
    pub fn claims_extractor(&self) -> ClaimsExtractor {
        ClaimsExtractor::new(&self.roles_claim, &self.roles_claim_marker)
    }
}

/// Builder for `OidcConfig`.
#[derive(Debug, Default)]
pub struct OidcConfigBuilder {
    config: OidcConfig,
}

impl OidcConfigBuilder {
    /// Creates a builder with every field at its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the expected issuer.
    #[must_use]
    pub fn issuer_url(mut self, issuer_url: String) -> Self {
        self.config.issuer_url = Some(issuer_url);
        self
    }

    /// Sets the flat role list claim.
    #[must_use]
    pub fn roles_claim(mut self, claim: String) -> Self {
        self.config.roles_claim = claim;
        self
    }

    /// Sets the substring marking additional role claims.
    #[must_use]
    pub fn roles_claim_marker(mut self, marker: String) -> Self {
        self.config.roles_claim_marker = marker;
        self
    }

    /// Sets the email fallback claim.
    #[must_use]
    pub fn email_fallback_claim(mut self, claim: String) -> Self {
        self.config.email_fallback_claim = claim;
        self
    }

    /// Builds the `OidcConfig`.
    #[must_use]
    pub fn build(self) -> OidcConfig {
        self.config
    }
}
