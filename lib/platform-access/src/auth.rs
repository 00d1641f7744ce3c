//! Caller identity derived from token claims.
//!
//! This module provides the authentication primitives the role service
//! consumes:
//! - `CallerContext`: the claims of an already-verified token, plus its subject
//! - `IdentityInfo`: the flattened identity and role set of a caller

use crate::claims::{ClaimsBag, ClaimsExtractor};
use crate::error::{AuthenticationError, AuthorizationError};
use crate::oidc::OidcConfig;
use crate::role::{Role, RoleSet};
use base64::Engine;
use open_console_core::SubjectId;
use serde::Serialize;
use serde_json::Value;

/// The authenticated caller of an operation.
///
/// Signature and expiry checks are done before a token becomes a
/// `CallerContext`; nothing here re-validates them.
#[derive(Debug, Clone)]
pub struct CallerContext {
    subject: SubjectId,
    claims: ClaimsBag,
    email_fallback_claim: String,
}

impl CallerContext {
    /// Builds a caller context from verified claims.
    ///
    /// # Errors
    ///
    /// Returns `MissingClaim` if there is no usable `sub` claim, and
    /// `InvalidClaim` if an issuer is configured and `iss` differs from it.
    pub fn from_claims(
        claims: ClaimsBag,
        config: &OidcConfig,
    ) -> Result<Self, AuthenticationError> {
        let subject = claims
            .get("sub")
            .and_then(Value::as_str)
            .and_then(|sub| SubjectId::new(sub).ok())
            .ok_or_else(|| AuthenticationError::MissingClaim {
                claim: "sub".to_string(),
            })?;

        if let Some(expected) = config.issuer_url() {
            let issuer = claims.get("iss").and_then(Value::as_str);
            if issuer != Some(expected) {
                return Err(AuthenticationError::InvalidClaim {
                    claim: "iss".to_string(),
                    reason: format!(
                        "expected issuer '{expected}', got '{}'",
                        issuer.unwrap_or_default()
                    ),
                });
            }
        }

        Ok(Self {
            subject,
            claims,
            email_fallback_claim: config.email_fallback_claim().to_string(),
        })
    }

    /// Builds a caller context from a compact JWT.
    ///
    /// Only the payload is decoded; the token must have been verified by
    /// whoever handed it over.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` if the token is not a three-part JWT with a
    /// JSON object payload, and otherwise the errors of [`Self::from_claims`].
    pub fn from_token(token: &str, config: &OidcConfig) -> Result<Self, AuthenticationError> {
        Self::from_claims(decode_token_claims(token)?, config)
    }

    /// Returns the caller's subject.
    #[must_use]
    pub fn subject(&self) -> &SubjectId {
        &self.subject
    }

    /// Returns the raw claims.
    #[must_use]
    pub fn claims(&self) -> &ClaimsBag {
        &self.claims
    }

    /// Returns the caller's email address.
    ///
    /// Falls back to the configured fallback claim, but only when its value
    /// contains an `@`.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.string_claim("email").or_else(|| {
            self.string_claim(&self.email_fallback_claim)
                .filter(|value| value.contains('@'))
        })
    }

    /// Returns the caller's display name (`name`, then `preferred_username`).
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.string_claim("name")
            .or_else(|| self.string_claim("preferred_username"))
    }

    /// Returns the caller's roles according to `extractor`.
    #[must_use]
    pub fn roles(&self, extractor: &ClaimsExtractor) -> RoleSet {
        extractor.extract(&self.claims)
    }

    /// Flattens the caller into an `IdentityInfo`.
    #[must_use]
    pub fn identity(&self, extractor: &ClaimsExtractor) -> IdentityInfo {
        IdentityInfo {
            subject: self.subject.clone(),
            email: self.email().map(str::to_string),
            name: self.display_name().map(str::to_string),
            roles: self.roles(extractor),
        }
    }

    fn string_claim(&self, name: &str) -> Option<&str> {
        self.claims
            .get(name)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }
}

/// Decodes the payload of a compact JWT into a claims bag.
///
/// # Errors
///
/// Returns `InvalidToken` if the token is malformed.
pub fn decode_token_claims(token: &str) -> Result<ClaimsBag, AuthenticationError> {
    // JWT is base64url(header).base64url(payload).signature
    let parts: Vec<&str> = token.trim().split('.').collect();
    if parts.len() != 3 {
        return Err(AuthenticationError::InvalidToken {
            reason: "expected three dot-separated segments".to_string(),
        });
    }

    let payload_bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .map_err(|e| AuthenticationError::InvalidToken {
            reason: format!("failed to decode payload: {e}"),
        })?;

    match serde_json::from_slice(&payload_bytes) {
        Ok(Value::Object(claims)) => Ok(claims),
        Ok(_) => Err(AuthenticationError::InvalidToken {
            reason: "payload is not a JSON object".to_string(),
        }),
        Err(e) => Err(AuthenticationError::InvalidToken {
            reason: format!("failed to parse payload: {e}"),
        }),
    }
}

/// Identity and roles of a caller, as read from its token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityInfo {
    /// The identity provider's id for the caller.
    pub subject: SubjectId,
    /// Email address, if the token carries one.
    pub email: Option<String>,
    /// Display name, if the token carries one.
    pub name: Option<String>,
    /// Roles found in the token.
    pub roles: RoleSet,
}

impl IdentityInfo {
    /// Returns true if the caller holds `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }

    /// Returns true if the caller holds any of `roles`.
    #[must_use]
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.roles.contains_any(roles)
    }

    /// Checks that the caller holds at least one of `roles`.
    ///
    /// # Errors
    ///
    /// Returns `MissingRole` naming the required roles otherwise.
    pub fn require_any_role(&self, roles: &[Role]) -> Result<(), AuthorizationError> {
        if self.has_any_role(roles) {
            Ok(())
        } else {
            Err(AuthorizationError::MissingRole {
                subject: self.subject.to_string(),
                required: roles.to_vec(),
            })
        }
    }
}
