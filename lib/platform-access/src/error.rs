//! Error types for the platform-access crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `AuthenticationError`: the caller's claims cannot establish an identity
//! - `AuthorizationError`: an identified caller lacks a required role

use crate::role::Role;
use std::fmt;

/// Errors from building a caller identity out of token claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// Missing required claim in token.
    MissingClaim { claim: String },
    /// A claim is present but unusable.
    InvalidClaim { claim: String, reason: String },
    /// The token itself could not be decoded.
    InvalidToken { reason: String },
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingClaim { claim } => {
                write!(f, "missing required claim: {claim}")
            }
            Self::InvalidClaim { claim, reason } => {
                write!(f, "invalid claim '{claim}': {reason}")
            }
            Self::InvalidToken { reason } => {
                write!(f, "invalid token: {reason}")
            }
        }
    }
}

impl std::error::Error for AuthenticationError {}

/// Errors from role checks against an identified caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    /// The caller holds none of the required roles.
    MissingRole { subject: String, required: Vec<Role> },
}

impl fmt::Display for AuthorizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRole { subject, required } => {
                let required: Vec<&str> = required.iter().map(Role::external_key).collect();
                write!(
                    f,
                    "subject {subject} holds none of the required roles: {}",
                    required.join(", ")
                )
            }
        }
    }
}

impl std::error::Error for AuthorizationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_claim_display() {
        let err = AuthenticationError::MissingClaim {
            claim: "sub".to_string(),
        };
        assert_eq!(err.to_string(), "missing required claim: sub");
    }

    #[test]
    fn invalid_claim_display() {
        let err = AuthenticationError::InvalidClaim {
            claim: "iss".to_string(),
            reason: "unexpected issuer".to_string(),
        };
        assert!(err.to_string().contains("'iss'"));
        assert!(err.to_string().contains("unexpected issuer"));
    }

    #[test]
    fn missing_role_display() {
        let err = AuthorizationError::MissingRole {
            subject: "351864415584321539".to_string(),
            required: vec![Role::Admin, Role::UserA],
        };
        assert!(err.to_string().contains("351864415584321539"));
        assert!(err.to_string().contains("admin, userA"));
    }
}
