//! Errors surfaced by the admin CLI.

use open_console_iam::IamError;
use open_console_platform_access::{AuthenticationError, AuthorizationError};
use std::fmt;

/// Everything that can stop a command.
#[derive(Debug)]
pub enum AdminError {
    /// Required settings are missing or malformed.
    Configuration { details: String },
    /// The claims file could not be read or parsed.
    ClaimsInput { details: String },
    /// The claims do not describe a usable caller.
    Authentication(AuthenticationError),
    /// The caller lacks a required role.
    Authorization(AuthorizationError),
    /// The identity provider call failed.
    Iam(IamError),
    /// The report could not be written.
    Output { details: String },
}

impl AdminError {
    /// Maps the error to the process exit code: 2 for a missing user or
    /// grant, 1 for everything else.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Iam(e) if e.is_not_found() => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { details } => write!(f, "configuration error: {details}"),
            Self::ClaimsInput { details } => write!(f, "cannot read claims: {details}"),
            Self::Authentication(e) => write!(f, "{e}"),
            Self::Authorization(e) => write!(f, "{e}"),
            Self::Iam(e) => write!(f, "{e}"),
            Self::Output { details } => write!(f, "cannot write report: {details}"),
        }
    }
}

impl std::error::Error for AdminError {}

impl From<IamError> for AdminError {
    fn from(e: IamError) -> Self {
        Self::Iam(e)
    }
}

impl From<AuthenticationError> for AdminError {
    fn from(e: AuthenticationError) -> Self {
        Self::Authentication(e)
    }
}

impl From<AuthorizationError> for AdminError {
    fn from(e: AuthorizationError) -> Self {
        Self::Authorization(e)
    }
}

impl From<config::ConfigError> for AdminError {
    fn from(e: config::ConfigError) -> Self {
        Self::Configuration {
            details: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_exits_with_two() {
        let err = AdminError::from(IamError::not_found("user with email a@example.com"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn other_failures_exit_with_one() {
        let errors = [
            AdminError::from(IamError::transport("down")),
            AdminError::from(IamError::Conflict {
                details: "exists".to_string(),
            }),
            AdminError::Configuration {
                details: "missing domain".to_string(),
            },
        ];
        for err in errors {
            assert_eq!(err.exit_code(), 1);
        }
    }

    #[test]
    fn display_passes_through_inner_errors() {
        let err = AdminError::from(AuthenticationError::MissingClaim {
            claim: "sub".to_string(),
        });
        assert_eq!(err.to_string(), "missing required claim: sub");
    }
}
