//! IAM error types.

use std::fmt;

/// Errors from the identity provider's authorization and user APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IamError {
    /// A user or grant does not exist.
    NotFound {
        /// What was looked up.
        resource: String,
    },
    /// The store refused to create a record because one already exists.
    Conflict {
        /// Error details.
        details: String,
    },
    /// The call failed for any other reason.
    TransportFailure {
        /// HTTP status, if a response was received.
        status: Option<u16>,
        /// Error details or response body.
        details: String,
    },
}

impl IamError {
    /// Creates a `NotFound` error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates a `TransportFailure` without a status.
    #[must_use]
    pub fn transport(details: impl Into<String>) -> Self {
        Self::TransportFailure {
            status: None,
            details: details.into(),
        }
    }

    /// Maps an unsuccessful HTTP response to an error.
    ///
    /// 409 is a conflict and 404 is a missing resource; everything else is a
    /// transport failure carrying the status and body.
    #[must_use]
    pub fn from_status(status: u16, resource: &str, body: String) -> Self {
        match status {
            409 => Self::Conflict { details: body },
            404 => Self::not_found(resource),
            _ => Self::TransportFailure {
                status: Some(status),
                details: body,
            },
        }
    }

    /// Returns true for `Conflict`.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns true for `NotFound`.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl fmt::Display for IamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { resource } => {
                write!(f, "not found: {resource}")
            }
            Self::Conflict { details } => {
                write!(f, "conflict: {details}")
            }
            Self::TransportFailure {
                status: Some(status),
                details,
            } => {
                write!(f, "identity provider request failed with status {status}: {details}")
            }
            Self::TransportFailure {
                status: None,
                details,
            } => {
                write!(f, "identity provider request failed: {details}")
            }
        }
    }
}

impl std::error::Error for IamError {}
