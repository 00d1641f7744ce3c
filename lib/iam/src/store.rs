//! Seams to the identity provider.
//!
//! Both traits return the plain [`IamError`] rather than a report, so the
//! gateway can branch on `Conflict` before wrapping anything.

use crate::error::IamError;
use crate::types::Grant;
use async_trait::async_trait;
use open_console_core::{GrantId, SubjectId};

/// The external authorization store.
///
/// Holds at most one grant per subject within the configured scope and has
/// no atomic upsert.
#[async_trait]
pub trait AuthorizationStore: Send + Sync {
    /// Creates a grant for `subject` with `role_keys`.
    ///
    /// Fails with `Conflict` if the subject already has a grant.
    async fn create_grant(
        &self,
        subject: &SubjectId,
        role_keys: &[String],
    ) -> Result<GrantId, IamError>;

    /// Replaces the role keys of an existing grant.
    async fn update_grant(&self, grant: &GrantId, role_keys: &[String]) -> Result<(), IamError>;

    /// Lists the grants of `subject` in the configured scope.
    async fn list_grants(&self, subject: &SubjectId) -> Result<Vec<Grant>, IamError>;

    /// Deletes a grant.
    async fn delete_grant(&self, grant: &GrantId) -> Result<(), IamError>;
}

/// User lookups in the identity provider.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Resolves an email address to a subject. Unknown email is `NotFound`.
    async fn subject_by_email(&self, email: &str) -> Result<SubjectId, IamError>;

    /// Resolves a subject to its email address. Unknown subject, or one
    /// without an email, is `NotFound`.
    async fn email_by_subject(&self, subject: &SubjectId) -> Result<String, IamError>;
}
