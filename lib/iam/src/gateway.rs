//! Role grant reconciliation against the authorization store.
//!
//! The store keeps one grant per subject and offers no upsert, so assigning
//! roles is create-first: a `Conflict` means a grant already exists, and the
//! requested keys are merged into it with an update. Removal always reads the
//! grant and writes back the filtered key list.
//!
//! Both paths read then write without any version check. Two concurrent
//! mutations of the same subject's grant can lose one of the writes.

use crate::error::IamError;
use crate::store::AuthorizationStore;
use crate::types::{Grant, merge_role_keys, role_keys, without_role_key};
use open_console_core::{GrantId, SubjectId};
use open_console_platform_access::{Role, RoleSet};
use rootcause::prelude::Report;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Role operations on a subject's grant.
#[derive(Clone)]
pub struct AuthorizationGateway {
    store: Arc<dyn AuthorizationStore>,
}

impl AuthorizationGateway {
    /// Creates a gateway over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn AuthorizationStore>) -> Self {
        Self { store }
    }

    /// Grants `role` to `subject`, keeping any roles it already has.
    ///
    /// # Errors
    ///
    /// See [`Self::assign_roles`].
    pub async fn assign_role(
        &self,
        subject: &SubjectId,
        role: Role,
    ) -> Result<(), Report<IamError>> {
        self.assign_roles(subject, &[role]).await
    }

    /// Grants `roles` to `subject`, keeping any roles it already has.
    ///
    /// An empty `roles` slice does nothing.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if creation conflicted but no grant can then be
    /// found, and any store error other than the creation conflict unchanged.
    #[instrument(skip(self), fields(subject = %subject))]
    pub async fn assign_roles(
        &self,
        subject: &SubjectId,
        roles: &[Role],
    ) -> Result<(), Report<IamError>> {
        let requested = role_keys(roles);
        if requested.is_empty() {
            debug!("no roles requested");
            return Ok(());
        }

        match self.store.create_grant(subject, &requested).await {
            Ok(grant) => {
                info!(grant = %grant, roles = ?requested, "created grant");
                Ok(())
            }
            Err(e) if e.is_conflict() => {
                debug!("grant already exists; merging roles");
                let grant = self.require_grant(subject).await?;
                let merged = merge_role_keys(&grant.role_keys, &requested);
                self.store.update_grant(&grant.id, &merged).await?;
                info!(
                    grant = %grant.id,
                    previous = ?grant.role_keys,
                    roles = ?merged,
                    "merged roles into existing grant"
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Revokes `role` from `subject`.
    ///
    /// Stored keys match the role in any ASCII case. Revoking a role the
    /// grant does not hold still rewrites the grant with its current keys and
    /// is not an error.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the subject has no grant, and store errors
    /// unchanged.
    #[instrument(skip(self), fields(subject = %subject, role = %role))]
    pub async fn remove_role(
        &self,
        subject: &SubjectId,
        role: Role,
    ) -> Result<(), Report<IamError>> {
        let grant = self.require_grant(subject).await?;
        let remaining = without_role_key(&grant.role_keys, role.external_key());
        if remaining.len() == grant.role_keys.len() {
            debug!("grant does not hold the role");
        }

        self.store.update_grant(&grant.id, &remaining).await?;
        info!(grant = %grant.id, roles = ?remaining, "removed role from grant");
        Ok(())
    }

    /// Returns the recognized roles of `subject`'s grant.
    ///
    /// A subject without a grant has no roles.
    ///
    /// # Errors
    ///
    /// Returns store errors unchanged.
    #[instrument(skip(self), fields(subject = %subject))]
    pub async fn get_user_roles(&self, subject: &SubjectId) -> Result<RoleSet, Report<IamError>> {
        let roles = self
            .find_grant(subject)
            .await?
            .map(|grant| grant.roles())
            .unwrap_or_default();
        debug!(roles = %roles, "read roles");
        Ok(roles)
    }

    /// Returns `subject`'s grant, if any.
    ///
    /// The first grant the store returns is authoritative.
    ///
    /// # Errors
    ///
    /// Returns store errors unchanged.
    pub async fn find_grant(&self, subject: &SubjectId) -> Result<Option<Grant>, Report<IamError>> {
        let mut grants = self.store.list_grants(subject).await?;
        if grants.len() > 1 {
            warn!(
                subject = %subject,
                count = grants.len(),
                "subject has more than one grant; using the first"
            );
        }
        if grants.is_empty() {
            return Ok(None);
        }
        Ok(Some(grants.swap_remove(0)))
    }

    /// Deletes a grant outright.
    ///
    /// # Errors
    ///
    /// Returns store errors unchanged.
    #[instrument(skip(self))]
    pub async fn delete_grant(&self, grant: &GrantId) -> Result<(), Report<IamError>> {
        self.store.delete_grant(grant).await?;
        info!("deleted grant");
        Ok(())
    }

    async fn require_grant(&self, subject: &SubjectId) -> Result<Grant, Report<IamError>> {
        match self.find_grant(subject).await? {
            Some(grant) => Ok(grant),
            None => Err(IamError::not_found(format!("grant for {subject}")).into()),
        }
    }
}
