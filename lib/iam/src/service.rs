//! Role management by email address.
//!
//! Administrators name users by email; the store knows them by subject. The
//! service resolves one to the other through the identity directory and
//! hands the subject to the gateway.

use crate::error::IamError;
use crate::gateway::AuthorizationGateway;
use crate::store::IdentityDirectory;
use open_console_core::SubjectId;
use open_console_platform_access::{CallerContext, ClaimsExtractor, Role, RoleSet};
use rootcause::prelude::Report;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Assigns, revokes and reads roles of users identified by email.
#[derive(Clone)]
pub struct RoleSyncService {
    gateway: AuthorizationGateway,
    directory: Arc<dyn IdentityDirectory>,
    extractor: ClaimsExtractor,
}

impl RoleSyncService {
    /// Creates a service from its collaborators.
    #[must_use]
    pub fn new(
        gateway: AuthorizationGateway,
        directory: Arc<dyn IdentityDirectory>,
        extractor: ClaimsExtractor,
    ) -> Self {
        Self {
            gateway,
            directory,
            extractor,
        }
    }

    /// Returns the gateway, for operations that already know the subject.
    #[must_use]
    pub fn gateway(&self) -> &AuthorizationGateway {
        &self.gateway
    }

    /// Grants `role` to the user with `email`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown email, and gateway errors unchanged.
    pub async fn assign_role(&self, email: &str, role: Role) -> Result<(), Report<IamError>> {
        self.assign_roles(email, &[role]).await
    }

    /// Grants `roles` to the user with `email`, keeping roles already held.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown email, and gateway errors unchanged.
    #[instrument(skip(self))]
    pub async fn assign_roles(&self, email: &str, roles: &[Role]) -> Result<(), Report<IamError>> {
        let subject = self.resolve_subject(email).await?;
        self.gateway.assign_roles(&subject, roles).await?;
        info!(subject = %subject, "roles assigned");
        Ok(())
    }

    /// Revokes `role` from the user with `email`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown email or a user without a grant,
    /// and gateway errors unchanged.
    #[instrument(skip(self))]
    pub async fn remove_role(&self, email: &str, role: Role) -> Result<(), Report<IamError>> {
        let subject = self.resolve_subject(email).await?;
        self.gateway.remove_role(&subject, role).await?;
        info!(subject = %subject, "role removed");
        Ok(())
    }

    /// Returns the roles the store holds for the user with `email`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown email, and gateway errors unchanged.
    #[instrument(skip(self))]
    pub async fn get_user_roles(&self, email: &str) -> Result<RoleSet, Report<IamError>> {
        let subject = self.resolve_subject(email).await?;
        self.gateway.get_user_roles(&subject).await
    }

    /// Returns the email address of `subject`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown subject or one without email.
    #[instrument(skip(self))]
    pub async fn get_user_email(&self, subject: &SubjectId) -> Result<String, Report<IamError>> {
        let email = self.directory.email_by_subject(subject).await?;
        debug!(%email, "subject resolved");
        Ok(email)
    }

    /// Returns the caller's roles as carried by its token.
    ///
    /// Reads claims only; the store is not consulted, so roles granted since
    /// the token was issued are not reflected. No caller means no roles.
    #[must_use]
    pub fn get_current_user_roles(&self, caller: Option<&CallerContext>) -> RoleSet {
        caller
            .map(|caller| caller.roles(&self.extractor))
            .unwrap_or_default()
    }

    async fn resolve_subject(&self, email: &str) -> Result<SubjectId, Report<IamError>> {
        let subject = self.directory.subject_by_email(email).await?;
        debug!(subject = %subject, "email resolved");
        Ok(subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryIam, StoreCall};
    use open_console_platform_access::{ClaimsBag, OidcConfig};
    use serde_json::json;

    fn subject(id: &str) -> SubjectId {
        SubjectId::new(id).expect("valid id")
    }

    fn keys(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    fn service(iam: &Arc<InMemoryIam>) -> RoleSyncService {
        RoleSyncService::new(
            AuthorizationGateway::new(iam.clone()),
            iam.clone(),
            ClaimsExtractor::default(),
        )
    }

    fn alice() -> Arc<InMemoryIam> {
        Arc::new(InMemoryIam::new().with_user("alice@example.com", subject("u1")))
    }

    #[tokio::test]
    async fn assign_by_email() {
        let iam = alice();
        let service = service(&iam);

        service
            .assign_roles("alice@example.com", &[Role::UserA, Role::UserB])
            .await
            .expect("assign");

        let roles = service
            .get_user_roles("alice@example.com")
            .await
            .expect("roles");
        assert_eq!(roles.roles(), &[Role::UserA, Role::UserB]);
    }

    #[tokio::test]
    async fn repeated_assignment_is_idempotent() {
        let iam = alice();
        let service = service(&iam);

        service.assign_role("alice@example.com", Role::Admin).await.expect("assign");
        service.assign_role("alice@example.com", Role::Admin).await.expect("assign");

        let grant = iam.grant_for(&subject("u1")).expect("grant");
        assert_eq!(grant.role_keys, keys(&["admin"]));
    }

    #[tokio::test]
    async fn existing_grant_is_merged() {
        let iam = alice();
        let g1 = iam.seed_grant(&subject("u1"), &["admin"]).expect("seed");
        let service = service(&iam);

        service.assign_role("alice@example.com", Role::UserA).await.expect("assign");

        assert!(iam.calls().contains(&StoreCall::Update {
            grant: g1.to_string(),
            role_keys: keys(&["admin", "userA"])
        }));
    }

    #[tokio::test]
    async fn remove_by_email() {
        let iam = alice();
        iam.seed_grant(&subject("u1"), &["admin", "user"]).expect("seed");
        let service = service(&iam);

        service.remove_role("alice@example.com", Role::Admin).await.expect("remove");
        service.remove_role("alice@example.com", Role::UserC).await.expect("remove");

        let roles = service
            .get_user_roles("alice@example.com")
            .await
            .expect("roles");
        assert_eq!(roles.roles(), &[Role::User]);
    }

    #[tokio::test]
    async fn unknown_email_never_reaches_the_store() {
        let iam = alice();
        let service = service(&iam);

        let err = service
            .assign_role("bob@example.com", Role::Admin)
            .await
            .unwrap_err();
        assert!(err.current_context().is_not_found());

        let err = service.get_user_roles("bob@example.com").await.unwrap_err();
        assert!(err.current_context().is_not_found());

        assert!(iam.calls().is_empty());
    }

    #[tokio::test]
    async fn remove_without_grant_is_not_found() {
        let iam = alice();
        let err = service(&iam)
            .remove_role("alice@example.com", Role::Admin)
            .await
            .unwrap_err();
        assert!(err.current_context().is_not_found());
    }

    #[tokio::test]
    async fn store_failures_propagate() {
        let iam = alice();
        iam.fail_next(IamError::TransportFailure {
            status: Some(502),
            details: "bad gateway".to_string(),
        });

        let err = service(&iam)
            .get_user_roles("alice@example.com")
            .await
            .unwrap_err();
        assert!(matches!(
            err.current_context(),
            IamError::TransportFailure {
                status: Some(502),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn user_email_by_subject() {
        let iam = alice();
        let service = service(&iam);

        assert_eq!(
            service.get_user_email(&subject("u1")).await.expect("email"),
            "alice@example.com"
        );
        let err = service.get_user_email(&subject("u9")).await.unwrap_err();
        assert!(err.current_context().is_not_found());
    }

    #[tokio::test]
    async fn current_user_roles_come_from_claims() {
        let iam = alice();
        let service = service(&iam);

        let claims: ClaimsBag = serde_json::from_value(json!({
            "sub": "u1",
            "urn:zitadel:iam:org:project:roles": {"userB": {"o1": "idp.example.com"}},
            "roles": ["admin"]
        }))
        .expect("claims");
        let caller = CallerContext::from_claims(claims, &OidcConfig::default()).expect("caller");

        let roles = service.get_current_user_roles(Some(&caller));
        assert_eq!(roles.roles(), &[Role::Admin, Role::UserB]);
        assert!(service.get_current_user_roles(None).is_empty());
        assert!(iam.calls().is_empty());
    }
}
