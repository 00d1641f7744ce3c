//! In-memory identity provider.
//!
//! Behaves like the real store where it matters to callers: one grant per
//! subject on create, full replacement on update, `NotFound` for unknown
//! users and grants. Every store call is recorded so tests can assert on the
//! exact sequence.

use crate::error::IamError;
use crate::store::{AuthorizationStore, IdentityDirectory};
use crate::types::{Grant, GrantState};
use async_trait::async_trait;
use open_console_core::{GrantId, SubjectId};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A recorded call to the authorization store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// `create_grant`
    Create { subject: String, role_keys: Vec<String> },
    /// `update_grant`
    Update { grant: String, role_keys: Vec<String> },
    /// `list_grants`
    List { subject: String },
    /// `delete_grant`
    Delete { grant: String },
}

#[derive(Debug, Default)]
struct State {
    users: Vec<(String, SubjectId)>,
    grants: Vec<Grant>,
    calls: Vec<StoreCall>,
    next_grant: u64,
    fail_next: Option<IamError>,
}

impl State {
    fn next_grant_id(&mut self) -> Result<GrantId, IamError> {
        self.next_grant += 1;
        GrantId::new(format!("grant-{}", self.next_grant))
            .map_err(|e| IamError::transport(e.to_string()))
    }
}

/// Identity directory and authorization store backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryIam {
    state: Mutex<State>,
}

impl InMemoryIam {
    /// Creates an empty provider with no users and no grants.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user.
    #[must_use]
    pub fn with_user(self, email: &str, subject: SubjectId) -> Self {
        self.state().users.push((email.to_string(), subject));
        self
    }

    /// Inserts a grant directly, bypassing the one-grant-per-subject check.
    ///
    /// # Errors
    ///
    /// Fails only if the generated grant id is rejected.
    pub fn seed_grant(&self, subject: &SubjectId, role_keys: &[&str]) -> Result<GrantId, IamError> {
        let mut state = self.state();
        let id = state.next_grant_id()?;
        state.grants.push(Grant {
            id: id.clone(),
            subject: subject.clone(),
            role_keys: role_keys.iter().map(|key| (*key).to_string()).collect(),
            state: GrantState::Active,
        });
        Ok(id)
    }

    /// Returns the first grant of `subject`, if any.
    #[must_use]
    pub fn grant_for(&self, subject: &SubjectId) -> Option<Grant> {
        self.state()
            .grants
            .iter()
            .find(|grant| &grant.subject == subject)
            .cloned()
    }

    /// Returns the store calls made so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state().calls.clone()
    }

    /// Makes the next store call fail with `error` instead of running.
    pub fn fail_next(&self, error: IamError) {
        self.state().fail_next = Some(error);
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: StoreCall) -> Result<MutexGuard<'_, State>, IamError> {
        let mut state = self.state();
        state.calls.push(call);
        match state.fail_next.take() {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }
}

#[async_trait]
impl AuthorizationStore for InMemoryIam {
    async fn create_grant(
        &self,
        subject: &SubjectId,
        role_keys: &[String],
    ) -> Result<GrantId, IamError> {
        let mut state = self.record(StoreCall::Create {
            subject: subject.to_string(),
            role_keys: role_keys.to_vec(),
        })?;

        if state.grants.iter().any(|grant| &grant.subject == subject) {
            return Err(IamError::Conflict {
                details: format!("grant for {subject} already exists"),
            });
        }

        let id = state.next_grant_id()?;
        state.grants.push(Grant {
            id: id.clone(),
            subject: subject.clone(),
            role_keys: role_keys.to_vec(),
            state: GrantState::Active,
        });
        Ok(id)
    }

    async fn update_grant(&self, grant: &GrantId, role_keys: &[String]) -> Result<(), IamError> {
        let mut state = self.record(StoreCall::Update {
            grant: grant.to_string(),
            role_keys: role_keys.to_vec(),
        })?;

        let stored = state
            .grants
            .iter_mut()
            .find(|stored| &stored.id == grant)
            .ok_or_else(|| IamError::not_found(format!("grant {grant}")))?;
        stored.role_keys = role_keys.to_vec();
        Ok(())
    }

    async fn list_grants(&self, subject: &SubjectId) -> Result<Vec<Grant>, IamError> {
        let state = self.record(StoreCall::List {
            subject: subject.to_string(),
        })?;

        Ok(state
            .grants
            .iter()
            .filter(|grant| &grant.subject == subject)
            .cloned()
            .collect())
    }

    async fn delete_grant(&self, grant: &GrantId) -> Result<(), IamError> {
        let mut state = self.record(StoreCall::Delete {
            grant: grant.to_string(),
        })?;

        let before = state.grants.len();
        state.grants.retain(|stored| &stored.id != grant);
        if state.grants.len() == before {
            return Err(IamError::not_found(format!("grant {grant}")));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryIam {
    async fn subject_by_email(&self, email: &str) -> Result<SubjectId, IamError> {
        self.state()
            .users
            .iter()
            .find(|(known, _)| known == email)
            .map(|(_, subject)| subject.clone())
            .ok_or_else(|| IamError::not_found(format!("user with email {email}")))
    }

    async fn email_by_subject(&self, subject: &SubjectId) -> Result<String, IamError> {
        self.state()
            .users
            .iter()
            .find(|(_, known)| known == subject)
            .map(|(email, _)| email.clone())
            .ok_or_else(|| IamError::not_found(format!("user {subject}")))
    }
}
