//! Grant types for the external authorization store.

use open_console_core::{GrantId, SubjectId};
use open_console_platform_access::{Role, RoleSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed organization and project every grant is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationScope {
    /// The identity provider organization.
    pub organization_id: String,
    /// The project whose roles are granted.
    pub project_id: String,
}

impl AuthorizationScope {
    /// Creates a new scope.
    #[must_use]
    pub fn new(organization_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            organization_id: organization_id.into(),
            project_id: project_id.into(),
        }
    }
}

/// Lifecycle state of a grant, as reported by the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantState {
    /// The grant is in effect.
    Active,
    /// The grant exists but is deactivated.
    Inactive,
    /// The store did not say.
    #[default]
    Unspecified,
}

impl GrantState {
    /// Reads the store's state string (e.g. `AUTHORIZATION_STATE_ACTIVE`).
    #[must_use]
    pub fn from_wire(state: &str) -> Self {
        let state = state.to_ascii_uppercase();
        if state.contains("INACTIVE") {
            Self::Inactive
        } else if state.contains("ACTIVE") {
            Self::Active
        } else {
            Self::Unspecified
        }
    }
}

impl fmt::Display for GrantState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Unspecified => "unspecified",
        };
        f.write_str(s)
    }
}

/// A grant record binding one subject to a set of role keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    /// The store's id for this grant.
    pub id: GrantId,
    /// The subject the grant belongs to.
    pub subject: SubjectId,
    /// Role keys exactly as stored. May include keys this crate does not know.
    pub role_keys: Vec<String>,
    /// Lifecycle state.
    #[serde(default)]
    pub state: GrantState,
}

impl Grant {
    /// Returns the recognized roles of this grant.
    ///
    /// Unknown keys are dropped and duplicates collapse.
    #[must_use]
    pub fn roles(&self) -> RoleSet {
        self.role_keys
            .iter()
            .filter_map(|key| Role::parse(key))
            .collect()
    }
}

/// Unions `existing` with `requested`: existing keys first, in their order,
/// then requested keys not yet present.
///
/// Keys compare ASCII case-insensitively, as [`Role::parse`] reads them; an
/// existing key keeps its stored spelling.
#[must_use]
pub fn merge_role_keys(existing: &[String], requested: &[String]) -> Vec<String> {
    let mut merged = existing.to_vec();
    for key in requested {
        if !merged.iter().any(|held| held.eq_ignore_ascii_case(key)) {
            merged.push(key.clone());
        }
    }
    merged
}

/// Returns `keys` without any occurrence of `removed`, in any ASCII case.
#[must_use]
pub fn without_role_key(keys: &[String], removed: &str) -> Vec<String> {
    keys.iter()
        .filter(|key| !key.eq_ignore_ascii_case(removed))
        .cloned()
        .collect()
}

/// Returns the external keys of `roles`, de-duplicated, in order.
#[must_use]
pub fn role_keys(roles: &[Role]) -> Vec<String> {
    roles.iter().copied().collect::<RoleSet>().external_keys()
}
