//! Role vocabulary for platform access control.
//!
//! Roles are granted in the identity provider's project and come back to us
//! in two places: the authorization store's grant records and the claims of
//! issued tokens. Both carry the role's external key (`"admin"`, `"userA"`,
//! ...), which is matched case-insensitively.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform role granted through the identity provider.
///
/// The set is closed: adding a role is a vocabulary change here, not
/// something discovered at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    /// Administrator; may manage other users' roles.
    Admin,
    /// Default user role in the identity provider's project.
    User,
    /// Tier A user.
    UserA,
    /// Tier B user.
    UserB,
    /// Tier C user.
    UserC,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 5] = [Role::Admin, Role::User, Role::UserA, Role::UserB, Role::UserC];

    /// Returns the key used for this role in the external store and in token claims.
    #[must_use]
    pub fn external_key(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
            Self::UserA => "userA",
            Self::UserB => "userB",
            Self::UserC => "userC",
        }
    }

    /// Looks up a role by its external key, ignoring ASCII case.
    ///
    /// Unknown or blank input yields `None`; the caller decides whether
    /// that is fatal.
    #[must_use]
    pub fn parse(external_key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|role| role.external_key().eq_ignore_ascii_case(external_key))
    }

    /// Returns true if this role has admin privileges.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.external_key())
    }
}

/// Error returned by the strict role parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError {
    /// The rejected input.
    pub input: String,
}

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role: '{}'", self.input)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseRoleError {
            input: s.to_string(),
        })
    }
}

impl TryFrom<String> for Role {
    type Error = ParseRoleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.external_key().to_string()
    }
}

/// Ordered, duplicate-free set of roles.
///
/// Order is first-insertion order, which keeps role lists stable between the
/// store, the token claims and what we print back to operators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Role>", into = "Vec<Role>")]
pub struct RoleSet {
    roles: Vec<Role>,
}

impl RoleSet {
    /// Creates an empty role set.
    #[must_use]
    pub fn new() -> Self {
        Self { roles: Vec::new() }
    }

    /// Adds a role if it is not already present.
    ///
    /// Returns true if the role was added.
    pub fn insert(&mut self, role: Role) -> bool {
        if self.roles.contains(&role) {
            return false;
        }
        self.roles.push(role);
        true
    }

    /// Returns true if the set contains the role.
    #[must_use]
    pub fn contains(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Returns true if the set contains any of the given roles.
    #[must_use]
    pub fn contains_any(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.contains(*role))
    }

    /// Returns true if the set contains the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(Role::is_admin)
    }

    /// Returns the roles as a slice, in insertion order.
    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Returns the number of roles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Returns an iterator over the roles.
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.roles.iter().copied()
    }

    /// Returns the external keys of the roles, in order.
    #[must_use]
    pub fn external_keys(&self) -> Vec<String> {
        self.roles
            .iter()
            .map(|role| role.external_key().to_string())
            .collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl From<Vec<Role>> for RoleSet {
    fn from(roles: Vec<Role>) -> Self {
        roles.into_iter().collect()
    }
}

impl From<RoleSet> for Vec<Role> {
    fn from(set: RoleSet) -> Self {
        set.roles
    }
}

impl Extend<Role> for RoleSet {
    fn extend<I: IntoIterator<Item = Role>>(&mut self, iter: I) {
        for role in iter {
            self.insert(role);
        }
    }
}

impl IntoIterator for RoleSet {
    type Item = Role;
    type IntoIter = std::vec::IntoIter<Role>;

    fn into_iter(self) -> Self::IntoIter {
        self.roles.into_iter()
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, role) in self.roles.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{role}")?;
        }
        f.write_str("]")
    }
}
