//! Role extraction from token claims.
//!
//! The identity provider does not put roles in one fixed place. Depending on
//! the scopes requested, they show up as a flat list under `roles`, or as a
//! map keyed by role under a namespaced claim such as
//! `urn:zitadel:iam:org:project:roles`. The extractor reads all of them into a
//! single [`RoleSet`].

use crate::role::{Role, RoleSet};
use serde_json::Value;
use tracing::{debug, warn};

/// Claims of a verified token, in the order the token carried them.
pub type ClaimsBag = serde_json::Map<String, Value>;

/// Default name of the claim carrying a flat role list.
pub const DEFAULT_ROLES_CLAIM: &str = "roles";

/// Default substring identifying additional role-bearing claims.
pub const DEFAULT_ROLES_CLAIM_MARKER: &str = "roles";

/// A shape matcher inspects one claim value.
///
/// It returns false if the value does not have its shape, leaving the set
/// untouched. Otherwise it adds whatever roles it can parse and returns true.
type ShapeMatcher = fn(&str, &Value, &mut RoleSet) -> bool;

/// Tried in order; the first matcher that accepts a claim wins.
const SHAPE_MATCHERS: &[ShapeMatcher] = &[list_of_strings, map_keyed_by_role];

/// Derives a normalized role set from a claims bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimsExtractor {
    primary_claim: String,
    marker: String,
}

impl Default for ClaimsExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_ROLES_CLAIM, DEFAULT_ROLES_CLAIM_MARKER)
    }
}

impl ClaimsExtractor {
    /// Creates an extractor reading `primary_claim` as a flat list and every
    /// other claim whose name contains `marker` by shape.
    #[must_use]
    pub fn new(primary_claim: impl Into<String>, marker: impl Into<String>) -> Self {
        Self {
            primary_claim: primary_claim.into(),
            marker: marker.into(),
        }
    }

    /// Returns the name of the primary role claim.
    #[must_use]
    pub fn primary_claim(&self) -> &str {
        &self.primary_claim
    }

    /// Returns the substring marking secondary role claims.
    #[must_use]
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Extracts roles from the claims.
    ///
    /// Never fails: unrecognized role strings are logged and dropped, claims
    /// of unexpected shape are skipped, and a bag without role claims yields
    /// an empty set.
    #[must_use]
    pub fn extract(&self, claims: &ClaimsBag) -> RoleSet {
        let mut roles = RoleSet::new();

        if let Some(Value::Array(items)) = claims.get(&self.primary_claim) {
            collect_strings(&self.primary_claim, items, &mut roles);
        }

        if !self.marker.is_empty() {
            for (name, value) in claims {
                if name == &self.primary_claim || !name.contains(self.marker.as_str()) {
                    continue;
                }
                let matched = SHAPE_MATCHERS
                    .iter()
                    .any(|matcher| matcher(name, value, &mut roles));
                if !matched {
                    debug!(claim = %name, "role claim has no recognized shape; skipping");
                }
            }
        }

        roles
    }
}

/// Extracts roles with the default claim names.
#[must_use]
pub fn extract_roles(claims: &ClaimsBag) -> RoleSet {
    ClaimsExtractor::default().extract(claims)
}

fn list_of_strings(claim: &str, value: &Value, roles: &mut RoleSet) -> bool {
    match value {
        Value::Array(items) => {
            collect_strings(claim, items, roles);
            true
        }
        _ => false,
    }
}

fn map_keyed_by_role(claim: &str, value: &Value, roles: &mut RoleSet) -> bool {
    match value {
        Value::Object(entries) => {
            for key in entries.keys() {
                add_parsed(claim, key, roles);
            }
            true
        }
        _ => false,
    }
}

fn collect_strings(claim: &str, items: &[Value], roles: &mut RoleSet) {
    for item in items {
        if let Some(key) = item.as_str() {
            add_parsed(claim, key, roles);
        }
    }
}

fn add_parsed(claim: &str, key: &str, roles: &mut RoleSet) {
    match Role::parse(key) {
        Some(role) => {
            roles.insert(role);
        }
        None => warn!(claim = %claim, value = %key, "ignoring unrecognized role"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: Value) -> ClaimsBag {
        match value {
            Value::Object(map) => map,
            other => panic!("expected a JSON object, got {other}"),
        }
    }

    #[test]
    fn flat_roles_claim() {
        let claims = bag(json!({"roles": ["admin", "userA"]}));
        assert_eq!(extract_roles(&claims).roles(), &[Role::Admin, Role::UserA]);
    }

    #[test]
    fn namespaced_map_claim_uses_keys() {
        let claims = bag(json!({"urn:example:roles": {"admin": "ctx1"}}));
        assert_eq!(extract_roles(&claims).roles(), &[Role::Admin]);
    }

    #[test]
    fn no_role_claims_is_empty() {
        let claims = bag(json!({"sub": "123", "email": "a@example.com"}));
        assert!(extract_roles(&claims).is_empty());
        assert!(extract_roles(&ClaimsBag::new()).is_empty());
    }

    #[test]
    fn unknown_and_non_string_entries_are_dropped() {
        let claims = bag(json!({"roles": ["superuser", 42, null, "USERC", {"admin": 1}]}));
        assert_eq!(extract_roles(&claims).roles(), &[Role::UserC]);
    }

    #[test]
    fn claims_are_merged_in_first_seen_order() {
        let claims = bag(json!({
            "roles": ["userB", "admin"],
            "urn:zitadel:iam:org:project:roles": {
                "admin": {"orgId": "o1"},
                "user": {"orgId": "o1"}
            },
            "app_roles": ["userA", "userB"]
        }));

        assert_eq!(
            extract_roles(&claims).roles(),
            &[Role::UserB, Role::Admin, Role::User, Role::UserA]
        );
    }

    #[test]
    fn primary_claim_must_be_a_list() {
        let claims = bag(json!({"roles": "admin"}));
        assert!(extract_roles(&claims).is_empty());
    }

    #[test]
    fn secondary_claim_of_other_shape_is_skipped() {
        let claims = bag(json!({"roles_version": 3, "my_roles": ["user"]}));
        assert_eq!(extract_roles(&claims).roles(), &[Role::User]);
    }

    #[test]
    fn custom_claim_names() {
        let extractor = ClaimsExtractor::new("groups", "urn:acme:grants");
        let claims = bag(json!({
            "roles": ["admin"],
            "groups": ["user"],
            "urn:acme:grants:project": {"userA": true}
        }));

        assert_eq!(extractor.extract(&claims).roles(), &[Role::User, Role::UserA]);
        assert_eq!(extractor.primary_claim(), "groups");
        assert_eq!(extractor.marker(), "urn:acme:grants");
    }
}
