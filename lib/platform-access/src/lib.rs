//! Platform access primitives for Open Console.
//!
//! This crate provides:
//! - The role vocabulary (`Role`, `RoleSet`)
//! - Role extraction from token claims (`ClaimsExtractor`)
//! - Caller identity (`CallerContext`, `IdentityInfo`)
//! - OIDC claim configuration (`OidcConfig`)
//!
//! # Access Control Model
//!
//! Roles are granted per user in the identity provider's project and show up
//! in the claims of the tokens it issues:
//! - Administrators hold the `admin` role and may manage other users' roles
//! - Everyone else holds some combination of `user`, `userA`, `userB`, `userC`
//!
//! # Example
//!
//! ```
//! use open_console_platform_access::{CallerContext, ClaimsBag, OidcConfig, Role};
//!
//! let claims: ClaimsBag = serde_json::from_value(serde_json::json!({
//!     "sub": "351864415584321539",
//!     "email": "alice@example.com",
//!     "roles": ["admin", "userA"]
//! }))
//! .unwrap();
//!
//! let config = OidcConfig::default();
//! let caller = CallerContext::from_claims(claims, &config).unwrap();
//! let identity = caller.identity(&config.claims_extractor());
//!
//! assert_eq!(identity.email.as_deref(), Some("alice@example.com"));
//! assert!(identity.has_role(Role::Admin));
//! assert_eq!(identity.roles.roles(), &[Role::Admin, Role::UserA]);
//! ```

pub mod auth;
pub mod claims;
pub mod error;
pub mod oidc;
pub mod role;

// Re-export main types at crate root
pub use auth::{CallerContext, IdentityInfo, decode_token_claims};
pub use claims::{ClaimsBag, ClaimsExtractor, extract_roles};
pub use error::{AuthenticationError, AuthorizationError};
pub use oidc::{OidcConfig, OidcConfigBuilder};
pub use role::{ParseRoleError, Role, RoleSet};
