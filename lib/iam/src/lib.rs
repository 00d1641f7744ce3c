//! Role grant synchronization for Open Console.
//!
//! Roles live in the identity provider as one authorization grant per user
//! and project. This crate keeps those grants in step with what
//! administrators ask for:
//!
//! - [`AuthorizationGateway`]: create-or-merge, remove and read on a subject's grant
//! - [`RoleSyncService`]: the same operations addressed by email
//! - [`ZitadelClient`]: the HTTP implementation of the store and directory seams
//! - `InMemoryIam`: a process-local implementation for tests, behind the
//!   `test-util` feature

mod dto;
mod error;
mod gateway;
#[cfg(any(test, feature = "test-util"))]
mod memory;
mod service;
mod store;
mod types;
mod zitadel;

pub use error::IamError;
pub use gateway::AuthorizationGateway;
#[cfg(any(test, feature = "test-util"))]
pub use memory::{InMemoryIam, StoreCall};
pub use service::RoleSyncService;
pub use store::{AuthorizationStore, IdentityDirectory};
pub use types::{
    AuthorizationScope, Grant, GrantState, merge_role_keys, role_keys, without_role_key,
};
pub use zitadel::{ZitadelClient, ZitadelConfig};
