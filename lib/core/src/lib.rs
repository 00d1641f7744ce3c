//! Core types shared across the open-console crates.
//!
//! The identity provider issues every identifier this workspace handles;
//! this crate gives them distinct types so a subject can never be passed
//! where a grant is expected.

pub mod id;

pub use id::{GrantId, ParseIdError, SubjectId};
