//! Trusted collaborator services and their registry.
//!
//! # Responsibility
//! - Define the collaborator interfaces handler factories depend on.
//! - Gate collaborator access on the execution context.
//!
//! # See also
//! - `crate::context`

pub mod collaborators;
pub mod registry;
