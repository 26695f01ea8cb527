//! Plugin descriptors, the plugin registry and registration scopes.
//!
//! # Responsibility
//! - Describe plugins as data (metadata, contract, handler sourcing, UI).
//! - Hold the ordered core + additional plugin set.
//!
//! # Invariants
//! - Descriptor modules never import trusted collaborators.
//! - Core plugins always precede additional ones.
//!
//! # See also
//! - `crate::rpc::injector` for how sourcing turns into handlers.

pub mod builtin;
pub mod model;
pub mod registry;
pub mod scope;
