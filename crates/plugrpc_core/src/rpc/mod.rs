//! RPC composition: contracts, handlers, router table and the composed
//! endpoint.
//!
//! # Responsibility
//! - Turn a plugin snapshot into one namespaced contract/handler pair.
//! - Keep drift and factory failures isolated per plugin.
//!
//! # Invariants
//! - Composition performs no I/O; handlers do their I/O when called.
//! - Contract and handler trees share plugin-id namespaces.

pub mod contract;
pub mod contract_resolver;
pub mod endpoint;
pub mod handler;
pub mod injector;
pub mod router_registry;
