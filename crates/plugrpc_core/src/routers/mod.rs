//! Built-in router implementations referenced by identifier.
//!
//! # Responsibility
//! - Provide the fixed entry list behind `RouterRegistry::builtin()`.
//! - Keep trusted-collaborator imports out of plugin descriptor modules.
//!
//! # Invariants
//! - Factories never fail because a collaborator is absent; each operation
//!   degrades to a typed "Service not available" response instead.

use crate::rpc::router_registry::RouterEntry;

pub mod cli;
pub mod files;
pub mod logs;
pub mod routes;

/// Error text carried by every degraded response.
pub const SERVICE_UNAVAILABLE: &str = "Service not available";

/// Fixed list backing the built-in router table.
pub fn builtin_router_entries() -> Vec<RouterEntry> {
    vec![
        RouterEntry::new(
            routes::IDENTIFIER,
            routes::handler_factory,
            "Routes",
            "Lists the registered router table.",
        ),
        RouterEntry::new(
            cli::IDENTIFIER,
            cli::handler_factory,
            "CLI",
            "Executes shell commands through the command service.",
        ),
        RouterEntry::new(
            files::IDENTIFIER,
            files::handler_factory,
            "Files",
            "Inspects the file system through the file-system service.",
        ),
        RouterEntry::new(
            logs::IDENTIFIER,
            logs::handler_factory,
            "Logs",
            "Appends and reads records through the log store service.",
        ),
    ]
}
