//! Plugin-scoped RPC composition engine.
//! Plugins declare contracts and name their handlers; this crate resolves
//! both into one namespaced endpoint while keeping server collaborators
//! behind the trusted execution context.

pub mod config;
pub mod context;
pub mod host;
pub mod logging;
pub mod plugin;
pub mod routers;
pub mod rpc;
pub mod service;

pub use config::{ConfigError, RuntimeConfig};
pub use context::{ExecutionContext, TrustBoundaryError};
pub use host::PluginHost;
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use plugin::builtin::core_plugins;
pub use plugin::model::{
    HandlerSourcing, PluginDescriptor, PluginMenuItem, PluginMetadata, PluginPage, PluginRpc,
    PluginUi,
};
pub use plugin::registry::{
    DuplicatePolicy, PluginRegistry, PluginRegistryError, RegisterOutcome, Revision,
};
pub use plugin::scope::PluginScope;
pub use rpc::contract::{ComposedContract, Contract};
pub use rpc::contract_resolver::resolve_contracts;
pub use rpc::endpoint::{compose_endpoint, ComposedEndpoint, EndpointResponse};
pub use rpc::handler::{
    ComposedHandlers, FactoryError, FactoryResult, Handler, HandlerError, HandlerFactory,
    HandlerMap, HandlerResult,
};
pub use rpc::injector::{
    compose_handlers, inject_handlers, resolve_embedded_handlers, resolve_plugin_handlers,
    validate_plugin_routers, CompositionStrategy, ResolveContext, ResolveError,
    RouterValidationReport,
};
pub use rpc::router_registry::{RouterEntry, RouterRegistry, RouterRegistryError};
pub use service::registry::{
    collect_services, initialize_server_services, ServiceHandle, ServiceKey, ServiceMap,
    ServiceRegistry,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
