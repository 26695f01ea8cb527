//! Composition host wiring registries, services and configuration together.
//!
//! # Responsibility
//! - Own the plugin registry, the collaborator registry and the router table
//!   for one process or one test.
//! - Compose an endpoint from a point-in-time plugin snapshot.
//!
//! # Invariants
//! - Composition reads a snapshot; registrations after `compose` do not
//!   affect the returned endpoint.
//! - Untrusted hosts never hand collaborators to handler factories.

use crate::config::RuntimeConfig;
use crate::context::{ExecutionContext, TrustBoundaryError};
use crate::plugin::builtin::core_plugins;
use crate::plugin::model::PluginDescriptor;
use crate::plugin::registry::{PluginRegistry, PluginRegistryError, RegisterOutcome};
use crate::plugin::scope::PluginScope;
use crate::rpc::endpoint::{compose_endpoint, ComposedEndpoint};
use crate::rpc::injector::{validate_plugin_routers, ResolveContext, RouterValidationReport};
use crate::rpc::router_registry::RouterRegistry;
use crate::service::collaborators::{LocalFileSystemService, MemoryLogStore, ProcessCommandService};
use crate::service::registry::{
    collect_services, initialize_server_services, ServiceHandle, ServiceRegistry,
};
use log::info;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug)]
pub struct PluginHost {
    config: RuntimeConfig,
    plugins: RwLock<PluginRegistry>,
    services: ServiceRegistry,
    routers: RouterRegistry,
}

impl PluginHost {
    /// Host seeded with the built-in core plugins and router table.
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_parts(config, core_plugins(), RouterRegistry::builtin().clone())
    }

    /// Host with a caller-provided core set and router table.
    pub fn with_parts(
        config: RuntimeConfig,
        core: impl IntoIterator<Item = PluginDescriptor>,
        routers: RouterRegistry,
    ) -> Self {
        let plugins = PluginRegistry::with_policy(core, config.duplicate_policy);
        info!(
            "event=host_created module=host status=ok context={} strategy={} policy={} plugins={} routers={}",
            config.execution_context,
            config.strategy.as_str(),
            config.duplicate_policy.as_str(),
            plugins.len(),
            routers.len()
        );
        Self {
            config,
            plugins: RwLock::new(plugins),
            services: ServiceRegistry::new(),
            routers,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn execution_context(&self) -> ExecutionContext {
        self.config.execution_context
    }

    pub fn routers(&self) -> &RouterRegistry {
        &self.routers
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    /// Registers collaborators for factories to receive.
    ///
    /// # Errors
    /// - [`TrustBoundaryError`] on an untrusted host.
    pub fn initialize_services(
        &mut self,
        services: impl IntoIterator<Item = ServiceHandle>,
    ) -> Result<(), TrustBoundaryError> {
        initialize_server_services(self.config.execution_context, &mut self.services, services)
    }

    /// Registers the process, local file-system and in-memory log services.
    pub fn initialize_default_services(&mut self) -> Result<(), TrustBoundaryError> {
        self.initialize_services([
            ServiceHandle::Command(Arc::new(ProcessCommandService)),
            ServiceHandle::FileSystem(Arc::new(LocalFileSystemService)),
            ServiceHandle::LogStore(Arc::new(MemoryLogStore::default())),
        ])
    }

    /// Registers an additional plugin without scope ownership.
    pub fn register(
        &self,
        plugin: PluginDescriptor,
    ) -> Result<RegisterOutcome, PluginRegistryError> {
        self.plugins
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(plugin)
    }

    pub fn unregister(&self, id: &str) -> bool {
        self.plugins
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .unregister(id)
    }

    /// Opens a scope whose registrations are released when it is dropped.
    pub fn open_scope(&self) -> PluginScope<'_> {
        PluginScope::new(&self.plugins)
    }

    pub fn plugin_ids(&self) -> Vec<String> {
        self.plugins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get_all()
            .into_iter()
            .map(|plugin| plugin.id.clone())
            .collect()
    }

    /// Ordered copy of the current plugin set.
    pub fn snapshot(&self) -> Vec<PluginDescriptor> {
        self.plugins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    pub fn clear_additional(&self) {
        self.plugins
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear_additional();
    }

    /// Checks every referenced router identifier against the router table.
    pub fn validate(&self) -> RouterValidationReport {
        let plugins = self.snapshot();
        validate_plugin_routers(&plugins, &self.routers)
    }

    /// Composes contract and handlers from the current plugin snapshot.
    ///
    /// # Errors
    /// - [`TrustBoundaryError`] when the embedded strategy runs untrusted.
    pub fn compose(&self) -> Result<ComposedEndpoint, TrustBoundaryError> {
        let plugins = self.snapshot();
        let services = collect_services(self.config.execution_context, &self.services);
        let ctx = ResolveContext {
            strategy: self.config.strategy,
            execution: self.config.execution_context,
            services: &services,
            routers: &self.routers,
        };
        compose_endpoint(&plugins, &ctx)
    }
}
