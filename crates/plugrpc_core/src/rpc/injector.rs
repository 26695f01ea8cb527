//! Handler side of composition.
//!
//! # Responsibility
//! - Resolve each plugin's handler map through exactly one sourcing
//!   strategy.
//! - Nest resolved maps under plugin ids in registry order.
//! - Validate descriptor identifiers against the router table ahead of
//!   serving.
//!
//! # Invariants
//! - Configuration drift and factory failures are isolated to the offending
//!   plugin; every other plugin is still composed.
//! - Trust-boundary violations abort composition immediately.
//! - A plugin is never resolved through both the embedded and registry paths.

use crate::context::{ExecutionContext, TrustBoundaryError};
use crate::plugin::model::{HandlerSourcing, PluginDescriptor};
use crate::rpc::handler::{ComposedHandlers, FactoryError, FactoryResult, HandlerMap};
use crate::rpc::router_registry::RouterRegistry;
use crate::service::registry::ServiceMap;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Handler-sourcing path used for one composition pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionStrategy {
    /// `ByIdentifier` plugins resolved through the router table.
    #[default]
    Registry,
    /// `Direct` and `Factory` plugins resolved from the descriptor itself.
    Embedded,
}

impl CompositionStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registry => "registry",
            Self::Embedded => "embedded",
        }
    }
}

/// Inputs shared by every plugin resolution in one pass.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub strategy: CompositionStrategy,
    pub execution: ExecutionContext,
    pub services: &'a ServiceMap,
    pub routers: &'a RouterRegistry,
}

/// Per-plugin resolution failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    MissingRouter {
        plugin_id: String,
        identifier: String,
    },
    FactoryFailed {
        plugin_id: String,
        source: FactoryError,
    },
    FactoryPanicked {
        plugin_id: String,
        message: String,
    },
    TrustBoundary(TrustBoundaryError),
}

impl ResolveError {
    /// Only trust-boundary violations abort a composition pass.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::TrustBoundary(_))
    }
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRouter {
                plugin_id,
                identifier,
            } => write!(
                f,
                "router `{identifier}` declared by plugin `{plugin_id}` is not registered"
            ),
            Self::FactoryFailed { plugin_id, source } => {
                write!(f, "plugin `{plugin_id}`: {source}")
            }
            Self::FactoryPanicked { plugin_id, message } => {
                write!(f, "plugin `{plugin_id}`: handler factory panicked: {message}")
            }
            Self::TrustBoundary(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ResolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::FactoryFailed { source, .. } => Some(source),
            Self::TrustBoundary(err) => Some(err),
            Self::MissingRouter { .. } | Self::FactoryPanicked { .. } => None,
        }
    }
}

impl From<TrustBoundaryError> for ResolveError {
    fn from(value: TrustBoundaryError) -> Self {
        Self::TrustBoundary(value)
    }
}

/// Identifier validation report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterValidationReport {
    pub valid: bool,
    pub missing: Vec<String>,
    pub matched: Vec<String>,
}

/// Resolves one plugin's handler map for the given strategy.
///
/// Returns `Ok(None)` when the plugin does not participate in this strategy.
///
/// # Errors
/// - `MissingRouter` when the identifier is absent from the router table.
/// - `FactoryFailed` / `FactoryPanicked` when the factory fails.
/// - `TrustBoundary` when an embedded factory runs in an untrusted context.
pub fn resolve_plugin_handlers(
    plugin: &PluginDescriptor,
    ctx: &ResolveContext<'_>,
) -> Result<Option<HandlerMap>, ResolveError> {
    let Some(sourcing) = plugin.sourcing() else {
        return Ok(None);
    };

    match (ctx.strategy, sourcing) {
        (CompositionStrategy::Registry, HandlerSourcing::ByIdentifier(identifier)) => {
            let Some(entry) = ctx.routers.get_by_id(identifier) else {
                return Err(ResolveError::MissingRouter {
                    plugin_id: plugin.id.clone(),
                    identifier: identifier.clone(),
                });
            };
            invoke_factory(&plugin.id, || (entry.factory)(ctx.services)).map(Some)
        }
        (CompositionStrategy::Embedded, HandlerSourcing::Direct(handlers)) => {
            Ok(Some(handlers.clone()))
        }
        (CompositionStrategy::Embedded, HandlerSourcing::Factory(factory)) => {
            ctx.execution.require_trusted("embedded handler factory")?;
            invoke_factory(&plugin.id, || factory(ctx.services)).map(Some)
        }
        (strategy, other) => {
            debug!(
                "event=plugin_strategy_skipped module=rpc status=ok plugin_id={} strategy={} sourcing={}",
                plugin.id,
                strategy.as_str(),
                other.kind()
            );
            Ok(None)
        }
    }
}

/// Registry-path composition over `plugins`.
///
/// Plugins without a contract or identifier are skipped; drift and factory
/// failures are logged and skip only the offending plugin.
pub fn inject_handlers<'a>(
    plugins: impl IntoIterator<Item = &'a PluginDescriptor>,
    routers: &RouterRegistry,
    services: &ServiceMap,
) -> ComposedHandlers {
    let ctx = ResolveContext {
        strategy: CompositionStrategy::Registry,
        execution: ExecutionContext::Trusted,
        services,
        routers,
    };
    let mut composed = ComposedHandlers::empty();
    for plugin in plugins {
        if plugin.contract().is_none() || plugin.identifier().is_none() {
            continue;
        }
        match resolve_plugin_handlers(plugin, &ctx) {
            Ok(Some(handlers)) => composed.insert(plugin.id.clone(), handlers),
            Ok(None) => {}
            Err(err) => log_resolve_failure(&err),
        }
    }
    debug!(
        "event=handlers_injected module=rpc status=ok count={}",
        composed.len()
    );
    composed
}

/// Embedded-path composition over `plugins`.
///
/// # Errors
/// - Returns [`TrustBoundaryError`] when a `Factory` plugin is composed in an
///   untrusted context.
pub fn resolve_embedded_handlers<'a>(
    plugins: impl IntoIterator<Item = &'a PluginDescriptor>,
    execution: ExecutionContext,
    services: &ServiceMap,
) -> Result<ComposedHandlers, TrustBoundaryError> {
    let empty_routers = RouterRegistry::default();
    let ctx = ResolveContext {
        strategy: CompositionStrategy::Embedded,
        execution,
        services,
        routers: &empty_routers,
    };
    let mut composed = ComposedHandlers::empty();
    for plugin in plugins {
        if plugin.contract().is_none() {
            continue;
        }
        match resolve_plugin_handlers(plugin, &ctx) {
            Ok(Some(handlers)) => composed.insert(plugin.id.clone(), handlers),
            Ok(None) => {}
            Err(ResolveError::TrustBoundary(err)) => {
                error!(
                    "event=trust_boundary_violation module=rpc status=error plugin_id={} operation={}",
                    plugin.id, err.operation
                );
                return Err(err);
            }
            Err(err) => log_resolve_failure(&err),
        }
    }
    Ok(composed)
}

/// Runs one composition pass with the strategy carried by `ctx`.
pub fn compose_handlers<'a>(
    plugins: impl IntoIterator<Item = &'a PluginDescriptor>,
    ctx: &ResolveContext<'_>,
) -> Result<ComposedHandlers, TrustBoundaryError> {
    match ctx.strategy {
        CompositionStrategy::Registry => Ok(inject_handlers(plugins, ctx.routers, ctx.services)),
        CompositionStrategy::Embedded => {
            resolve_embedded_handlers(plugins, ctx.execution, ctx.services)
        }
    }
}

/// Checks every declared identifier against the router table without
/// invoking factories.
pub fn validate_plugin_routers<'a>(
    plugins: impl IntoIterator<Item = &'a PluginDescriptor>,
    routers: &RouterRegistry,
) -> RouterValidationReport {
    let mut report = RouterValidationReport::default();
    for plugin in plugins {
        if plugin.contract().is_none() {
            continue;
        }
        let Some(identifier) = plugin.identifier() else {
            continue;
        };
        if routers.get_by_id(identifier).is_some() {
            report.matched.push(identifier.to_string());
        } else {
            report.missing.push(identifier.to_string());
        }
    }
    report.valid = report.missing.is_empty();
    report
}

fn invoke_factory<F>(plugin_id: &str, factory: F) -> Result<HandlerMap, ResolveError>
where
    F: FnOnce() -> FactoryResult<HandlerMap>,
{
    match catch_unwind(AssertUnwindSafe(factory)) {
        Ok(Ok(handlers)) => Ok(handlers),
        Ok(Err(source)) => Err(ResolveError::FactoryFailed {
            plugin_id: plugin_id.to_string(),
            source,
        }),
        Err(payload) => Err(ResolveError::FactoryPanicked {
            plugin_id: plugin_id.to_string(),
            message: panic_message(&*payload),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn log_resolve_failure(err: &ResolveError) {
    match err {
        ResolveError::MissingRouter {
            plugin_id,
            identifier,
        } => warn!(
            "event=router_missing module=rpc status=error plugin_id={plugin_id} identifier={identifier}"
        ),
        ResolveError::FactoryFailed { plugin_id, source } => error!(
            "event=factory_failed module=rpc status=error plugin_id={plugin_id} error={source}"
        ),
        ResolveError::FactoryPanicked { plugin_id, message } => error!(
            "event=factory_panicked module=rpc status=error plugin_id={plugin_id} payload={message}"
        ),
        ResolveError::TrustBoundary(inner) => error!(
            "event=trust_boundary_violation module=rpc status=error operation={}",
            inner.operation
        ),
    }
}
