//! Composed contract/handler pair served by one endpoint.
//!
//! # Responsibility
//! - Merge contract resolver and injector outputs into one servable value.
//! - Dispatch `<plugin id>.<operation>` calls to namespaced handlers.
//!
//! # Invariants
//! - Unmatched routes yield `EndpointResponse::NotFound`, never a panic.
//! - Partial composition failures are invisible to callers.

use crate::context::TrustBoundaryError;
use crate::plugin::model::PluginDescriptor;
use crate::rpc::contract::ComposedContract;
use crate::rpc::contract_resolver::resolve_contracts;
use crate::rpc::handler::{ComposedHandlers, HandlerError};
use crate::rpc::injector::{compose_handlers, ResolveContext};
use log::{debug, info};
use serde_json::{json, Value};

/// Outcome of one endpoint call.
#[derive(Debug, Clone, PartialEq)]
pub enum EndpointResponse {
    /// Normally shaped or typed "unavailable" handler output.
    Success(Value),
    /// Handler rejected the call (e.g. malformed input).
    Failed(HandlerError),
    NotFound {
        path: String,
    },
}

impl EndpointResponse {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Wire-friendly JSON projection.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Success(value) => value.clone(),
            Self::Failed(err) => json!({ "error": err.to_string() }),
            Self::NotFound { path } => json!({ "error": "Not found", "path": path }),
        }
    }
}

/// One cold-built endpoint.
#[derive(Debug, Clone, Default)]
pub struct ComposedEndpoint {
    contract: ComposedContract,
    handlers: ComposedHandlers,
}

impl ComposedEndpoint {
    pub fn new(contract: ComposedContract, handlers: ComposedHandlers) -> Self {
        Self { contract, handlers }
    }

    pub fn contract(&self) -> &ComposedContract {
        &self.contract
    }

    pub fn handlers(&self) -> &ComposedHandlers {
        &self.handlers
    }

    /// Invokes `operation` in the `plugin_id` namespace.
    pub fn call(&self, plugin_id: &str, operation: &str, input: Value) -> EndpointResponse {
        let outcome = self
            .handlers
            .get(plugin_id)
            .and_then(|handlers| handlers.call(operation, input));
        match outcome {
            Some(Ok(value)) => EndpointResponse::Success(value),
            Some(Err(err)) => {
                debug!(
                    "event=handler_failed module=rpc status=error plugin_id={plugin_id} operation={operation} error={err}"
                );
                EndpointResponse::Failed(err)
            }
            None => EndpointResponse::NotFound {
                path: format!("{plugin_id}.{operation}"),
            },
        }
    }

    /// Dispatches a dotted `<plugin id>.<operation>` path.
    pub fn dispatch(&self, path: &str, input: Value) -> EndpointResponse {
        match path.trim().split_once('.') {
            Some((plugin_id, operation)) if !plugin_id.is_empty() && !operation.is_empty() => {
                self.call(plugin_id, operation, input)
            }
            _ => EndpointResponse::NotFound {
                path: path.to_string(),
            },
        }
    }
}

/// Runs the contract resolver and the handler composition over one plugin
/// snapshot.
///
/// # Errors
/// - Propagates [`TrustBoundaryError`] from the embedded path.
pub fn compose_endpoint(
    plugins: &[PluginDescriptor],
    ctx: &ResolveContext<'_>,
) -> Result<ComposedEndpoint, TrustBoundaryError> {
    let contract = resolve_contracts(plugins);
    let handlers = compose_handlers(plugins, ctx)?;
    info!(
        "event=endpoint_composed module=rpc status=ok strategy={} plugins={} contracts={} handlers={}",
        ctx.strategy.as_str(),
        plugins.len(),
        contract.len(),
        handlers.len()
    );
    Ok(ComposedEndpoint::new(contract, handlers))
}
