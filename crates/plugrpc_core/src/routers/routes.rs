//! `routes-handler`: read-only view of the router table.
//!
//! Always describes `RouterRegistry::builtin()`, the implementations shipped
//! with this build, not a custom table passed to `PluginHost::with_parts`.
//! Drift against the table a host composes with is reported by
//! `PluginHost::validate`.

use crate::rpc::handler::{parse_input, to_output, FactoryResult, HandlerMap};
use crate::rpc::router_registry::RouterRegistry;
use crate::service::registry::ServiceMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const IDENTIFIER: &str = "routes-handler";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterSummary {
    pub identifier: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct GetRequest {
    identifier: String,
}

/// Needs no collaborators; safe with an empty service map.
pub fn handler_factory(_services: &ServiceMap) -> FactoryResult<HandlerMap> {
    Ok(HandlerMap::new()
        .with("list", |_input: Value| {
            let routers = summaries();
            Ok(json!({ "routers": to_output(&routers)? }))
        })
        .with("get", |input: Value| {
            let request: GetRequest = parse_input(input)?;
            let router = summaries()
                .into_iter()
                .find(|item| item.identifier == request.identifier);
            Ok(json!({ "found": router.is_some(), "router": to_output(&router)? }))
        }))
}

fn summaries() -> Vec<RouterSummary> {
    RouterRegistry::builtin()
        .entries()
        .iter()
        .map(|entry| RouterSummary {
            identifier: entry.identifier.clone(),
            name: entry.name.clone(),
            description: entry.description.clone(),
        })
        .collect()
}
