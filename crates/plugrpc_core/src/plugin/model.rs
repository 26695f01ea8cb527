//! Plugin descriptor model.
//!
//! # Responsibility
//! - Define the pluggable unit contributed to composition.
//! - Carry UI metadata through untouched.
//!
//! # Invariants
//! - `id` is the namespace for the plugin's contract and handlers.
//! - A plugin has at most one handler-sourcing strategy.
//! - Metadata and UI data never affect composition.

use crate::rpc::contract::Contract;
use crate::rpc::handler::{FactoryResult, HandlerFactory, HandlerMap};
use crate::service::registry::ServiceMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Descriptive plugin metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    pub name: String,
    pub description: String,
    pub version: String,
    pub author: String,
    pub icon: String,
}

/// One page contributed to the host UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginPage {
    pub path: String,
    pub title: String,
}

/// One menu item contributed to the host UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMenuItem {
    pub label: String,
    pub path: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// UI metadata; passed through untouched by composition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginUi {
    #[serde(default)]
    pub pages: Vec<PluginPage>,
    #[serde(default)]
    pub menu_items: Vec<PluginMenuItem>,
    /// Opaque description of the compact "reduced" view.
    #[serde(default)]
    pub reduced: Option<Value>,
}

/// How a plugin's handler map is obtained.
#[derive(Clone)]
pub enum HandlerSourcing {
    /// Context-free handler map; valid in any execution context.
    Direct(HandlerMap),
    /// Factory invoked with injected services; trusted context only.
    Factory(HandlerFactory),
    /// Identifier resolved through the router registry.
    ByIdentifier(String),
}

impl HandlerSourcing {
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&ServiceMap) -> FactoryResult<HandlerMap> + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(factory))
    }

    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::ByIdentifier(identifier) => Some(identifier.as_str()),
            _ => None,
        }
    }

    /// Stable strategy name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Direct(_) => "direct",
            Self::Factory(_) => "factory",
            Self::ByIdentifier(_) => "identifier",
        }
    }
}

impl Debug for HandlerSourcing {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct(handlers) => f.debug_tuple("Direct").field(handlers).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
            Self::ByIdentifier(identifier) => {
                f.debug_tuple("ByIdentifier").field(identifier).finish()
            }
        }
    }
}

/// RPC participation of one plugin.
#[derive(Debug, Clone)]
pub struct PluginRpc {
    pub contract: Contract,
    pub sourcing: Option<HandlerSourcing>,
}

/// One pluggable unit of functionality.
#[derive(Debug, Clone)]
pub struct PluginDescriptor {
    pub id: String,
    pub metadata: PluginMetadata,
    pub rpc: Option<PluginRpc>,
    pub ui: PluginUi,
}

impl PluginDescriptor {
    /// Creates a descriptor without RPC participation or UI data.
    pub fn new(id: impl Into<String>, metadata: PluginMetadata) -> Self {
        Self {
            id: id.into(),
            metadata,
            rpc: None,
            ui: PluginUi::default(),
        }
    }

    pub fn with_rpc(mut self, contract: Contract, sourcing: Option<HandlerSourcing>) -> Self {
        self.rpc = Some(PluginRpc { contract, sourcing });
        self
    }

    pub fn with_ui(mut self, ui: PluginUi) -> Self {
        self.ui = ui;
        self
    }

    pub fn contract(&self) -> Option<&Contract> {
        self.rpc.as_ref().map(|rpc| &rpc.contract)
    }

    pub fn sourcing(&self) -> Option<&HandlerSourcing> {
        self.rpc.as_ref().and_then(|rpc| rpc.sourcing.as_ref())
    }

    /// Router identifier, when the plugin is sourced by identifier.
    pub fn identifier(&self) -> Option<&str> {
        self.sourcing().and_then(HandlerSourcing::identifier)
    }
}
