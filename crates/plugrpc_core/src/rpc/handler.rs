//! Handler, handler map and handler factory contracts.
//!
//! # Responsibility
//! - Define the executable side of a plugin's contract slice.
//! - Define the factory signatures used by the embedded and registry paths.
//!
//! # Invariants
//! - Handlers receive and return JSON values; shape checks belong to the
//!   external schema layer.
//! - Factories report failures as `FactoryError`; composition isolates them.

use crate::service::registry::ServiceMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

pub type HandlerResult = Result<Value, HandlerError>;

/// Executable implementation of one operation.
pub type Handler = Arc<dyn Fn(Value) -> HandlerResult + Send + Sync>;

pub type FactoryResult<T> = Result<T, FactoryError>;

/// Closure factory carried on a plugin descriptor (embedded path).
pub type HandlerFactory = Arc<dyn Fn(&ServiceMap) -> FactoryResult<HandlerMap> + Send + Sync>;

/// Plain-function factory stored in the static router table.
pub type HandlerFactoryFn = fn(&ServiceMap) -> FactoryResult<HandlerMap>;

/// Operation name → handler for one plugin.
#[derive(Clone, Default)]
pub struct HandlerMap {
    handlers: BTreeMap<String, Handler>,
}

impl HandlerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with<F>(mut self, operation: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Value) -> HandlerResult + Send + Sync + 'static,
    {
        self.insert(operation, handler);
        self
    }

    pub fn insert<F>(&mut self, operation: impl Into<String>, handler: F)
    where
        F: Fn(Value) -> HandlerResult + Send + Sync + 'static,
    {
        self.handlers.insert(operation.into(), Arc::new(handler));
    }

    pub fn get(&self, operation: &str) -> Option<&Handler> {
        self.handlers.get(operation)
    }

    /// Invokes one operation; `None` when the operation is not defined.
    pub fn call(&self, operation: &str, input: Value) -> Option<HandlerResult> {
        self.handlers.get(operation).map(|handler| handler(input))
    }

    pub fn operations(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Debug for HandlerMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerMap")
            .field("operations", &self.operations())
            .finish()
    }
}

/// Handler maps keyed by plugin id, in composition order.
#[derive(Debug, Clone, Default)]
pub struct ComposedHandlers {
    entries: Vec<(String, HandlerMap)>,
}

impl ComposedHandlers {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Nests `handlers` under `namespace`, replacing an earlier entry in place.
    pub fn insert(&mut self, namespace: impl Into<String>, handlers: HandlerMap) {
        let namespace = namespace.into();
        match self.entries.iter_mut().find(|(id, _)| *id == namespace) {
            Some(slot) => slot.1 = handlers,
            None => self.entries.push((namespace, handlers)),
        }
    }

    pub fn get(&self, namespace: &str) -> Option<&HandlerMap> {
        self.entries
            .iter()
            .find(|(id, _)| id == namespace)
            .map(|(_, handlers)| handlers)
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.get(namespace).is_some()
    }

    pub fn namespaces(&self) -> Vec<&str> {
        self.entries.iter().map(|(id, _)| id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Errors raised by a handler while serving one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    InvalidInput(String),
    Internal(String),
}

impl Display for HandlerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "invalid handler input: {message}"),
            Self::Internal(message) => write!(f, "handler failed: {message}"),
        }
    }
}

impl Error for HandlerError {}

/// Error raised by a handler factory during composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryError {
    pub message: String,
}

impl FactoryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for FactoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "handler factory failed: {}", self.message)
    }
}

impl Error for FactoryError {}

/// Decodes a handler input into a typed request.
pub fn parse_input<T: DeserializeOwned>(input: Value) -> Result<T, HandlerError> {
    serde_json::from_value(input).map_err(|err| HandlerError::InvalidInput(err.to_string()))
}

/// Encodes a typed response into a handler output.
pub fn to_output<T: Serialize>(value: &T) -> HandlerResult {
    serde_json::to_value(value).map_err(|err| HandlerError::Internal(err.to_string()))
}
