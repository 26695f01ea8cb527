//! Opaque contract values and their namespaced composition.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Schema-level description of one plugin's operations.
///
/// The engine never inspects the inner value; it only nests contracts by
/// plugin id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Contract(Value);

impl Contract {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Contract {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Contract tree keyed by plugin id, in composition order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposedContract {
    entries: Vec<(String, Contract)>,
}

impl ComposedContract {
    /// The explicitly empty contract.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Nests `contract` under `namespace`, replacing an earlier entry with
    /// the same namespace in place.
    pub fn insert(&mut self, namespace: impl Into<String>, contract: Contract) {
        let namespace = namespace.into();
        match self.entries.iter_mut().find(|(id, _)| *id == namespace) {
            Some(slot) => slot.1 = contract,
            None => self.entries.push((namespace, contract)),
        }
    }

    pub fn get(&self, namespace: &str) -> Option<&Contract> {
        self.entries
            .iter()
            .find(|(id, _)| id == namespace)
            .map(|(_, contract)| contract)
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

    /// Renders the tree as one JSON object `{ <plugin id>: <contract> }`,
    /// keys in composition order.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        for (id, contract) in &self.entries {
            object.insert(id.clone(), contract.as_value().clone());
        }
        Value::Object(object)
    }
}
