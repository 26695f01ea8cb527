//! Static identifier → handler factory table.
//!
//! # Responsibility
//! - Let a plugin declare its implementation by name instead of holding a
//!   function reference.
//! - Keep trusted implementation modules out of descriptor definitions.
//!
//! # Invariants
//! - The built-in table is built once from a fixed list and is read-only.
//! - Identifiers are unique and match `IDENTIFIER_PATTERN`.

use crate::rpc::handler::HandlerFactoryFn;
use crate::routers::builtin_router_entries;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Lowercase kebab-case identifiers, e.g. `cli-handler`.
pub const IDENTIFIER_PATTERN: &str = r"^[a-z0-9]+(?:-[a-z0-9]+)*$";

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(IDENTIFIER_PATTERN).expect("valid router identifier regex"));

static BUILTIN_ROUTERS: Lazy<RouterRegistry> = Lazy::new(|| {
    RouterRegistry::from_entries(builtin_router_entries()).expect("built-in router table is valid")
});

/// One router table row.
#[derive(Clone)]
pub struct RouterEntry {
    pub identifier: String,
    pub factory: HandlerFactoryFn,
    pub name: String,
    pub description: String,
}

impl RouterEntry {
    pub fn new(
        identifier: impl Into<String>,
        factory: HandlerFactoryFn,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            factory,
            name: name.into(),
            description: description.into(),
        }
    }
}

impl Debug for RouterEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterEntry")
            .field("identifier", &self.identifier)
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Router table construction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterRegistryError {
    InvalidIdentifier(String),
    DuplicateIdentifier(String),
}

impl Display for RouterRegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIdentifier(value) => write!(f, "router identifier is invalid: {value}"),
            Self::DuplicateIdentifier(value) => {
                write!(f, "router identifier already registered: {value}")
            }
        }
    }
}

impl Error for RouterRegistryError {}

/// Closed router table; no runtime mutation API.
#[derive(Debug, Clone, Default)]
pub struct RouterRegistry {
    entries: Vec<RouterEntry>,
}

impl RouterRegistry {
    /// Process-wide built-in table.
    pub fn builtin() -> &'static RouterRegistry {
        &BUILTIN_ROUTERS
    }

    /// Builds a table from a fixed entry list.
    ///
    /// # Errors
    /// - `InvalidIdentifier` when an identifier is not lowercase kebab-case.
    /// - `DuplicateIdentifier` when two entries share an identifier.
    pub fn from_entries(
        entries: impl IntoIterator<Item = RouterEntry>,
    ) -> Result<Self, RouterRegistryError> {
        let mut seen = BTreeSet::new();
        let mut table = Vec::new();
        for entry in entries {
            if !is_valid_identifier(&entry.identifier) {
                return Err(RouterRegistryError::InvalidIdentifier(entry.identifier));
            }
            if !seen.insert(entry.identifier.clone()) {
                return Err(RouterRegistryError::DuplicateIdentifier(entry.identifier));
            }
            table.push(entry);
        }
        Ok(Self { entries: table })
    }

    pub fn get_by_id(&self, identifier: &str) -> Option<&RouterEntry> {
        self.entries
            .iter()
            .find(|entry| entry.identifier == identifier)
    }

    pub fn get_all_ids(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.identifier.clone())
            .collect()
    }

    pub fn entries(&self) -> &[RouterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn is_valid_identifier(value: &str) -> bool {
    IDENTIFIER_RE.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::{is_valid_identifier, RouterEntry, RouterRegistry, RouterRegistryError};
    use crate::rpc::handler::{FactoryResult, HandlerMap};
    use crate::service::registry::ServiceMap;

    fn empty_factory(_services: &ServiceMap) -> FactoryResult<HandlerMap> {
        Ok(HandlerMap::new())
    }

    fn entry(identifier: &str) -> RouterEntry {
        RouterEntry::new(identifier, empty_factory, identifier, "test router")
    }

    #[test]
    fn builtin_table_contains_core_routers() {
        let ids = RouterRegistry::builtin().get_all_ids();
        for expected in ["routes-handler", "cli-handler", "files-handler", "logs-handler"] {
            assert!(ids.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn get_by_id_returns_matching_entry_or_none() {
        let registry =
            RouterRegistry::from_entries([entry("a-handler"), entry("b-handler")]).expect("table");
        assert_eq!(
            registry.get_by_id("b-handler").map(|item| item.identifier.as_str()),
            Some("b-handler")
        );
        assert!(registry.get_by_id("c-handler").is_none());
        assert_eq!(registry.get_all_ids(), vec!["a-handler", "b-handler"]);
    }

    #[test]
    fn rejects_duplicate_and_invalid_identifiers() {
        let duplicate = RouterRegistry::from_entries([entry("a-handler"), entry("a-handler")])
            .expect_err("duplicate must fail");
        assert_eq!(
            duplicate,
            RouterRegistryError::DuplicateIdentifier("a-handler".to_string())
        );

        let invalid = RouterRegistry::from_entries([entry("Bad Handler")])
            .expect_err("invalid identifier must fail");
        assert!(matches!(invalid, RouterRegistryError::InvalidIdentifier(_)));
    }

    #[test]
    fn identifier_pattern_accepts_kebab_case_only() {
        assert!(is_valid_identifier("cli-handler"));
        assert!(is_valid_identifier("v2"));
        assert!(!is_valid_identifier("cli--handler"));
        assert!(!is_valid_identifier("-cli"));
        assert!(!is_valid_identifier("Cli"));
        assert!(!is_valid_identifier(""));
    }
}
