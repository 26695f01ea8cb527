//! Active plugin set: fixed core plus dynamically registered additions.
//!
//! # Responsibility
//! - Hold every active plugin in composition order.
//! - Keep the core subset stable for the life of the registry.
//!
//! # Invariants
//! - `core ⊆ all` at all times; core ids cannot be unregistered.
//! - Iteration order is core first (construction order), then additional
//!   plugins in registration order.
//! - Re-registering an id replaces the entry in place under
//!   `DuplicatePolicy::Overwrite`; the displaced registration is kept and
//!   becomes live again when the overwriting revision is released.
//! - `clear_additional()` restores exactly the construction-time core set.

use crate::plugin::model::PluginDescriptor;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Policy applied when a registration reuses a live plugin id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Last write wins (hot-reload friendly).
    #[default]
    Overwrite,
    /// First write wins; later registrations are ignored.
    KeepExisting,
    /// Later registrations fail with `PluginRegistryError::DuplicatePluginId`.
    Reject,
}

impl DuplicatePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overwrite => "overwrite",
            Self::KeepExisting => "keep_existing",
            Self::Reject => "reject",
        }
    }
}

/// Monotonic registration stamp; distinguishes successive writes to one id.
pub type Revision = u64;

/// Result of one successful `register` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Inserted(Revision),
    Replaced(Revision),
    /// Existing entry kept under `DuplicatePolicy::KeepExisting`.
    Kept(Revision),
}

impl RegisterOutcome {
    /// Revision of the entry that is live after the call.
    pub fn revision(self) -> Revision {
        match self {
            Self::Inserted(revision) | Self::Replaced(revision) | Self::Kept(revision) => revision,
        }
    }
}

/// Plugin registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginRegistryError {
    DuplicatePluginId(String),
}

impl Display for PluginRegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicatePluginId(value) => write!(f, "plugin id already registered: {value}"),
        }
    }
}

impl Error for PluginRegistryError {}

#[derive(Debug, Clone)]
struct RegistryEntry {
    plugin: PluginDescriptor,
    revision: Revision,
    /// Overwritten registrations, oldest first.
    displaced: Vec<(PluginDescriptor, Revision)>,
}

impl RegistryEntry {
    fn new(plugin: PluginDescriptor, revision: Revision) -> Self {
        Self {
            plugin,
            revision,
            displaced: Vec::new(),
        }
    }
}

/// In-memory plugin registry, constructed explicitly per process.
#[derive(Debug, Clone)]
pub struct PluginRegistry {
    core: Vec<PluginDescriptor>,
    core_ids: BTreeSet<String>,
    order: Vec<String>,
    entries: HashMap<String, RegistryEntry>,
    next_revision: Revision,
    policy: DuplicatePolicy,
}

impl PluginRegistry {
    /// Creates a registry seeded with `core` plugins.
    ///
    /// Duplicate ids inside `core` keep the first position and the last
    /// descriptor.
    pub fn new(core: impl IntoIterator<Item = PluginDescriptor>) -> Self {
        Self::with_policy(core, DuplicatePolicy::default())
    }

    pub fn with_policy(
        core: impl IntoIterator<Item = PluginDescriptor>,
        policy: DuplicatePolicy,
    ) -> Self {
        let mut core_plugins: Vec<PluginDescriptor> = Vec::new();
        for plugin in core {
            match core_plugins.iter_mut().find(|item| item.id == plugin.id) {
                Some(slot) => *slot = plugin,
                None => core_plugins.push(plugin),
            }
        }

        let mut registry = Self {
            core_ids: core_plugins.iter().map(|plugin| plugin.id.clone()).collect(),
            core: core_plugins,
            order: Vec::new(),
            entries: HashMap::new(),
            next_revision: 0,
            policy,
        };
        registry.seed_core();
        registry
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Inserts or replaces a plugin by id according to the duplicate policy.
    ///
    /// # Errors
    /// - Returns `DuplicatePluginId` only under `DuplicatePolicy::Reject`.
    pub fn register(
        &mut self,
        plugin: PluginDescriptor,
    ) -> Result<RegisterOutcome, PluginRegistryError> {
        let id = plugin.id.clone();
        if let Some(existing_revision) = self.revision_of(id.as_str()) {
            match self.policy {
                DuplicatePolicy::Reject => {
                    return Err(PluginRegistryError::DuplicatePluginId(id));
                }
                DuplicatePolicy::KeepExisting => {
                    debug!("event=plugin_register_ignored module=plugin status=ok plugin_id={id}");
                    return Ok(RegisterOutcome::Kept(existing_revision));
                }
                DuplicatePolicy::Overwrite => {
                    warn!("event=plugin_replaced module=plugin status=ok plugin_id={id}");
                    let revision = self.bump_revision();
                    if let Some(entry) = self.entries.get_mut(&id) {
                        let previous = std::mem::replace(&mut entry.plugin, plugin);
                        let previous_revision = std::mem::replace(&mut entry.revision, revision);
                        entry.displaced.push((previous, previous_revision));
                    }
                    return Ok(RegisterOutcome::Replaced(revision));
                }
            }
        }

        let revision = self.bump_revision();
        debug!("event=plugin_registered module=plugin status=ok plugin_id={id} revision={revision}");
        self.order.push(id.clone());
        self.entries.insert(id, RegistryEntry::new(plugin, revision));
        Ok(RegisterOutcome::Inserted(revision))
    }

    /// Removes one additional plugin together with any registrations it
    /// displaced; no-op when absent.
    ///
    /// Core plugins are never removed. Returns whether an entry was removed.
    pub fn unregister(&mut self, id: &str) -> bool {
        if self.core_ids.contains(id) {
            warn!("event=plugin_unregister_refused module=plugin status=error plugin_id={id} reason=core");
            return false;
        }
        self.remove_entry(id)
    }

    /// Releases one registration of `id` by revision.
    ///
    /// - Live revision with displaced registrations: the most recent
    ///   displaced one becomes live again.
    /// - Live revision with nothing displaced: the id is removed (core ids
    ///   are kept).
    /// - Displaced revision: dropped from the stack; the live entry is
    ///   untouched.
    ///
    /// Returns whether a registration was released.
    pub fn unregister_revision(&mut self, id: &str, revision: Revision) -> bool {
        let Some(entry) = self.entries.get_mut(id) else {
            return false;
        };

        if entry.revision != revision {
            let before = entry.displaced.len();
            entry.displaced.retain(|(_, displaced)| *displaced != revision);
            return entry.displaced.len() != before;
        }

        if let Some((plugin, previous)) = entry.displaced.pop() {
            entry.plugin = plugin;
            entry.revision = previous;
            debug!("event=plugin_restored module=plugin status=ok plugin_id={id} revision={previous}");
            return true;
        }

        if self.core_ids.contains(id) {
            return false;
        }
        self.remove_entry(id)
    }

    /// Returns every plugin in composition order.
    pub fn get_all(&self) -> Vec<&PluginDescriptor> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id))
            .map(|entry| &entry.plugin)
            .collect()
    }

    /// Cloned composition-order snapshot for a cold build.
    pub fn snapshot(&self) -> Vec<PluginDescriptor> {
        self.get_all().into_iter().cloned().collect()
    }

    pub fn get_core(&self) -> Vec<&PluginDescriptor> {
        self.get_all()
            .into_iter()
            .filter(|plugin| self.core_ids.contains(&plugin.id))
            .collect()
    }

    pub fn get_additional(&self) -> Vec<&PluginDescriptor> {
        self.get_all()
            .into_iter()
            .filter(|plugin| !self.core_ids.contains(&plugin.id))
            .collect()
    }

    pub fn has(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&PluginDescriptor> {
        self.entries.get(id).map(|entry| &entry.plugin)
    }

    /// Revision of the live registration for `id`.
    pub fn revision_of(&self, id: &str) -> Option<Revision> {
        self.entries.get(id).map(|entry| entry.revision)
    }

    pub fn is_core(&self, id: &str) -> bool {
        self.core_ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drops every additional plugin and restores core descriptors that were
    /// overwritten.
    pub fn clear_additional(&mut self) {
        let removed = self.order.len().saturating_sub(self.core.len());
        self.order.clear();
        self.entries.clear();
        self.seed_core();
        debug!("event=plugins_cleared module=plugin status=ok removed={removed}");
    }

    fn seed_core(&mut self) {
        for plugin in self.core.clone() {
            let revision = self.bump_revision();
            self.order.push(plugin.id.clone());
            self.entries
                .insert(plugin.id.clone(), RegistryEntry::new(plugin, revision));
        }
    }

    fn remove_entry(&mut self, id: &str) -> bool {
        if self.entries.remove(id).is_none() {
            return false;
        }
        self.order.retain(|item| item != id);
        debug!("event=plugin_unregistered module=plugin status=ok plugin_id={id}");
        true
    }

    fn bump_revision(&mut self) -> Revision {
        self.next_revision += 1;
        self.next_revision
    }
}

#[cfg(test)]
mod tests {
    use super::{DuplicatePolicy, PluginRegistry, PluginRegistryError, RegisterOutcome};
    use crate::plugin::model::{PluginDescriptor, PluginMetadata};

    fn plugin(id: &str, version: &str) -> PluginDescriptor {
        PluginDescriptor::new(
            id,
            PluginMetadata {
                name: id.to_string(),
                version: version.to_string(),
                ..PluginMetadata::default()
            },
        )
    }

    fn ids(plugins: Vec<&PluginDescriptor>) -> Vec<&str> {
        plugins.into_iter().map(|plugin| plugin.id.as_str()).collect()
    }

    #[test]
    fn core_first_then_additional_in_registration_order() {
        let mut registry = PluginRegistry::new([plugin("routes", "1"), plugin("cli", "1")]);
        registry.register(plugin("zeta", "1")).expect("register zeta");
        registry.register(plugin("alpha", "1")).expect("register alpha");

        assert_eq!(ids(registry.get_all()), vec!["routes", "cli", "zeta", "alpha"]);
        assert_eq!(ids(registry.get_core()), vec!["routes", "cli"]);
        assert_eq!(ids(registry.get_additional()), vec!["zeta", "alpha"]);
    }

    #[test]
    fn duplicate_registration_overwrites_in_place() {
        let mut registry = PluginRegistry::new([plugin("routes", "1")]);
        registry.register(plugin("extra", "1")).expect("first");
        registry.register(plugin("tail", "1")).expect("tail");
        let outcome = registry.register(plugin("extra", "2")).expect("second");

        assert!(matches!(outcome, RegisterOutcome::Replaced(_)));
        assert_eq!(registry.len(), 3);
        assert_eq!(ids(registry.get_all()), vec!["routes", "extra", "tail"]);
        assert_eq!(
            registry.get("extra").map(|item| item.metadata.version.as_str()),
            Some("2")
        );
    }

    #[test]
    fn keep_existing_policy_ignores_later_writes() {
        let mut registry = PluginRegistry::with_policy(
            Vec::<PluginDescriptor>::new(),
            DuplicatePolicy::KeepExisting,
        );
        let first = registry.register(plugin("extra", "1")).expect("first");
        let second = registry.register(plugin("extra", "2")).expect("second");

        assert_eq!(second, RegisterOutcome::Kept(first.revision()));
        assert_eq!(
            registry.get("extra").map(|item| item.metadata.version.as_str()),
            Some("1")
        );
    }

    #[test]
    fn reject_policy_fails_duplicate_registration() {
        let mut registry =
            PluginRegistry::with_policy([plugin("routes", "1")], DuplicatePolicy::Reject);
        let err = registry
            .register(plugin("routes", "2"))
            .expect_err("duplicate must be rejected");
        assert_eq!(err, PluginRegistryError::DuplicatePluginId("routes".to_string()));
    }

    #[test]
    fn unregister_is_noop_for_absent_and_refused_for_core() {
        let mut registry = PluginRegistry::new([plugin("routes", "1")]);
        assert!(!registry.unregister("missing"));
        assert!(!registry.unregister("routes"));
        assert!(registry.has("routes"));

        registry.register(plugin("extra", "1")).expect("register");
        assert!(registry.unregister("extra"));
        assert!(!registry.has("extra"));
    }

    #[test]
    fn releasing_displaced_revision_keeps_live_entry() {
        let mut registry = PluginRegistry::new(Vec::<PluginDescriptor>::new());
        let first = registry.register(plugin("extra", "1")).expect("first").revision();
        let second = registry.register(plugin("extra", "2")).expect("second").revision();

        assert!(registry.unregister_revision("extra", first));
        assert!(!registry.unregister_revision("extra", first));
        assert_eq!(registry.revision_of("extra"), Some(second));
        assert!(registry.unregister_revision("extra", second));
        assert!(!registry.has("extra"));
    }

    #[test]
    fn releasing_live_revision_restores_displaced_entry() {
        let mut registry = PluginRegistry::new([plugin("routes", "1")]);
        let first = registry.register(plugin("extra", "1")).expect("first").revision();
        registry.register(plugin("tail", "1")).expect("tail");
        let second = registry.register(plugin("extra", "2")).expect("second").revision();

        assert!(registry.unregister_revision("extra", second));
        assert_eq!(registry.revision_of("extra"), Some(first));
        assert_eq!(
            registry.get("extra").map(|item| item.metadata.version.as_str()),
            Some("1")
        );
        assert_eq!(ids(registry.get_all()), vec!["routes", "extra", "tail"]);

        let core_override = registry.register(plugin("routes", "2")).expect("override").revision();
        assert!(registry.unregister_revision("routes", core_override));
        assert_eq!(
            registry.get("routes").map(|item| item.metadata.version.as_str()),
            Some("1")
        );
        let seeded = registry.revision_of("routes").expect("core revision");
        assert!(!registry.unregister_revision("routes", seeded));
        assert!(registry.has("routes"));
    }

    #[test]
    fn clear_additional_restores_exact_core_set() {
        let mut registry = PluginRegistry::new([plugin("routes", "1"), plugin("cli", "1")]);
        for index in 0..5 {
            registry
                .register(plugin(&format!("extra-{index}"), "1"))
                .expect("register");
        }
        registry.register(plugin("cli", "patched")).expect("overwrite core");

        registry.clear_additional();
        assert_eq!(ids(registry.get_all()), vec!["routes", "cli"]);
        assert!(registry.get_additional().is_empty());
        assert_eq!(
            registry.get("cli").map(|item| item.metadata.version.as_str()),
            Some("1")
        );
    }
}
