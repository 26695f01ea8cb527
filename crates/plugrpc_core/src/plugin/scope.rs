//! Scoped ownership of dynamically registered plugins.
//!
//! # Responsibility
//! - Track which additional plugins one caller registered.
//! - Release exactly those registrations when the scope ends.
//!
//! # Invariants
//! - A scope only unregisters ids it registered itself.
//! - A registration overwritten by another caller is not evicted when the
//!   first scope ends (revision check).
//! - Releasing a registration that overwrote someone else's makes the
//!   overwritten one live again.
//! - Core plugins are never removed by a scope.

use crate::plugin::model::PluginDescriptor;
use crate::plugin::registry::{
    PluginRegistry, PluginRegistryError, RegisterOutcome, Revision,
};
use log::debug;
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

/// Registration scope bound to one shared registry.
///
/// Dropping the scope releases every registration it still owns.
#[derive(Debug)]
pub struct PluginScope<'r> {
    id: Uuid,
    registry: &'r RwLock<PluginRegistry>,
    owned: Vec<(String, Revision)>,
}

impl<'r> PluginScope<'r> {
    pub fn new(registry: &'r RwLock<PluginRegistry>) -> Self {
        let id = Uuid::new_v4();
        debug!("event=scope_open module=plugin status=ok scope_id={id}");
        Self {
            id,
            registry,
            owned: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Registers `plugin` and takes ownership of the live registration.
    ///
    /// # Errors
    /// - Propagates `DuplicatePluginId` under `DuplicatePolicy::Reject`.
    pub fn register(
        &mut self,
        plugin: PluginDescriptor,
    ) -> Result<RegisterOutcome, PluginRegistryError> {
        let id = plugin.id.clone();
        let lock = self.registry;
        let mut registry = lock.write().unwrap_or_else(PoisonError::into_inner);
        let outcome = registry.register(plugin)?;

        match outcome {
            RegisterOutcome::Inserted(revision) | RegisterOutcome::Replaced(revision) => {
                // Our own earlier write is now displaced; drop it so release
                // does not bring it back.
                if let Some(position) = self.owned.iter().position(|(owned_id, _)| *owned_id == id) {
                    let (_, previous) = self.owned.remove(position);
                    registry.unregister_revision(&id, previous);
                }
                self.owned.push((id, revision));
            }
            RegisterOutcome::Kept(_) => {}
        }
        Ok(outcome)
    }

    /// Releases this scope's registration of `id`; `false` when the scope
    /// does not own one.
    pub fn unregister(&mut self, id: &str) -> bool {
        let Some(position) = self.owned.iter().position(|(owned_id, _)| owned_id == id) else {
            return false;
        };
        let (owned_id, revision) = self.owned.remove(position);
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .unregister_revision(&owned_id, revision)
    }

    /// Ids this scope currently owns, in registration order.
    pub fn owned_ids(&self) -> Vec<&str> {
        self.owned.iter().map(|(id, _)| id.as_str()).collect()
    }

    /// Ends the scope now; equivalent to dropping it.
    pub fn close(self) {}

    fn release_all(&mut self) {
        if self.owned.is_empty() {
            return;
        }
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        let mut released = 0usize;
        for (id, revision) in self.owned.drain(..) {
            if registry.unregister_revision(&id, revision) {
                released += 1;
            }
        }
        debug!(
            "event=scope_close module=plugin status=ok scope_id={} released={released}",
            self.id
        );
    }
}

impl Drop for PluginScope<'_> {
    fn drop(&mut self) {
        self.release_all();
    }
}
