//! Keyed container for trusted collaborator services.
//!
//! # Responsibility
//! - Hold server-only collaborators under stable `ServiceKey` values.
//! - Produce the `ServiceMap` injected into handler factories.
//!
//! # Invariants
//! - Population happens only in the trusted context.
//! - An untrusted read yields an empty map, never a partial one.
//! - Absent keys are omitted, not treated as errors.

use crate::context::{ExecutionContext, TrustBoundaryError};
use crate::service::collaborators::{CommandService, FileSystemService, LogStoreService};
use log::{info, warn};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Stable key for one collaborator slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceKey {
    Command,
    FileSystem,
    LogStore,
}

impl ServiceKey {
    /// Every key a factory may ask for.
    pub const ALL: [ServiceKey; 3] = [Self::Command, Self::FileSystem, Self::LogStore];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::FileSystem => "file_system",
            Self::LogStore => "log_store",
        }
    }
}

/// Typed handle stored under one key.
#[derive(Clone)]
pub enum ServiceHandle {
    Command(Arc<dyn CommandService>),
    FileSystem(Arc<dyn FileSystemService>),
    LogStore(Arc<dyn LogStoreService>),
}

impl ServiceHandle {
    pub fn key(&self) -> ServiceKey {
        match self {
            Self::Command(_) => ServiceKey::Command,
            Self::FileSystem(_) => ServiceKey::FileSystem,
            Self::LogStore(_) => ServiceKey::LogStore,
        }
    }
}

impl Debug for ServiceHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ServiceHandle({})", self.key().as_str())
    }
}

/// Snapshot of collaborators handed to handler factories.
#[derive(Debug, Clone, Default)]
pub struct ServiceMap {
    services: BTreeMap<ServiceKey, ServiceHandle>,
}

impl ServiceMap {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, handle: ServiceHandle) {
        self.services.insert(handle.key(), handle);
    }

    pub fn contains(&self, key: ServiceKey) -> bool {
        self.services.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn keys(&self) -> Vec<ServiceKey> {
        self.services.keys().copied().collect()
    }

    pub fn command(&self) -> Option<Arc<dyn CommandService>> {
        match self.services.get(&ServiceKey::Command) {
            Some(ServiceHandle::Command(service)) => Some(Arc::clone(service)),
            _ => None,
        }
    }

    pub fn file_system(&self) -> Option<Arc<dyn FileSystemService>> {
        match self.services.get(&ServiceKey::FileSystem) {
            Some(ServiceHandle::FileSystem(service)) => Some(Arc::clone(service)),
            _ => None,
        }
    }

    pub fn log_store(&self) -> Option<Arc<dyn LogStoreService>> {
        match self.services.get(&ServiceKey::LogStore) {
            Some(ServiceHandle::LogStore(service)) => Some(Arc::clone(service)),
            _ => None,
        }
    }
}

/// Process-wide collaborator registry, constructed explicitly and passed by
/// reference.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: BTreeMap<ServiceKey, ServiceHandle>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one collaborator; replaces an existing one for the same key.
    pub fn register(&mut self, handle: ServiceHandle) {
        let key = handle.key();
        if self.services.insert(key, handle).is_some() {
            warn!(
                "event=service_replaced module=service status=ok key={}",
                key.as_str()
            );
        }
    }

    pub fn get(&self, key: ServiceKey) -> Option<&ServiceHandle> {
        self.services.get(&key)
    }

    pub fn has(&self, key: ServiceKey) -> bool {
        self.services.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn clear(&mut self) {
        self.services.clear();
    }
}

/// Populates `registry` with server collaborators.
///
/// # Errors
/// - Returns [`TrustBoundaryError`] before touching the registry when
///   `context` is untrusted.
pub fn initialize_server_services(
    context: ExecutionContext,
    registry: &mut ServiceRegistry,
    services: impl IntoIterator<Item = ServiceHandle>,
) -> Result<(), TrustBoundaryError> {
    context.require_trusted("initialize_server_services")?;
    for handle in services {
        registry.register(handle);
    }
    info!(
        "event=services_initialized module=service status=ok count={}",
        registry.len()
    );
    Ok(())
}

/// Collects the service map injected into factories.
///
/// Untrusted contexts always receive the empty map.
pub fn collect_services(context: ExecutionContext, registry: &ServiceRegistry) -> ServiceMap {
    if !context.is_trusted() {
        return ServiceMap::empty();
    }

    let mut map = ServiceMap::empty();
    for key in ServiceKey::ALL {
        if let Some(handle) = registry.get(key) {
            map.insert(handle.clone());
        }
    }
    map
}
