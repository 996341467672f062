// ABOUTME: Authoritative map of mount path to deployed context for one running server.
// ABOUTME: All mutations happen under a single lock; reservations guard in-flight uploads.

mod context;

pub use context::DeployedContext;

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::types::MountPath;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("mount path already in use: {0}")]
    DuplicatePath(MountPath),

    #[error("no context deployed at {0}")]
    NotFound(MountPath),
}

#[derive(Debug)]
enum Slot {
    /// Taken by a deployment that is still placing its artifact.
    Reserved,
    Active(Arc<DeployedContext>),
}

/// What is deployed where.
///
/// `insert`, `remove` and committed reservations are the only ways the view
/// changes. Reserved paths count as in use but are invisible to `lookup`.
#[derive(Debug, Default)]
pub struct ContextRegistry {
    slots: Mutex<HashMap<MountPath, Slot>>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, path: &MountPath) -> Option<Arc<DeployedContext>> {
        match self.slots.lock().get(path) {
            Some(Slot::Active(context)) => Some(context.clone()),
            _ => None,
        }
    }

    /// Whether the path is deployed or reserved by an in-flight deployment.
    pub fn is_taken(&self, path: &MountPath) -> bool {
        self.slots.lock().contains_key(path)
    }

    /// Register a context under its mount path.
    pub fn insert(&self, context: DeployedContext) -> Result<Arc<DeployedContext>, RegistryError> {
        let mut slots = self.slots.lock();
        let path = context.mount_path().clone();
        if slots.contains_key(&path) {
            return Err(RegistryError::DuplicatePath(path));
        }
        let context = Arc::new(context);
        slots.insert(path, Slot::Active(context.clone()));
        Ok(context)
    }

    /// Unregister the context at `path`.
    pub fn remove(&self, path: &MountPath) -> Result<Arc<DeployedContext>, RegistryError> {
        let mut slots = self.slots.lock();
        take_active(&mut slots, path)
    }

    /// Unregister the context at `path` but keep the path held.
    ///
    /// The returned reservation keeps other deployments off the path until
    /// it is dropped, so the retired artifact can be cleaned up without a
    /// new deployment writing to the same location meanwhile.
    pub fn retire(
        &self,
        path: &MountPath,
    ) -> Result<(Arc<DeployedContext>, Reservation<'_>), RegistryError> {
        let mut slots = self.slots.lock();
        let context = take_active(&mut slots, path)?;
        slots.insert(path.clone(), Slot::Reserved);
        Ok((
            context,
            Reservation {
                registry: self,
                path: path.clone(),
                committed: false,
            },
        ))
    }

    /// Take `path` before any artifact bytes are written.
    ///
    /// The reservation is released on drop unless it is committed.
    pub fn reserve(&self, path: &MountPath) -> Result<Reservation<'_>, RegistryError> {
        let mut slots = self.slots.lock();
        if slots.contains_key(path) {
            return Err(RegistryError::DuplicatePath(path.clone()));
        }
        slots.insert(path.clone(), Slot::Reserved);
        Ok(Reservation {
            registry: self,
            path: path.clone(),
            committed: false,
        })
    }

    /// Snapshot of active contexts, sorted by mount path.
    pub fn contexts(&self) -> Vec<Arc<DeployedContext>> {
        let mut contexts: Vec<_> = self
            .slots
            .lock()
            .values()
            .filter_map(|slot| match slot {
                Slot::Active(context) => Some(context.clone()),
                Slot::Reserved => None,
            })
            .collect();
        contexts.sort_by(|a, b| a.mount_path().cmp(b.mount_path()));
        contexts
    }

    /// Active context with the longest mount path serving `request_path`.
    pub fn resolve(&self, request_path: &str) -> Option<Arc<DeployedContext>> {
        self.slots
            .lock()
            .iter()
            .filter_map(|(path, slot)| match slot {
                Slot::Active(context) if path.matches(request_path) => Some(context),
                _ => None,
            })
            .max_by_key(|context| context.mount_path().as_str().len())
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.contexts().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Remove an active slot; a reserved slot is put back untouched.
fn take_active(
    slots: &mut HashMap<MountPath, Slot>,
    path: &MountPath,
) -> Result<Arc<DeployedContext>, RegistryError> {
    match slots.remove(path) {
        Some(Slot::Active(context)) => Ok(context),
        Some(Slot::Reserved) => {
            slots.insert(path.clone(), Slot::Reserved);
            Err(RegistryError::NotFound(path.clone()))
        }
        None => Err(RegistryError::NotFound(path.clone())),
    }
}

/// A mount path held by an in-flight deployment or undeployment.
pub struct Reservation<'a> {
    registry: &'a ContextRegistry,
    path: MountPath,
    committed: bool,
}

impl std::fmt::Debug for Reservation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reservation")
            .field("path", &self.path)
            .field("committed", &self.committed)
            .finish()
    }
}

impl Reservation<'_> {
    pub fn path(&self) -> &MountPath {
        &self.path
    }

    /// Turn the reservation into a registered context.
    pub fn commit(mut self, context: DeployedContext) -> Arc<DeployedContext> {
        debug_assert_eq!(context.mount_path(), &self.path);
        let context = Arc::new(context);
        self.registry
            .slots
            .lock()
            .insert(self.path.clone(), Slot::Active(context.clone()));
        self.committed = true;
        context
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let mut slots = self.registry.slots.lock();
        if matches!(slots.get(&self.path), Some(Slot::Reserved)) {
            slots.remove(&self.path);
            tracing::debug!("Released reservation for {}", self.path);
        }
    }
}
