//! Listener bookkeeping shared by port implementations.

use std::sync::{
    RwLock,
    atomic::{AtomicU64, Ordering},
};

use crate::traits::{InboundFrame, Listener, ListenerId};

/// Registered listeners of a port.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(ListenerId, Listener)>>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn add(&self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.write().push((id, listener));
        id
    }

    /// Remove a listener; unknown ids are ignored.
    pub fn remove(&self, id: ListenerId) {
        self.write().retain(|(existing, _)| *existing != id);
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver a frame to every listener.
    ///
    /// Listeners are called outside the lock, so a listener may add or remove
    /// listeners without deadlocking.
    pub fn dispatch(&self, frame: &InboundFrame) {
        let snapshot: Vec<Listener> = self.read().iter().map(|(_, l)| l.clone()).collect();
        for listener in snapshot {
            listener(frame.clone());
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<(ListenerId, Listener)>> {
        self.listeners
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<(ListenerId, Listener)>> {
        self.listeners
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
