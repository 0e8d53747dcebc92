//! In-memory port.

use std::sync::{
    Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use frame_bridge_core::{
    FramePort, InboundFrame, Listener, ListenerId, ListenerRegistry, PortError,
};

use crate::protocol::HostMessage;

/// A message the host posted through a [`MemoryPort`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub target_origin: String,
    pub data: String,
}

impl PostedMessage {
    /// Decode the posted data.
    #[must_use]
    pub fn decode(&self) -> Option<HostMessage> {
        serde_json::from_str(&self.data).ok()
    }
}

/// In-process port implementation.
///
/// Useful for tests and single-process embeddings. Outbound messages are
/// recorded; inbound messages are injected with [`MemoryPort::deliver`]
/// under any origin.
#[derive(Default)]
pub struct MemoryPort {
    listeners: ListenerRegistry,
    posted: Mutex<Vec<PostedMessage>>,
    closed: AtomicBool,
}

impl MemoryPort {
    /// Create a new in-memory port.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a message from the embedded side to every listener.
    pub fn deliver(&self, origin: &str, data: &str) {
        self.listeners.dispatch(&InboundFrame::new(origin, data));
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Drain the messages posted so far.
    pub fn take_posted(&self) -> Vec<PostedMessage> {
        std::mem::take(&mut *self.posted.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Drain and decode the messages posted so far.
    pub fn take_messages(&self) -> Vec<HostMessage> {
        self.take_posted()
            .iter()
            .filter_map(PostedMessage::decode)
            .collect()
    }

    /// Make every later `post` fail.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl FramePort for MemoryPort {
    fn add_listener(&self, listener: Listener) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners.remove(id);
    }

    fn post(&self, data: String, target_origin: &str) -> Result<(), PortError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PortError::Closed);
        }
        self.posted
            .lock()
            .map_err(|e| PortError::Internal(e.to_string()))?
            .push(PostedMessage {
                target_origin: target_origin.to_string(),
                data,
            });
        Ok(())
    }
}
