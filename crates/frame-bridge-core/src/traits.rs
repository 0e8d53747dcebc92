//! The raw messaging primitive a channel is built on.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

/// Identifies one open-to-close lifetime of a channel.
pub type SessionId = Uuid;

/// A message as delivered by the port, before any validation.
///
/// `data` is the serialized message text. It is only parsed after the
/// origin has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    /// Origin reported by the port for the sender.
    pub origin: String,
    /// Serialized message.
    pub data: String,
}

impl InboundFrame {
    /// Create a frame.
    #[must_use]
    pub fn new(origin: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            data: data.into(),
        }
    }
}

/// Inbound listener callback.
pub type Listener = Arc<dyn Fn(InboundFrame) + Send + Sync>;

/// Handle for removing a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Port error.
#[derive(Debug, Error)]
pub enum PortError {
    #[error("Port closed")]
    Closed,
    #[error("Port error: {0}")]
    Internal(String),
}

/// A bidirectional, postMessage-style messaging primitive.
///
/// Implementations deliver every inbound message to all registered listeners
/// in arrival order and send outbound messages to the embedded document.
pub trait FramePort: Send + Sync {
    /// Register an inbound listener.
    fn add_listener(&self, listener: Listener) -> ListenerId;

    /// Remove a listener. Unknown ids are ignored.
    fn remove_listener(&self, id: ListenerId);

    /// Post a serialized message addressed to `target_origin`.
    ///
    /// # Errors
    /// Returns error if the underlying transport is gone.
    fn post(&self, data: String, target_origin: &str) -> Result<(), PortError>;
}
