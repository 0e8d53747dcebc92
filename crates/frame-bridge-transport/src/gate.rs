//! Origin-checked access to a [`FramePort`].

use std::sync::Arc;

use frame_bridge_core::{FramePort, InboundFrame, Listener, ListenerId, TargetOrigin};
use thiserror::Error;

use crate::protocol::{FrameMessage, HostMessage};

/// Why the gate refused an inbound frame.
#[derive(Debug, Error)]
pub enum Rejection {
    #[error("Gate is not armed")]
    NotArmed,
    #[error("Origin mismatch: {observed}")]
    OriginMismatch { observed: String },
    #[error("Malformed message: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Registered listener, removed from the port on drop.
struct ListenerGuard {
    port: Arc<dyn FramePort>,
    id: ListenerId,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.port.remove_listener(self.id);
    }
}

/// Wraps a port so that at most one listener is registered, outbound
/// messages only leave while armed, and inbound frames are only decoded when
/// they come from the target origin.
pub struct TransportGate {
    port: Arc<dyn FramePort>,
    target_origin: TargetOrigin,
    listener: Option<ListenerGuard>,
}

impl TransportGate {
    /// Create a disarmed gate.
    #[must_use]
    pub fn new(port: Arc<dyn FramePort>, target_origin: TargetOrigin) -> Self {
        Self {
            port,
            target_origin,
            listener: None,
        }
    }

    /// The origin this gate talks to.
    #[must_use]
    pub const fn target_origin(&self) -> &TargetOrigin {
        &self.target_origin
    }

    /// Whether a listener is registered.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.listener.is_some()
    }

    /// Register `listener` unless already armed.
    ///
    /// Returns true if a listener was registered.
    pub fn arm(&mut self, listener: Listener) -> bool {
        if self.listener.is_some() {
            return false;
        }
        let id = self.port.add_listener(listener);
        self.listener = Some(ListenerGuard {
            port: Arc::clone(&self.port),
            id,
        });
        true
    }

    /// Remove the listener, if any.
    ///
    /// Returns true if a listener was removed.
    pub fn disarm(&mut self) -> bool {
        self.listener.take().is_some()
    }

    /// Post a message to the target origin.
    ///
    /// Returns true if the port accepted it. Sending while disarmed is a
    /// no-op.
    pub fn send(&self, message: &HostMessage) -> bool {
        if !self.is_armed() {
            tracing::debug!(kind = message.kind(), "Gate disarmed, dropping outbound message");
            return false;
        }

        let data = match message.encode() {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(kind = message.kind(), "Failed to serialize message: {e}");
                return false;
            }
        };

        match self.port.post(data, self.target_origin.as_str()) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(kind = message.kind(), "Failed to post message: {e}");
                false
            }
        }
    }

    /// Validate and decode an inbound frame.
    ///
    /// The origin is checked before the data is parsed.
    ///
    /// # Errors
    /// Returns the reason the frame must be dropped.
    pub fn accept(&self, frame: &InboundFrame) -> Result<FrameMessage, Rejection> {
        if !self.is_armed() {
            return Err(Rejection::NotArmed);
        }
        if !self.target_origin.matches(&frame.origin) {
            return Err(Rejection::OriginMismatch {
                observed: frame.origin.clone(),
            });
        }
        FrameMessage::decode(&frame.data).map_err(Rejection::Malformed)
    }
}
