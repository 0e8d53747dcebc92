//! Readiness tracking for the embedded document.

use frame_bridge_transport::HostMessage;

/// Handshake state of one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HandshakeState {
    /// Waiting for the document's `ready`.
    #[default]
    AwaitingReady,
    /// `ready` observed.
    Ready,
}

/// Tracks whether the embedded document has announced readiness.
#[derive(Debug, Default)]
pub struct HandshakeTracker {
    state: HandshakeState,
}

impl HandshakeTracker {
    /// Create a tracker awaiting `ready`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> HandshakeState {
        self.state
    }

    /// Whether `ready` was observed.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.state, HandshakeState::Ready)
    }

    /// Record a `ready` message.
    ///
    /// Returns true only on the transition; a repeated `ready` returns false.
    pub fn observe_ready(&mut self) -> bool {
        if self.is_ready() {
            return false;
        }
        self.state = HandshakeState::Ready;
        true
    }

    /// Back to awaiting `ready`. Called on session teardown only.
    pub fn reset(&mut self) {
        self.state = HandshakeState::AwaitingReady;
    }

    /// Whether `message` may be sent in the current state.
    ///
    /// Nothing is queued: whatever a held message would carry is recomputed
    /// from current state once `ready` arrives.
    #[must_use]
    pub const fn admits(&self, message: &HostMessage) -> bool {
        match message {
            HostMessage::Load { .. } | HostMessage::AmbientState { .. } | HostMessage::RequestSave => {
                self.is_ready()
            }
            HostMessage::Reset => true,
        }
    }
}
