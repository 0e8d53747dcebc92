//! Host-to-document mirroring of ambient state.

use frame_bridge_transport::{AmbientState, HostMessage, Size};

/// Holds the host's ambient state and produces the messages that mirror it.
#[derive(Debug, Default)]
pub struct StateSynchronizer {
    ambient: AmbientState,
}

impl StateSynchronizer {
    /// Create a synchronizer with the host's current theme.
    #[must_use]
    pub const fn new(theme_dark: bool) -> Self {
        Self {
            ambient: AmbientState {
                theme_dark,
                negotiated_size: None,
            },
        }
    }

    /// Current ambient state.
    #[must_use]
    pub const fn ambient(&self) -> AmbientState {
        self.ambient
    }

    /// Size negotiated in the current session.
    #[must_use]
    pub const fn negotiated_size(&self) -> Option<Size> {
        self.ambient.negotiated_size
    }

    /// Update the theme flag. Returns true if it changed.
    pub fn set_theme(&mut self, theme_dark: bool) -> bool {
        if self.ambient.theme_dark == theme_dark {
            return false;
        }
        self.ambient.theme_dark = theme_dark;
        true
    }

    /// Record the handshake's size hint and return the state to send.
    pub fn on_ready(&mut self, size_hint: Option<Size>) -> HostMessage {
        if size_hint.is_some() {
            self.ambient.negotiated_size = size_hint;
        }
        self.snapshot()
    }

    /// Full ambient state as a message.
    #[must_use]
    pub const fn snapshot(&self) -> HostMessage {
        HostMessage::AmbientState {
            payload: self.ambient,
        }
    }

    /// Forget session-scoped state. The theme survives.
    pub fn clear_session(&mut self) {
        self.ambient.negotiated_size = None;
    }
}
