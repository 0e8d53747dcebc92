//! What a session reports to the surrounding UI.

use frame_bridge_core::SessionId;
use frame_bridge_transport::Size;
use serde::Serialize;
use thiserror::Error;

/// Why a session closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// The document sent `save` and the value was committed.
    Saved,
    /// The document sent `cancel`.
    FrameCancelled,
    /// The host closed the modal.
    HostCancelled,
    /// The driving task stopped.
    Shutdown,
}

/// Why a requested save did not happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveFailure {
    #[error("The form is still loading, try again in a moment")]
    NotReady,
    #[error("The save request could not be delivered, try again")]
    Undelivered,
    #[error("The form did not respond to the save request, try again")]
    TimedOut,
}

/// Session lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Opened {
        session: SessionId,
    },
    Ready {
        session: SessionId,
        size: Option<Size>,
    },
    /// Fired exactly once per successful save.
    Committed {
        session: SessionId,
        value: String,
    },
    SaveFailed {
        session: SessionId,
        reason: SaveFailure,
    },
    Closed {
        session: SessionId,
        reason: CloseReason,
    },
}

/// Flags the modal chrome renders from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BridgeStatus {
    pub open: bool,
    pub ready: bool,
    /// A `requestSave` is waiting for its reply.
    pub saving: bool,
    pub theme_dark: bool,
    /// Size the chrome should reflow to, if the document asked for one.
    pub negotiated_size: Option<Size>,
}

impl BridgeStatus {
    /// Open but not yet ready.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.open && !self.ready
    }
}
