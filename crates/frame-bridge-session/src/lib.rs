//! Session state machine for host/embedded-document form channels.
//!
//! Provides:
//! - `SessionController` - Open/close lifecycle, handshake and hydration
//! - `HandshakeTracker` and `StateSynchronizer` - its two sub-machines
//! - `SessionHandle` - Async driver for UI code

pub mod controller;
pub mod driver;
pub mod events;
pub mod handshake;
pub mod sync;

pub use controller::{Inbound, SessionController};
pub use driver::{DriverError, SessionHandle, spawn_session};
pub use events::{BridgeStatus, CloseReason, SaveFailure, SessionEvent};
pub use handshake::{HandshakeState, HandshakeTracker};
pub use sync::StateSynchronizer;
