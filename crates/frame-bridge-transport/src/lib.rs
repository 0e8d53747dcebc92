//! Transport layer for embedded form channels.
//!
//! Provides:
//! - Wire protocol (JSON, `type`-tagged)
//! - `TransportGate` - origin check and scoped listener registration
//! - In-memory port (feature: memory)
//! - WebSocket port (feature: websocket)

pub mod gate;
pub mod protocol;

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "websocket")]
pub mod websocket;

pub use gate::{Rejection, TransportGate};
pub use protocol::{AmbientState, FrameMessage, HostMessage, Size};

#[cfg(feature = "memory")]
pub use memory::MemoryPort;
