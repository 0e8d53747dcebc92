//! Core abstractions for host/embedded-document form channels.
//!
//! This crate provides the fundamental building blocks:
//! - `FramePort` - The postMessage-style primitive a channel runs over
//! - `TargetOrigin` - Validated origin every message is checked against
//! - `ValueBridge` - Observable form-field value the channel commits to
//! - `BridgeConfig` - Channel configuration

pub mod config;
pub mod listeners;
pub mod origin;
pub mod traits;
pub mod value;

pub use config::{BridgeConfig, ConfigError};
pub use listeners::ListenerRegistry;
pub use origin::{OriginError, TargetOrigin};
pub use traits::{FramePort, InboundFrame, Listener, ListenerId, PortError, SessionId};
pub use value::ValueBridge;
