//! Channel configuration.

use std::{collections::HashMap, env, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::origin::{OriginError, TargetOrigin};

/// Default embedded document URL.
pub const DEFAULT_FRAME_SRC: &str = "/json-form-page.html";

/// Default wait for a `save` reply to `requestSave`.
pub const DEFAULT_SAVE_TIMEOUT: Duration = Duration::from_secs(10);

const TARGET_ORIGIN_VAR: &str = "FRAME_BRIDGE_TARGET_ORIGIN";
const SAVE_TIMEOUT_VAR: &str = "FRAME_BRIDGE_SAVE_TIMEOUT_MS";
const FRAME_SRC_VAR: &str = "FRAME_BRIDGE_FRAME_SRC";

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
    #[error("Invalid {var}: {source}")]
    Origin {
        var: &'static str,
        #[source]
        source: OriginError,
    },
    #[error("Invalid {var}: {value:?} is not a number of milliseconds")]
    Timeout { var: &'static str, value: String },
}

/// Configuration for one host-side channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// The only origin messages are sent to and accepted from.
    pub target_origin: TargetOrigin,

    /// How long to wait for a `save` after sending `requestSave`.
    #[serde(default = "default_save_timeout", with = "millis")]
    pub save_timeout: Duration,

    /// Embedded document URL used when no modal-specific source is set.
    #[serde(default = "default_frame_src")]
    pub frame_src: String,

    /// Embedded document URLs keyed by modal variant name.
    #[serde(default)]
    pub frame_sources: HashMap<String, String>,
}

impl BridgeConfig {
    /// Create a configuration with defaults for everything but the origin.
    #[must_use]
    pub fn new(target_origin: TargetOrigin) -> Self {
        Self {
            target_origin,
            save_timeout: DEFAULT_SAVE_TIMEOUT,
            frame_src: DEFAULT_FRAME_SRC.to_string(),
            frame_sources: HashMap::new(),
        }
    }

    /// Set the `requestSave` deadline.
    #[must_use]
    pub const fn with_save_timeout(mut self, save_timeout: Duration) -> Self {
        self.save_timeout = save_timeout;
        self
    }

    /// Register an embedded document URL for a modal variant.
    #[must_use]
    pub fn with_frame_source(mut self, modal: impl Into<String>, src: impl Into<String>) -> Self {
        self.frame_sources.insert(modal.into(), src.into());
        self
    }

    /// Load configuration from `FRAME_BRIDGE_*` environment variables.
    ///
    /// # Errors
    /// Returns error if the target origin is missing or invalid, or the
    /// timeout is not a whole number of milliseconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        let origin = non_empty_var(TARGET_ORIGIN_VAR).ok_or(ConfigError::Missing(TARGET_ORIGIN_VAR))?;
        let target_origin = TargetOrigin::parse(&origin).map_err(|source| ConfigError::Origin {
            var: TARGET_ORIGIN_VAR,
            source,
        })?;

        let mut config = Self::new(target_origin);

        if let Some(raw) = non_empty_var(SAVE_TIMEOUT_VAR) {
            let millis = raw.trim().parse::<u64>().map_err(|_| ConfigError::Timeout {
                var: SAVE_TIMEOUT_VAR,
                value: raw.clone(),
            })?;
            config.save_timeout = Duration::from_millis(millis);
        }

        if let Some(src) = non_empty_var(FRAME_SRC_VAR) {
            config.frame_src = src;
        }

        Ok(config)
    }

    /// Embedded document URL for a modal variant.
    #[must_use]
    pub fn frame_src_for(&self, modal: Option<&str>) -> &str {
        modal
            .and_then(|name| self.frame_sources.get(name))
            .map_or(self.frame_src.as_str(), String::as_str)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn default_save_timeout() -> Duration {
    DEFAULT_SAVE_TIMEOUT
}

fn default_frame_src() -> String {
    DEFAULT_FRAME_SRC.to_string()
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
