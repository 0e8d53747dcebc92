//! Validated target origin for cross-document messaging.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Origin validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OriginError {
    #[error("Wildcard origin is not allowed")]
    Wildcard,
    #[error("Invalid origin {input:?}: {source}")]
    Parse {
        input: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Unsupported origin scheme: {0}")]
    UnsupportedScheme(String),
    #[error("Not a bare origin (path, query, fragment or credentials present): {0}")]
    NotAnOrigin(String),
}

/// The single origin a channel exchanges messages with.
///
/// Stored in its ASCII serialization (`scheme://host[:port]`, lowercase host,
/// default port elided), which is the form browsers report as a message
/// event's origin. Matching against an observed origin is an exact string
/// comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetOrigin(String);

impl TargetOrigin {
    /// Parse and normalize an origin string.
    ///
    /// # Errors
    /// Returns error for `*`, unparseable input, non-http(s) schemes, or input
    /// that carries anything beyond scheme, host and port.
    pub fn parse(raw: &str) -> Result<Self, OriginError> {
        let trimmed = raw.trim();
        if trimmed == "*" {
            return Err(OriginError::Wildcard);
        }

        let url = Url::parse(trimmed).map_err(|source| OriginError::Parse {
            input: trimmed.to_string(),
            source,
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(OriginError::UnsupportedScheme(url.scheme().to_string()));
        }

        let bare = url.username().is_empty()
            && url.password().is_none()
            && url.query().is_none()
            && url.fragment().is_none()
            && url.path() == "/";
        if !bare {
            return Err(OriginError::NotAnOrigin(trimmed.to_string()));
        }

        Ok(Self(url.origin().ascii_serialization()))
    }

    /// The normalized origin string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether an observed message origin is this origin.
    #[must_use]
    pub fn matches(&self, observed: &str) -> bool {
        self.0 == observed
    }
}

impl fmt::Display for TargetOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TargetOrigin {
    type Err = OriginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TargetOrigin {
    type Error = OriginError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TargetOrigin> for String {
    fn from(origin: TargetOrigin) -> Self {
        origin.0
    }
}
