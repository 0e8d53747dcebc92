//! The externally visible value of a form field.

use std::sync::Arc;

use futures::stream::BoxStream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Shared, observable string value owned by the surrounding form field.
///
/// Cloning yields another handle to the same value. The channel only ever
/// writes through [`ValueBridge::commit`]; the form field's own edits go
/// through [`ValueBridge::replace`].
#[derive(Clone)]
pub struct ValueBridge {
    sender: Arc<watch::Sender<String>>,
}

impl Default for ValueBridge {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl ValueBridge {
    /// Create a value bridge with an initial value.
    #[must_use]
    pub fn new(initial: impl Into<String>) -> Self {
        let (sender, _) = watch::channel(initial.into());
        Self {
            sender: Arc::new(sender),
        }
    }

    /// The last committed or replaced value.
    #[must_use]
    pub fn current_value(&self) -> String {
        self.sender.borrow().clone()
    }

    /// Commit a value produced by a successful save.
    ///
    /// Observers are notified even if the value is unchanged.
    pub fn commit(&self, value: String) {
        tracing::debug!(bytes = value.len(), "Committing value");
        self.sender.send_replace(value);
    }

    /// Replace the value from the form field side.
    pub fn replace(&self, value: impl Into<String>) {
        self.sender.send_replace(value.into());
    }

    /// Receiver for reactive observation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.sender.subscribe()
    }

    /// Stream that yields the current value, then every later change.
    #[must_use]
    pub fn changes(&self) -> BoxStream<'static, String> {
        Box::pin(WatchStream::new(self.subscribe()))
    }
}
