//! WebSocket port for embedded documents that talk to the host over a socket.
//!
//! The origin of every inbound frame is the `Origin` header of the upgrade
//! request, which browsers set and page scripts cannot override.

use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket},
    http::{HeaderMap, header::ORIGIN},
};
use frame_bridge_core::{
    FramePort, InboundFrame, Listener, ListenerId, ListenerRegistry, PortError,
};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};

/// Read the `Origin` header of an upgrade request.
#[must_use]
pub fn request_origin(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Port backed by an upgraded WebSocket.
pub struct WsFramePort {
    peer_origin: String,
    outbound: mpsc::UnboundedSender<String>,
    listeners: Arc<ListenerRegistry>,
}

impl WsFramePort {
    /// Attach to an upgraded socket.
    ///
    /// Returns the port and the task that reads the socket; the task ends
    /// when the peer closes the connection.
    #[must_use]
    pub fn attach(socket: WebSocket, peer_origin: impl Into<String>) -> (Arc<Self>, JoinHandle<()>) {
        let (mut sender, mut receiver) = socket.split();
        let (outbound, mut rx) = mpsc::unbounded_channel::<String>();
        let listeners = Arc::new(ListenerRegistry::new());
        let peer_origin = peer_origin.into();

        let send_task = tokio::spawn(async move {
            while let Some(text) = rx.recv().await {
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
        });

        let reader_listeners = Arc::clone(&listeners);
        let origin = peer_origin.clone();
        let read_task = tokio::spawn(async move {
            while let Some(msg) = receiver.next().await {
                let text = match msg {
                    Ok(Message::Text(text)) => text.as_str().to_owned(),
                    Ok(Message::Binary(data)) => match String::from_utf8(data.to_vec()) {
                        Ok(s) => s,
                        Err(_) => continue,
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::error!("WebSocket error: {e}");
                        break;
                    }
                };
                reader_listeners.dispatch(&InboundFrame::new(origin.clone(), text));
            }
            send_task.abort();
        });

        let port = Arc::new(Self {
            peer_origin,
            outbound,
            listeners,
        });
        (port, read_task)
    }

    /// Origin of the connected peer.
    #[must_use]
    pub fn peer_origin(&self) -> &str {
        &self.peer_origin
    }
}

impl FramePort for WsFramePort {
    fn add_listener(&self, listener: Listener) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners.remove(id);
    }

    fn post(&self, data: String, target_origin: &str) -> Result<(), PortError> {
        // Same as postMessage: a target that is not the peer's origin gets nothing.
        if target_origin != self.peer_origin {
            tracing::debug!(
                peer = %self.peer_origin,
                target = target_origin,
                "Target origin does not match peer, message not delivered"
            );
            return Ok(());
        }
        self.outbound.send(data).map_err(|_| PortError::Closed)
    }
}
