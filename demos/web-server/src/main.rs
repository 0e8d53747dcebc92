//! Example host for an embedded JSON form.
//!
//! Run with: cargo run -p frame-bridge-demo
//!
//! Then open http://127.0.0.1:3000/json-form-page.html in your browser. The
//! page plays the embedded document and talks to the host over a WebSocket.
//! Each WebSocket is one modal: its session opens on connect and the socket
//! is dropped when the session closes; the page's Reopen button connects
//! again for a fresh session. Host-side buttons are plain HTTP endpoints:
//!
//! ```text
//! curl -X POST http://127.0.0.1:3000/request-save
//! curl -X POST http://127.0.0.1:3000/theme/dark
//! curl http://127.0.0.1:3000/value
//! ```

use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::{Path, State, WebSocketUpgrade, ws::WebSocket},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use frame_bridge_core::{BridgeConfig, ConfigError, TargetOrigin, ValueBridge};
use frame_bridge_session::{
    SessionController, SessionEvent, SessionHandle, spawn_session,
};
use frame_bridge_transport::websocket::{WsFramePort, request_origin};
use tokio::sync::{
    RwLock,
    broadcast::{self, error::RecvError},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

const DEMO_ORIGIN: &str = "http://127.0.0.1:3000";
const INITIAL_VALUE: &str = r#"{
  "name": "username",
  "type": "string",
  "description": "User's login name",
  "value": "john_doe"
}"#;

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<BridgeConfig>,
    value: ValueBridge,
    sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>, // ws_id -> session
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = match BridgeConfig::from_env() {
        Ok(config) => config,
        Err(ConfigError::Missing(_)) => BridgeConfig::new(TargetOrigin::parse(DEMO_ORIGIN)?),
        Err(e) => return Err(e.into()),
    };
    tracing::info!(origin = %config.target_origin, "Accepting embedded documents");

    let state = AppState {
        value: ValueBridge::new(INITIAL_VALUE),
        sessions: Arc::new(RwLock::new(HashMap::new())),
        config: Arc::new(config.clone()),
    };

    let app = Router::new()
        .route(config.frame_src_for(None), get(form_page_handler))
        .route("/ws", get(ws_handler))
        .route("/value", get(value_handler))
        .route("/close", post(close_handler))
        .route("/request-save", post(request_save_handler))
        .route("/reset", post(reset_handler))
        .route("/theme/{mode}", post(theme_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    tracing::info!("Server listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn form_page_handler() -> Html<&'static str> {
    Html(FORM_HTML)
}

async fn value_handler(State(state): State<AppState>) -> String {
    state.value.current_value()
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    let Some(origin) = request_origin(&headers) else {
        return (StatusCode::FORBIDDEN, "Origin header required").into_response();
    };
    ws.on_upgrade(move |socket| handle_socket(socket, origin, state))
}

async fn handle_socket(socket: WebSocket, origin: String, state: AppState) {
    let ws_id = Uuid::new_v4();
    let (port, mut reader) = WsFramePort::attach(socket, origin);
    let (controller, inbound) = SessionController::new(&state.config, port, state.value.clone());
    let (handle, driver) = spawn_session(controller, inbound);

    let mut events = handle.subscribe();
    state.sessions.write().await.insert(ws_id, handle.clone());
    if let Err(e) = handle.open() {
        tracing::error!("Failed to open session: {e}");
    }

    // The socket lives as long as its session.
    tokio::select! {
        _ = &mut reader => {}
        () = log_until_closed(&mut events) => reader.abort(),
    }

    // Cleanup
    state.sessions.write().await.remove(&ws_id);
    drop(handle);
    let _ = driver.await;

    tracing::info!("WebSocket {ws_id} disconnected");
}

async fn log_until_closed(events: &mut broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::Committed { session, value }) => {
                tracing::info!(%session, "Committed value:\n{value}");
            }
            Ok(SessionEvent::SaveFailed { session, reason }) => {
                tracing::warn!(%session, "Save failed: {reason}");
            }
            Ok(SessionEvent::Closed { session, reason }) => {
                tracing::info!(%session, ?reason, "Session closed");
                return;
            }
            Ok(event) => tracing::debug!(?event, "Session event"),
            Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => return,
        }
    }
}

async fn for_each_session<F>(state: &AppState, f: F) -> StatusCode
where
    F: Fn(&SessionHandle) -> Result<(), frame_bridge_session::DriverError>,
{
    let sessions = state.sessions.read().await;
    for (ws_id, handle) in sessions.iter() {
        if let Err(e) = f(handle) {
            tracing::warn!("Session {ws_id}: {e}");
        }
    }
    if sessions.is_empty() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::ACCEPTED
    }
}

async fn close_handler(State(state): State<AppState>) -> StatusCode {
    for_each_session(&state, SessionHandle::close).await
}

async fn request_save_handler(State(state): State<AppState>) -> StatusCode {
    for_each_session(&state, SessionHandle::request_save).await
}

async fn reset_handler(State(state): State<AppState>) -> StatusCode {
    for_each_session(&state, SessionHandle::reset).await
}

async fn theme_handler(Path(mode): Path<String>, State(state): State<AppState>) -> StatusCode {
    let dark = match mode.as_str() {
        "dark" => true,
        "light" => false,
        _ => return StatusCode::BAD_REQUEST,
    };
    for_each_session(&state, |handle| handle.set_theme(dark)).await
}

const FORM_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>JSON Configuration Form</title>
    <style>
        body {
            font-family: system-ui, sans-serif;
            margin: 16px;
            background: #f8f9fa;
            color: #333;
        }
        body.dark { background: #1e1e1e; color: #d4d4d4; }
        label { display: block; margin-top: 12px; font-size: 14px; }
        input, select, textarea { width: 100%; box-sizing: border-box; padding: 4px; }
        textarea { min-height: 120px; }
        .actions { margin-top: 16px; display: flex; gap: 8px; justify-content: flex-end; }
        .status { color: #888; font-size: 12px; }
    </style>
</head>
<body>
    <div class="status" id="status">Connecting...</div>
    <label>Field Name <input id="name" placeholder="Enter field name"></label>
    <label>Field Type
        <select id="type">
            <option value="string">String</option>
            <option value="number">Number</option>
            <option value="boolean">Boolean</option>
            <option value="array">Array</option>
            <option value="object">Object</option>
        </select>
    </label>
    <label>Description <input id="description" placeholder="Enter field description"></label>
    <label>Value <textarea id="value" placeholder="Enter field value"></textarea></label>
    <div class="actions">
        <button id="reopen" hidden>Reopen</button>
        <button id="cancel">Cancel</button>
        <button id="save">Save JSON</button>
    </div>

    <script>
        const fields = ['name', 'type', 'description', 'value'];
        const status = document.getElementById('status');
        const reopen = document.getElementById('reopen');
        const protocol = window.location.protocol === 'https:' ? 'wss:' : 'ws:';
        let ws;

        function connect() {
            reopen.hidden = true;
            ws = new WebSocket(`${protocol}//${window.location.host}/ws`);

            ws.onopen = () => {
                status.textContent = 'Connected';
                post({
                    type: 'ready',
                    size: { width: document.body.scrollWidth, height: document.body.scrollHeight },
                });
            };

            ws.onclose = () => {
                status.textContent = 'Closed';
                reopen.hidden = false;
            };

            ws.onmessage = (event) => {
                let msg;
                try {
                    msg = JSON.parse(event.data);
                } catch (e) {
                    return;
                }
                switch (msg.type) {
                    case 'load':
                        fill(msg.payload || {});
                        break;
                    case 'reset':
                        fill({});
                        break;
                    case 'requestSave':
                        finish({ type: 'save', payload: collect() });
                        break;
                    case 'ambientState':
                        document.body.classList.toggle('dark', !!msg.payload.themeDark);
                        break;
                }
            };
        }

        function post(msg) {
            if (ws.readyState === WebSocket.OPEN) {
                ws.send(JSON.stringify(msg));
            }
        }

        // save and cancel end the host session; drop the socket with it.
        function finish(msg) {
            post(msg);
            ws.close();
        }

        function fill(payload) {
            for (const field of fields) {
                const el = document.getElementById(field);
                el.value = payload[field] ?? (field === 'type' ? 'string' : '');
            }
        }

        function collect() {
            const data = {};
            for (const field of fields) {
                data[field] = document.getElementById(field).value;
            }
            return data;
        }

        document.getElementById('save').onclick = () => finish({ type: 'save', payload: collect() });
        document.getElementById('cancel').onclick = () => finish({ type: 'cancel' });
        reopen.onclick = connect;
        connect();
    </script>
</body>
</html>
"#;
