//! Session state machine.
//!
//! `Closed -> Open(AwaitingReady) -> Open(Ready) -> Closed`. The controller is
//! synchronous; inbound frames reach it through an mpsc queue fed by the
//! gate's listener, so whoever owns the queue decides when they are handled.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use frame_bridge_core::{
    BridgeConfig, FramePort, InboundFrame, Listener, SessionId, ValueBridge,
};
use frame_bridge_transport::{FrameMessage, HostMessage, Rejection, Size, TransportGate};
use serde_json::{Map, Number, Value};
use tokio::sync::{broadcast, mpsc, watch};
use uuid::Uuid;

use crate::{
    events::{BridgeStatus, CloseReason, SaveFailure, SessionEvent},
    handshake::HandshakeTracker,
    sync::StateSynchronizer,
};

const EVENT_CAPACITY: usize = 64;

/// An inbound frame tagged with the session whose listener received it.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub session: SessionId,
    pub frame: InboundFrame,
}

/// Parse the external value into the `load` payload.
///
/// Anything that is not a JSON object, including an empty string, yields an
/// empty object.
#[must_use]
pub fn hydrate(pending: &str) -> Map<String, Value> {
    if pending.trim().is_empty() {
        return Map::new();
    }
    match serde_json::from_str::<Value>(pending) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            tracing::debug!("External value is not a JSON object, hydrating with {{}}");
            Map::new()
        }
        Err(e) => {
            tracing::debug!("External value is not valid JSON, hydrating with {{}}: {e}");
            Map::new()
        }
    }
}

/// Render a `save` payload as the committed external value.
///
/// Whole-valued floats are written as integers, so `1.0` commits as `1`.
///
/// # Errors
/// Returns error if the payload cannot be serialized.
pub fn render_commit(payload: &Value) -> Result<String, serde_json::Error> {
    let mut payload = payload.clone();
    integralize(&mut payload);
    serde_json::to_string_pretty(&payload)
}

// Largest integer an f64 holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn integralize(value: &mut Value) {
    match value {
        Value::Number(n) if n.is_f64() => {
            let f = n.as_f64().unwrap_or(f64::NAN);
            if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER {
                *n = Number::from(f as i64);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(integralize),
        Value::Object(map) => map.values_mut().for_each(integralize),
        _ => {}
    }
}

struct OpenSession {
    id: SessionId,
    pending_value: String,
    save_deadline: Option<Instant>,
}

enum Phase {
    Closed,
    Open(OpenSession),
}

/// Owns the channel session and dispatches everything that happens to it.
pub struct SessionController {
    gate: TransportGate,
    handshake: HandshakeTracker,
    synchronizer: StateSynchronizer,
    value: ValueBridge,
    phase: Phase,
    save_timeout: Duration,
    inbound_tx: mpsc::UnboundedSender<Inbound>,
    events: broadcast::Sender<SessionEvent>,
    status: watch::Sender<BridgeStatus>,
}

impl SessionController {
    /// Create a closed controller.
    ///
    /// Returns the controller and the queue its listener feeds; pass each
    /// queued item to [`SessionController::handle_inbound`].
    #[must_use]
    pub fn new(
        config: &BridgeConfig,
        port: Arc<dyn FramePort>,
        value: ValueBridge,
    ) -> (Self, mpsc::UnboundedReceiver<Inbound>) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (status, _) = watch::channel(BridgeStatus::default());

        let controller = Self {
            gate: TransportGate::new(port, config.target_origin.clone()),
            handshake: HandshakeTracker::new(),
            synchronizer: StateSynchronizer::default(),
            value,
            phase: Phase::Closed,
            save_timeout: config.save_timeout,
            inbound_tx,
            events,
            status,
        };
        (controller, inbound_rx)
    }

    /// Receiver for session events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Receiver for UI flags.
    #[must_use]
    pub fn status(&self) -> watch::Receiver<BridgeStatus> {
        self.status.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<SessionEvent> {
        self.events.clone()
    }

    /// The value this controller commits to.
    #[must_use]
    pub const fn value(&self) -> &ValueBridge {
        &self.value
    }

    /// Id of the open session.
    #[must_use]
    pub const fn session_id(&self) -> Option<SessionId> {
        match &self.phase {
            Phase::Open(open) => Some(open.id),
            Phase::Closed => None,
        }
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.phase, Phase::Open(_))
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.handshake.is_ready()
    }

    /// Instant at which the outstanding `requestSave` expires.
    #[must_use]
    pub const fn save_deadline(&self) -> Option<Instant> {
        match &self.phase {
            Phase::Open(open) => open.save_deadline,
            Phase::Closed => None,
        }
    }

    /// Open a session, snapshotting the external value for hydration.
    ///
    /// Opening an open session returns its id and changes nothing.
    pub fn open(&mut self) -> SessionId {
        if let Phase::Open(open) = &self.phase {
            return open.id;
        }

        let id = Uuid::new_v4();
        let tx = self.inbound_tx.clone();
        let listener: Listener = Arc::new(move |frame: InboundFrame| {
            let _ = tx.send(Inbound { session: id, frame });
        });
        self.gate.arm(listener);

        self.phase = Phase::Open(OpenSession {
            id,
            pending_value: self.value.current_value(),
            save_deadline: None,
        });

        tracing::info!(session = %id, origin = %self.gate.target_origin(), "Session opened");
        self.publish_status();
        self.emit(SessionEvent::Opened { session: id });
        id
    }

    /// Host-side cancel: close without touching the value.
    pub fn close(&mut self) {
        self.close_with(CloseReason::HostCancelled);
    }

    /// Close because the owner is going away.
    pub fn shutdown(&mut self) {
        self.close_with(CloseReason::Shutdown);
    }

    /// Ask the document to clear its form. No local state changes.
    pub fn reset(&self) {
        if !self.is_open() {
            tracing::debug!("Reset while closed ignored");
            return;
        }
        self.send(&HostMessage::Reset);
    }

    /// Ask the document to reply with `save`, bounded by the save timeout.
    pub fn request_save(&mut self, now: Instant) {
        let Some(id) = self.session_id() else {
            tracing::debug!("Save request while closed ignored");
            return;
        };

        if !self.handshake.is_ready() {
            self.emit(SessionEvent::SaveFailed {
                session: id,
                reason: SaveFailure::NotReady,
            });
            return;
        }

        if !self.send(&HostMessage::RequestSave) {
            self.emit(SessionEvent::SaveFailed {
                session: id,
                reason: SaveFailure::Undelivered,
            });
            return;
        }

        let deadline = now + self.save_timeout;
        if let Phase::Open(open) = &mut self.phase {
            open.save_deadline = Some(deadline);
        }
        tracing::debug!(session = %id, timeout = ?self.save_timeout, "Save requested");
        self.publish_status();
    }

    /// Report a timed-out `requestSave` if its deadline has passed.
    pub fn expire_save(&mut self, now: Instant) {
        let Phase::Open(open) = &mut self.phase else {
            return;
        };
        let Some(deadline) = open.save_deadline else {
            return;
        };
        if now < deadline {
            return;
        }

        open.save_deadline = None;
        let id = open.id;
        tracing::warn!(session = %id, "Embedded document did not answer save request");
        self.publish_status();
        self.emit(SessionEvent::SaveFailed {
            session: id,
            reason: SaveFailure::TimedOut,
        });
    }

    /// Update the host theme, mirroring it if the document is ready.
    pub fn set_theme(&mut self, theme_dark: bool) {
        if !self.synchronizer.set_theme(theme_dark) {
            return;
        }
        if self.is_open() {
            self.send(&self.synchronizer.snapshot());
        }
        self.publish_status();
    }

    /// Handle one queued inbound frame.
    pub fn handle_inbound(&mut self, inbound: Inbound) {
        let Some(current) = self.session_id() else {
            tracing::debug!(session = %inbound.session, "Dropping frame for closed session");
            return;
        };
        if inbound.session != current {
            tracing::debug!(session = %inbound.session, "Dropping stale frame");
            return;
        }

        let message = match self.gate.accept(&inbound.frame) {
            Ok(message) => message,
            Err(Rejection::OriginMismatch { observed }) => {
                tracing::debug!(session = %current, origin = %observed, "Dropping frame from unexpected origin");
                return;
            }
            Err(e) => {
                tracing::debug!(session = %current, "Dropping frame: {e}");
                return;
            }
        };

        tracing::debug!(session = %current, kind = message.kind(), "Inbound message");
        match message {
            FrameMessage::Ready { size } => self.on_ready(current, size),
            FrameMessage::Save { payload } => self.on_save(current, &payload),
            FrameMessage::Cancel => self.close_with(CloseReason::FrameCancelled),
        }
    }

    fn on_ready(&mut self, id: SessionId, size: Option<Size>) {
        if !self.handshake.observe_ready() {
            tracing::debug!(session = %id, "Repeated ready ignored");
            return;
        }

        let payload = match &self.phase {
            Phase::Open(open) => hydrate(&open.pending_value),
            Phase::Closed => return,
        };
        self.send(&HostMessage::Load { payload });

        let ambient = self.synchronizer.on_ready(size);
        self.send(&ambient);

        self.publish_status();
        self.emit(SessionEvent::Ready { session: id, size });
    }

    fn on_save(&mut self, id: SessionId, payload: &Value) {
        let value = match render_commit(payload) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(session = %id, "Failed to render save payload: {e}");
                return;
            }
        };

        self.value.commit(value.clone());
        tracing::info!(session = %id, "Value committed");
        self.emit(SessionEvent::Committed { session: id, value });
        self.close_with(CloseReason::Saved);
    }

    fn close_with(&mut self, reason: CloseReason) {
        let Phase::Open(open) = std::mem::replace(&mut self.phase, Phase::Closed) else {
            return;
        };

        self.gate.disarm();
        self.handshake.reset();
        self.synchronizer.clear_session();

        tracing::info!(session = %open.id, ?reason, "Session closed");
        self.publish_status();
        self.emit(SessionEvent::Closed {
            session: open.id,
            reason,
        });
    }

    fn send(&self, message: &HostMessage) -> bool {
        if !self.handshake.admits(message) {
            tracing::debug!(kind = message.kind(), "Awaiting ready, message not sent");
            return false;
        }
        self.gate.send(message)
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn publish_status(&self) {
        self.status.send_replace(BridgeStatus {
            open: self.is_open(),
            ready: self.handshake.is_ready(),
            saving: self.save_deadline().is_some(),
            theme_dark: self.synchronizer.ambient().theme_dark,
            negotiated_size: self.synchronizer.negotiated_size(),
        });
    }
}

#[cfg(test)]
mod tests {
    use frame_bridge_core::TargetOrigin;
    use frame_bridge_transport::{AmbientState, MemoryPort};
    use serde_json::json;

    use super::*;

    const ORIGIN: &str = "https://forms.example.com";
    const EVIL: &str = "https://evil.example.com";

    struct Harness {
        port: Arc<MemoryPort>,
        controller: SessionController,
        inbound: mpsc::UnboundedReceiver<Inbound>,
        events: broadcast::Receiver<SessionEvent>,
        value: ValueBridge,
    }

    impl Harness {
        fn new(initial: &str) -> Self {
            let port = Arc::new(MemoryPort::new());
            let value = ValueBridge::new(initial);
            let config = BridgeConfig::new(TargetOrigin::parse(ORIGIN).unwrap())
                .with_save_timeout(Duration::from_secs(5));
            let (controller, inbound) = SessionController::new(&config, port.clone(), value.clone());
            let events = controller.subscribe();
            Self {
                port,
                controller,
                inbound,
                events,
                value,
            }
        }

        fn deliver(&mut self, origin: &str, data: &str) {
            self.port.deliver(origin, data);
            self.pump();
        }

        fn pump(&mut self) {
            while let Ok(inbound) = self.inbound.try_recv() {
                self.controller.handle_inbound(inbound);
            }
        }

        fn ready(&mut self) {
            self.deliver(ORIGIN, r#"{"type":"ready"}"#);
        }

        fn events(&mut self) -> Vec<SessionEvent> {
            let mut out = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                out.push(event);
            }
            out
        }

        fn committed(&mut self) -> usize {
            self.events()
                .iter()
                .filter(|e| matches!(e, SessionEvent::Committed { .. }))
                .count()
        }
    }

    fn load(payload: Value) -> HostMessage {
        let Value::Object(payload) = payload else {
            panic!("load payload must be an object");
        };
        HostMessage::Load { payload }
    }

    fn ambient(theme_dark: bool) -> HostMessage {
        HostMessage::AmbientState {
            payload: AmbientState {
                theme_dark,
                negotiated_size: None,
            },
        }
    }

    #[test]
    fn test_hydrate() {
        assert_eq!(Value::Object(hydrate(r#"{"name":"x"}"#)), json!({"name": "x"}));
        assert!(hydrate("").is_empty());
        assert!(hydrate("   ").is_empty());
        assert!(hydrate("{not json").is_empty());
        assert!(hydrate("[1,2,3]").is_empty());
        assert!(hydrate("\"text\"").is_empty());
    }

    #[test]
    fn test_render_commit_is_pretty_and_ordered() {
        let rendered = render_commit(&json!({"name": "y", "age": 3})).unwrap();
        assert_eq!(rendered, "{\n  \"name\": \"y\",\n  \"age\": 3\n}");
    }

    #[test]
    fn test_render_commit_writes_whole_floats_as_integers() {
        let rendered = render_commit(&json!({"n": 1.0, "m": [-0.0, 2.5, 3]})).unwrap();
        assert_eq!(
            rendered,
            "{\n  \"n\": 1,\n  \"m\": [\n    0,\n    2.5,\n    3\n  ]\n}"
        );
    }

    #[test]
    fn test_unusable_size_hint_still_completes_handshake() {
        let mut h = Harness::new(r#"{"name":"x"}"#);
        h.controller.open();
        h.deliver(ORIGIN, r#"{"type":"ready","size":{"width":800.5,"height":600}}"#);

        assert!(h.controller.is_ready());
        assert_eq!(
            h.port.take_messages(),
            vec![load(json!({"name": "x"})), ambient(false)]
        );
        assert_eq!(h.controller.status().borrow().negotiated_size, None);
    }

    #[test]
    fn test_nothing_gated_is_sent_before_ready() {
        let mut h = Harness::new(r#"{"name":"x"}"#);
        h.controller.open();
        h.controller.set_theme(true);
        h.controller.request_save(Instant::now());
        assert!(h.port.take_messages().is_empty());

        h.ready();
        assert_eq!(
            h.port.take_messages(),
            vec![load(json!({"name": "x"})), ambient(true)]
        );
    }

    #[test]
    fn test_empty_value_hydrates_empty_object() {
        let mut h = Harness::new("");
        h.controller.open();
        h.ready();
        assert_eq!(h.port.take_messages(), vec![load(json!({})), ambient(false)]);
    }

    #[test]
    fn test_hydration_snapshot_taken_at_open() {
        let mut h = Harness::new(r#"{"v":1}"#);
        h.controller.open();
        h.value.replace(r#"{"v":2}"#);
        h.ready();
        assert_eq!(h.port.take_messages()[0], load(json!({"v": 1})));

        h.controller.close();
        h.controller.open();
        h.ready();
        assert_eq!(h.port.take_messages()[0], load(json!({"v": 2})));
    }

    #[test]
    fn test_origin_mismatch_is_inert_for_every_kind() {
        let mut h = Harness::new("before");
        let id = h.controller.open();
        h.events();

        for data in [
            r#"{"type":"ready","size":{"width":10,"height":10}}"#,
            r#"{"type":"save","payload":{"name":"evil"}}"#,
            r#"{"type":"cancel"}"#,
        ] {
            h.deliver(EVIL, data);
        }

        assert_eq!(h.controller.session_id(), Some(id));
        assert!(!h.controller.is_ready());
        assert!(h.port.take_posted().is_empty());
        assert!(h.events().is_empty());
        assert_eq!(h.value.current_value(), "before");
        assert_eq!(*h.controller.status().borrow(), BridgeStatus {
            open: true,
            ..BridgeStatus::default()
        });
    }

    #[test]
    fn test_malformed_frames_are_dropped() {
        let mut h = Harness::new("");
        h.controller.open();
        h.deliver(ORIGIN, "{}");
        h.deliver(ORIGIN, r#"{"type":"save"}"#);
        h.deliver(ORIGIN, r#"{"type":"load","payload":{}}"#);
        assert!(h.controller.is_open());
        assert!(!h.controller.is_ready());
    }

    #[test]
    fn test_listener_never_leaks_or_doubles() {
        let mut h = Harness::new("");
        for _ in 0..2 {
            h.controller.open();
            h.controller.open();
            assert_eq!(h.port.listener_count(), 1);
            h.controller.close();
            assert_eq!(h.port.listener_count(), 0);
        }

        h.controller.open();
        h.ready();
        h.deliver(ORIGIN, r#"{"type":"cancel"}"#);
        assert_eq!(h.port.listener_count(), 0);
    }

    #[test]
    fn test_save_commits_once() {
        let mut h = Harness::new(r#"{"name":"x"}"#);
        h.controller.open();
        h.ready();
        h.deliver(ORIGIN, r#"{"type":"save","payload":{"name":"y"}}"#);

        assert_eq!(h.value.current_value(), "{\n  \"name\": \"y\"\n}");
        assert!(!h.controller.is_open());
        assert!(!h.controller.is_ready());

        h.deliver(ORIGIN, r#"{"type":"cancel"}"#);
        h.deliver(ORIGIN, r#"{"type":"save","payload":{"name":"z"}}"#);
        assert_eq!(h.committed(), 1);
        assert_eq!(h.value.current_value(), "{\n  \"name\": \"y\"\n}");
    }

    #[test]
    fn test_save_payload_is_committed_verbatim() {
        let mut h = Harness::new("");
        h.controller.open();
        h.deliver(ORIGIN, r#"{"type":"save","payload":[1,"two",null]}"#);
        assert_eq!(h.value.current_value(), "[\n  1,\n  \"two\",\n  null\n]");
    }

    #[test]
    fn test_save_queued_before_close_is_stale() {
        let mut h = Harness::new("kept");
        h.controller.open();
        h.ready();

        // Delivered to the listener, but not handled until after close.
        h.port.deliver(ORIGIN, r#"{"type":"save","payload":{"name":"late"}}"#);
        h.controller.close();
        h.pump();

        assert_eq!(h.value.current_value(), "kept");
        assert_eq!(h.committed(), 0);
    }

    #[test]
    fn test_frame_from_previous_session_is_stale() {
        let mut h = Harness::new("kept");
        h.controller.open();
        h.port.deliver(ORIGIN, r#"{"type":"save","payload":{"name":"old"}}"#);
        h.controller.close();
        h.controller.open();
        h.pump();

        assert!(h.controller.is_open());
        assert_eq!(h.value.current_value(), "kept");
    }

    #[test]
    fn test_cancel_discards() {
        let mut h = Harness::new("kept");
        let id = h.controller.open();
        h.ready();
        h.events();

        h.deliver(ORIGIN, r#"{"type":"cancel"}"#);
        assert_eq!(h.value.current_value(), "kept");
        assert_eq!(
            h.events(),
            vec![SessionEvent::Closed {
                session: id,
                reason: CloseReason::FrameCancelled
            }]
        );
    }

    #[test]
    fn test_host_close_leaves_value() {
        let mut h = Harness::new("kept");
        let id = h.controller.open();
        h.events();

        h.controller.close();
        h.controller.close();
        assert_eq!(h.value.current_value(), "kept");
        assert_eq!(
            h.events(),
            vec![SessionEvent::Closed {
                session: id,
                reason: CloseReason::HostCancelled
            }]
        );
    }

    #[test]
    fn test_theme_toggle_sends_one_update() {
        let mut h = Harness::new("");
        h.controller.open();
        h.ready();
        assert_eq!(h.port.take_messages(), vec![load(json!({})), ambient(false)]);

        h.controller.set_theme(true);
        assert_eq!(h.port.take_messages(), vec![ambient(true)]);

        h.controller.set_theme(true);
        assert!(h.port.take_messages().is_empty());
    }

    #[test]
    fn test_theme_change_while_closed_is_remembered() {
        let mut h = Harness::new("");
        h.controller.set_theme(true);
        assert!(h.port.take_posted().is_empty());

        h.controller.open();
        h.ready();
        assert_eq!(h.port.take_messages()[1], ambient(true));
    }

    #[test]
    fn test_size_hint_is_negotiated_per_session() {
        let mut h = Harness::new("");
        h.controller.open();
        h.deliver(ORIGIN, r#"{"type":"ready","size":{"width":800,"height":600}}"#);

        let size = Size {
            width: 800,
            height: 600,
        };
        assert_eq!(h.controller.status().borrow().negotiated_size, Some(size));
        assert_eq!(
            h.port.take_messages()[1],
            HostMessage::AmbientState {
                payload: AmbientState {
                    theme_dark: false,
                    negotiated_size: Some(size),
                },
            }
        );

        h.controller.close();
        assert_eq!(h.controller.status().borrow().negotiated_size, None);
    }

    #[test]
    fn test_repeated_ready_is_ignored() {
        let mut h = Harness::new("");
        h.controller.open();
        h.ready();
        h.port.take_posted();

        h.ready();
        assert!(h.port.take_posted().is_empty());
    }

    #[test]
    fn test_reset_is_forwarded_without_local_change() {
        let mut h = Harness::new("kept");
        h.controller.reset();
        assert!(h.port.take_posted().is_empty());

        h.controller.open();
        h.controller.reset();
        assert_eq!(h.port.take_messages(), vec![HostMessage::Reset]);
        assert!(h.controller.is_open());
        assert_eq!(h.value.current_value(), "kept");
    }

    #[test]
    fn test_request_save_before_ready_fails_fast() {
        let mut h = Harness::new("");
        let id = h.controller.open();
        h.events();

        h.controller.request_save(Instant::now());
        assert!(h.port.take_posted().is_empty());
        assert_eq!(h.controller.save_deadline(), None);
        assert_eq!(
            h.events(),
            vec![SessionEvent::SaveFailed {
                session: id,
                reason: SaveFailure::NotReady
            }]
        );
    }

    #[test]
    fn test_request_save_times_out_once() {
        let mut h = Harness::new("");
        let id = h.controller.open();
        h.ready();
        h.port.take_posted();
        h.events();

        let start = Instant::now();
        h.controller.request_save(start);
        assert_eq!(h.port.take_messages(), vec![HostMessage::RequestSave]);
        assert!(h.controller.status().borrow().saving);

        h.controller.expire_save(start + Duration::from_secs(4));
        assert!(h.events().is_empty());

        h.controller.expire_save(start + Duration::from_secs(5));
        h.controller.expire_save(start + Duration::from_secs(6));
        assert_eq!(
            h.events(),
            vec![SessionEvent::SaveFailed {
                session: id,
                reason: SaveFailure::TimedOut
            }]
        );
        assert!(h.controller.is_open());
        assert!(!h.controller.status().borrow().saving);

        // A late reply still commits.
        h.deliver(ORIGIN, r#"{"type":"save","payload":{"ok":true}}"#);
        assert_eq!(h.value.current_value(), "{\n  \"ok\": true\n}");
    }

    #[test]
    fn test_save_reply_clears_deadline() {
        let mut h = Harness::new("");
        h.controller.open();
        h.ready();

        let start = Instant::now();
        h.controller.request_save(start);
        h.deliver(ORIGIN, r#"{"type":"save","payload":{}}"#);
        h.events();

        h.controller.expire_save(start + Duration::from_secs(60));
        assert!(h.events().is_empty());
        assert_eq!(h.controller.save_deadline(), None);
    }

    #[test]
    fn test_undeliverable_save_request_is_reported() {
        let mut h = Harness::new("");
        let id = h.controller.open();
        h.ready();
        h.events();

        h.port.close();
        h.controller.request_save(Instant::now());
        assert_eq!(
            h.events(),
            vec![SessionEvent::SaveFailed {
                session: id,
                reason: SaveFailure::Undelivered
            }]
        );
        assert_eq!(h.controller.save_deadline(), None);
    }
}
