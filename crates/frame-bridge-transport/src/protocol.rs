//! Wire protocol between host and embedded document.
//!
//! Every message is a JSON object discriminated by its `type` field.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Dimensions reported by the embedded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

/// Host-owned state mirrored into the embedded document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmbientState {
    /// Dark theme active in the host.
    pub theme_dark: bool,
    /// Size negotiated during the handshake, if the document offered one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negotiated_size: Option<Size>,
}

/// Message from host to embedded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostMessage {
    /// Initial form data.
    Load { payload: Map<String, Value> },
    /// Clear the form.
    Reset,
    /// Ask the document to reply with `save`.
    RequestSave,
    /// Full current ambient state.
    AmbientState { payload: AmbientState },
}

impl HostMessage {
    /// Wire name of the message type.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Load { .. } => "load",
            Self::Reset => "reset",
            Self::RequestSave => "requestSave",
            Self::AmbientState { .. } => "ambientState",
        }
    }

    /// Serialize for posting.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Message from embedded document to host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FrameMessage {
    /// The document is listening; optionally carries its preferred size.
    Ready {
        #[serde(
            default,
            deserialize_with = "size_hint",
            skip_serializing_if = "Option::is_none"
        )]
        size: Option<Size>,
    },
    /// Form data to commit.
    Save { payload: Value },
    /// Discard and close.
    Cancel,
}

impl FrameMessage {
    /// Wire name of the message type.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "ready",
            Self::Save { .. } => "save",
            Self::Cancel => "cancel",
        }
    }

    /// Parse an inbound message.
    ///
    /// # Errors
    /// Returns error if the data is not JSON or has no recognized `type`.
    pub fn decode(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}

/// The size hint is advisory; one that does not fit [`Size`] reads as absent
/// so it never costs the handshake.
fn size_hint<'de, D>(deserializer: D) -> Result<Option<Size>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match serde_json::from_value(raw) {
        Ok(size) => Ok(Some(size)),
        Err(e) => {
            tracing::debug!("Ignoring unusable size hint: {e}");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_host_message_shapes() {
        let mut payload = Map::new();
        payload.insert("name".into(), json!("x"));
        let load = HostMessage::Load { payload };
        assert_eq!(
            serde_json::to_value(&load).unwrap(),
            json!({"type": "load", "payload": {"name": "x"}})
        );

        assert_eq!(
            HostMessage::RequestSave.encode().unwrap(),
            r#"{"type":"requestSave"}"#
        );

        let ambient = HostMessage::AmbientState {
            payload: AmbientState {
                theme_dark: true,
                negotiated_size: Some(Size {
                    width: 640,
                    height: 480,
                }),
            },
        };
        assert_eq!(
            serde_json::to_value(&ambient).unwrap(),
            json!({
                "type": "ambientState",
                "payload": {"themeDark": true, "negotiatedSize": {"width": 640, "height": 480}}
            })
        );
    }

    #[test]
    fn test_ambient_state_omits_missing_size() {
        let ambient = HostMessage::AmbientState {
            payload: AmbientState::default(),
        };
        assert_eq!(
            ambient.encode().unwrap(),
            r#"{"type":"ambientState","payload":{"themeDark":false}}"#
        );
    }

    #[test]
    fn test_decode_ready() {
        assert_eq!(
            FrameMessage::decode(r#"{"type":"ready"}"#).unwrap(),
            FrameMessage::Ready { size: None }
        );
        assert_eq!(
            FrameMessage::decode(r#"{"type":"ready","size":{"width":800,"height":600}}"#).unwrap(),
            FrameMessage::Ready {
                size: Some(Size {
                    width: 800,
                    height: 600
                })
            }
        );
    }

    #[test]
    fn test_decode_ready_with_unusable_size() {
        for data in [
            r#"{"type":"ready","size":{"width":800.5,"height":600}}"#,
            r#"{"type":"ready","size":{"width":-1,"height":600}}"#,
            r#"{"type":"ready","size":{"width":8000000000,"height":600}}"#,
            r#"{"type":"ready","size":"large"}"#,
            r#"{"type":"ready","size":null}"#,
        ] {
            assert_eq!(
                FrameMessage::decode(data).unwrap(),
                FrameMessage::Ready { size: None },
                "{data}"
            );
        }
    }

    #[test]
    fn test_decode_save_keeps_key_order() {
        let msg = FrameMessage::decode(r#"{"type":"save","payload":{"z":1,"a":2}}"#).unwrap();
        let FrameMessage::Save { payload } = msg else {
            panic!("Wrong message type");
        };
        let keys: Vec<&String> = payload.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["z", "a"]);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        for data in [
            "not json",
            r#"{"payload":{}}"#,
            r#"{"type":7}"#,
            r#"{"type":"unknown"}"#,
            r#"{"type":"save"}"#,
            r#"{"type":"load","payload":{}}"#,
        ] {
            assert!(FrameMessage::decode(data).is_err(), "{data} should not decode");
        }
    }
}
