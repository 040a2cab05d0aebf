//! Wire frames exchanged with the protocol sidecar.
//!
//! The transport is newline-delimited JSON over the sidecar's stdin/stdout; every frame is an
//! object tagged by its `type` field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::{Credentials, KeyMutation};
use crate::connection::ConnectionUpdate;

/// Frames sent to the sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundFrame {
    /// First frame of every session: stored credentials (if any) and the browser triple.
    #[serde(rename = "start")]
    Start {
        creds: Option<Credentials>,
        browser: Vec<String>,
    },

    /// A call answered later by a `response` frame carrying the same id.
    #[serde(rename = "request")]
    Request { id: u64, call: BridgeCall },

    /// Answer to a `keys.get` / `keys.set` callback.
    #[serde(rename = "keys.result")]
    KeysResult {
        id: u64,
        ok: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum BridgeCall {
    RequestPairingCode { phone: String },
    SendMessage { jid: String, text: String },
}

impl BridgeCall {
    pub fn method(&self) -> &'static str {
        match self {
            Self::RequestPairingCode { .. } => "requestPairingCode",
            Self::SendMessage { .. } => "sendMessage",
        }
    }
}

/// Frames received from the sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InboundFrame {
    #[serde(rename = "connection.update")]
    ConnectionUpdate(ConnectionUpdate),

    /// Carries the complete current credentials, not a delta.
    #[serde(rename = "creds.update")]
    CredsUpdate { creds: Credentials },

    #[serde(rename = "keys.get")]
    KeysGet {
        id: u64,
        category: String,
        ids: Vec<String>,
    },

    #[serde(rename = "keys.set")]
    KeysSet { id: u64, data: KeyMutation },

    #[serde(rename = "response")]
    Response {
        id: u64,
        ok: bool,
        #[serde(default)]
        result: Option<Value>,
        #[serde(default)]
        error: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionState;
    use serde_json::json;

    #[test]
    fn request_frame_layout() {
        let frame = OutboundFrame::Request {
            id: 3,
            call: BridgeCall::SendMessage {
                jid: "12025550123@s.whatsapp.net".to_string(),
                text: "hi".to_string(),
            },
        };
        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            json!({
                "type": "request",
                "id": 3,
                "call": {
                    "method": "sendMessage",
                    "params": { "jid": "12025550123@s.whatsapp.net", "text": "hi" }
                }
            })
        );
    }

    #[test]
    fn keys_result_omits_absent_fields() {
        let frame = OutboundFrame::KeysResult {
            id: 9,
            ok: true,
            data: None,
            error: None,
        };
        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            json!({ "type": "keys.result", "id": 9, "ok": true })
        );
    }

    #[test]
    fn inbound_frames_parse() {
        let update: InboundFrame = serde_json::from_str(
            r#"{"type":"connection.update","connection":"open","me":"12025550123:2@s.whatsapp.net"}"#,
        )
        .unwrap();
        match update {
            InboundFrame::ConnectionUpdate(u) => {
                assert_eq!(u.connection, Some(ConnectionState::Open));
                assert_eq!(u.me.as_deref(), Some("12025550123:2@s.whatsapp.net"));
            }
            other => panic!("unexpected frame: {other:?}"),
        }

        let get: InboundFrame = serde_json::from_str(
            r#"{"type":"keys.get","id":1,"category":"pre-key","ids":["1","2"]}"#,
        )
        .unwrap();
        assert_eq!(
            get,
            InboundFrame::KeysGet {
                id: 1,
                category: "pre-key".to_string(),
                ids: vec!["1".to_string(), "2".to_string()],
            }
        );

        let resp: InboundFrame =
            serde_json::from_str(r#"{"type":"response","id":4,"ok":false,"error":"not connected"}"#)
                .unwrap();
        assert_eq!(
            resp,
            InboundFrame::Response {
                id: 4,
                ok: false,
                result: None,
                error: Some("not connected".to_string()),
            }
        );
    }
}
