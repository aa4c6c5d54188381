//! Wire writer and the outbound frame queue.
//!
//! Every outbound message becomes one serialized JSON frame appended to the
//! queue as an owned buffer; the transport drains the queue outside the
//! core. Frames always open with the `"jsonrpc":"2.0"` tag, then the id,
//! then an optional method, then exactly one payload key, then an optional
//! error object. Serialization failures are logged and the frame dropped;
//! the core never blocks a handler on the transport.

use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use crate::jsonrpc::{RequestId, ResponseError};

/// Tracing target for wire-writer failures.
const OUTBOUND_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::outbound");

/// One serialized frame awaiting the transport.
pub type Frame = Vec<u8>;

#[derive(Serialize)]
struct OutgoingFrame<'a> {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a RequestId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a ResponseError>,
}

/// Ordered queue of serialized frames awaiting the transport.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    frames: Vec<Frame>,
}

impl OutboundQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a response frame carrying `result`.
    ///
    /// A `Value::Null` result is written as an explicit `"result":null`.
    pub fn respond(&mut self, id: &RequestId, result: Value) {
        self.push(&OutgoingFrame {
            jsonrpc: "2.0",
            id: Some(id),
            method: None,
            result: Some(&result),
            params: None,
            error: None,
        });
    }

    /// Appends a response frame carrying `error`.
    pub fn respond_error(&mut self, id: &RequestId, error: ResponseError) {
        self.push(&OutgoingFrame {
            jsonrpc: "2.0",
            id: Some(id),
            method: None,
            result: None,
            params: None,
            error: Some(&error),
        });
    }

    /// Appends a server-originated request frame.
    pub fn request<P: Serialize>(&mut self, id: RequestId, method: &str, params: &P) {
        let Some(params) = to_payload(method, params) else {
            return;
        };
        self.push(&OutgoingFrame {
            jsonrpc: "2.0",
            id: Some(&id),
            method: Some(method),
            result: None,
            params: Some(&params),
            error: None,
        });
    }

    /// Appends a notification frame.
    pub fn notify<P: Serialize>(&mut self, method: &str, params: &P) {
        let Some(params) = to_payload(method, params) else {
            return;
        };
        self.push(&OutgoingFrame {
            jsonrpc: "2.0",
            id: None,
            method: Some(method),
            result: None,
            params: Some(&params),
            error: None,
        });
    }

    /// Hands every queued frame to the caller, emptying the queue.
    pub fn drain(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.frames)
    }

    /// Frames currently queued, oldest first.
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Number of queued frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn push(&mut self, frame: &OutgoingFrame<'_>) {
        match serde_json::to_vec(frame) {
            Ok(bytes) => self.frames.push(bytes),
            // Dropping a send is the documented failure mode; back-pressure
            // belongs to the transport, not the core.
            Err(source) => error!(target: OUTBOUND_TARGET, %source, "dropping outbound frame"),
        }
    }
}

fn to_payload<P: Serialize>(method: &str, params: &P) -> Option<Value> {
    match serde_json::to_value(params) {
        Ok(value) => Some(value),
        Err(source) => {
            warn!(target: OUTBOUND_TARGET, method, %source, "dropping unserialisable payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::error::HandlerError;
    use crate::jsonrpc::Message;

    use super::*;

    fn text(frame: &Frame) -> &str {
        std::str::from_utf8(frame).expect("frames are utf-8")
    }

    #[test]
    fn every_frame_opens_with_the_version_tag() {
        let mut queue = OutboundQueue::new();
        queue.respond(&RequestId::Integer(1), json!({"ok": true}));
        queue.respond_error(&RequestId::Integer(2), HandlerError::InvalidRequest.into());
        queue.request(RequestId::from("apply_edit"), "workspace/applyEdit", &json!({}));
        queue.notify("window/showMessage", &json!({"type": 3, "message": "hi"}));

        assert_eq!(queue.len(), 4);
        for frame in queue.frames() {
            assert!(text(frame).starts_with(r#"{"jsonrpc":"2.0""#));
        }
    }

    #[test]
    fn response_carries_result_and_no_error() {
        let mut queue = OutboundQueue::new();
        queue.respond(&RequestId::Integer(5), json!([1, 2]));

        let frame = text(&queue.frames()[0]);
        assert!(frame.contains(r#""id":5"#));
        assert!(frame.contains(r#""result":[1,2]"#));
        assert!(!frame.contains("error"));
        assert!(!frame.contains("method"));
    }

    #[test]
    fn error_response_carries_no_result() {
        let mut queue = OutboundQueue::new();
        queue.respond_error(&RequestId::Integer(6), HandlerError::MethodNotFound.into());

        let frame = text(&queue.frames()[0]);
        assert!(frame.contains(r#""error":{"code":-32601"#));
        assert!(!frame.contains("result"));
    }

    #[test]
    fn null_result_is_written_explicitly() {
        let mut queue = OutboundQueue::new();
        queue.respond(&RequestId::Integer(7), Value::Null);

        assert!(text(&queue.frames()[0]).contains(r#""result":null"#));
    }

    #[test]
    fn request_frames_carry_string_ids_verbatim() {
        let mut queue = OutboundQueue::new();
        queue.request(
            RequestId::from("i_haz_configuration"),
            "workspace/configuration",
            &json!({"items": []}),
        );

        let frame = text(&queue.frames()[0]);
        assert!(frame.contains(r#""id":"i_haz_configuration""#));
        assert!(frame.contains(r#""method":"workspace/configuration""#));
    }

    #[test]
    fn notifications_omit_the_id() {
        let mut queue = OutboundQueue::new();
        queue.notify("textDocument/publishDiagnostics", &json!({"diagnostics": []}));

        assert!(!text(&queue.frames()[0]).contains(r#""id""#));
    }

    #[test]
    fn request_frames_round_trip_through_the_decoder() {
        let original = Message::decode(json!({
            "jsonrpc": "2.0",
            "id": 41,
            "method": "textDocument/completion",
            "params": {"position": {"line": 3, "character": 9}},
        }))
        .expect("request should decode");

        let Message::Request { id, method, params } = original.clone() else {
            panic!("expected a request");
        };
        let mut queue = OutboundQueue::new();
        queue.request(id, &method, &params);

        let bytes = queue.drain().remove(0);
        let value: Value = serde_json::from_slice(&bytes).expect("frame is valid JSON");
        let round_tripped = Message::decode(value).expect("frame should re-decode");
        assert_eq!(round_tripped, original);
    }

    #[test]
    fn drain_empties_the_queue_in_order() {
        let mut queue = OutboundQueue::new();
        queue.respond(&RequestId::Integer(1), json!(1));
        queue.respond(&RequestId::Integer(2), json!(2));

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert!(text(&drained[0]).contains(r#""id":1"#));
        assert!(text(&drained[1]).contains(r#""id":2"#));
        assert!(queue.is_empty());
    }
}
