//! JSON-RPC 2.0 message model.
//!
//! A decoded [`Message`] classifies one inbound JSON value as a request,
//! notification, or response. The raw `params` / `result` sub-values stay
//! unparsed at this stage; typed decoding waits until the handler is known.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Correlator for a request/response pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric id.
    Integer(i64),
    /// String id.
    String(String),
}

impl RequestId {
    /// The string form, when the id is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Integer(_) => None,
            Self::String(text) => Some(text.as_str()),
        }
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(number) => write!(formatter, "{number}"),
            Self::String(text) => formatter.write_str(text),
        }
    }
}

impl From<i64> for RequestId {
    fn from(number: i64) -> Self {
        Self::Integer(number)
    }
}

impl From<&str> for RequestId {
    fn from(text: &str) -> Self {
        Self::String(text.to_string())
    }
}

/// Error body of a response frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    /// JSON-RPC error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Optional structured payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// One decoded JSON-RPC envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Client-to-server call expecting a correlated response.
    Request {
        /// Correlator the response must echo.
        id: RequestId,
        /// Method name.
        method: String,
        /// Raw parameters; JSON `null` when absent.
        params: Value,
    },
    /// Fire-and-forget client-to-server call.
    Notification {
        /// Method name.
        method: String,
        /// Raw parameters; JSON `null` when absent.
        params: Value,
    },
    /// Reply to a server-originated request.
    Response {
        /// Correlator of the request being answered.
        id: RequestId,
        /// Raw result, when the call succeeded.
        result: Option<Value>,
        /// Error body, when the call failed.
        error: Option<ResponseError>,
    },
}

/// Failures classifying an inbound JSON value as a [`Message`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The value is not a JSON object.
    #[error("message is not a JSON object")]
    NotAnObject,
    /// The `id` field is neither an integer nor a string.
    #[error("id is neither an integer nor a string")]
    InvalidId,
    /// The `method` field is not a string.
    #[error("method is not a string")]
    InvalidMethod,
    /// The object carries neither an `id` nor a `method`.
    #[error("message has neither id nor method")]
    MissingIdAndMethod,
    /// A response carries both a non-null `result` and an `error`.
    #[error("response carries both result and error")]
    ResultAndError,
    /// The `error` field does not decode as an error object.
    #[error("error field is not a valid error object")]
    InvalidErrorObject,
}

impl Message {
    /// Classifies one JSON value per the envelope rules.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] when the value does not fit any of the
    /// three envelope shapes.
    pub fn decode(value: Value) -> Result<Self, DecodeError> {
        let Value::Object(mut fields) = value else {
            return Err(DecodeError::NotAnObject);
        };

        let id = match fields.remove("id") {
            None | Some(Value::Null) => None,
            Some(Value::Number(number)) => Some(RequestId::Integer(
                number.as_i64().ok_or(DecodeError::InvalidId)?,
            )),
            Some(Value::String(text)) => Some(RequestId::String(text)),
            Some(_) => return Err(DecodeError::InvalidId),
        };

        let method = match fields.remove("method") {
            None => None,
            Some(Value::String(text)) => Some(text),
            Some(_) => return Err(DecodeError::InvalidMethod),
        };

        match (id, method) {
            (Some(id), Some(method)) => Ok(Self::Request {
                id,
                method,
                params: take_params(&mut fields),
            }),
            (None, Some(method)) => Ok(Self::Notification {
                method,
                params: take_params(&mut fields),
            }),
            (Some(id), None) => decode_response(id, &mut fields),
            (None, None) => Err(DecodeError::MissingIdAndMethod),
        }
    }
}

fn take_params(fields: &mut Map<String, Value>) -> Value {
    fields.remove("params").unwrap_or(Value::Null)
}

fn decode_response(
    id: RequestId,
    fields: &mut Map<String, Value>,
) -> Result<Message, DecodeError> {
    let result = match fields.remove("result") {
        None | Some(Value::Null) => None,
        Some(value) => Some(value),
    };
    let error = match fields.remove("error") {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            serde_json::from_value::<ResponseError>(value)
                .map_err(|_| DecodeError::InvalidErrorObject)?,
        ),
    };
    if result.is_some() && error.is_some() {
        return Err(DecodeError::ResultAndError);
    }
    Ok(Message::Response { id, result, error })
}
