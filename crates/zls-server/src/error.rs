//! The closed error taxonomy surfaced to clients.
//!
//! Every handler failure maps to one of these members. The numeric codes are
//! the JSON-RPC values the protocol reserves for them; the wire message is
//! the member's name. Transport-internal failures (frame serialization, I/O)
//! live outside this taxonomy and are logged without ever reaching a client.

use thiserror::Error;

use crate::jsonrpc::ResponseError;

/// Protocol error returned by a handler or by dispatch itself.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum HandlerError {
    /// The payload could not be decoded.
    #[error("ParseError")]
    ParseError,
    /// The message is not valid in the current lifecycle state.
    #[error("InvalidRequest")]
    InvalidRequest,
    /// The method is not registered.
    #[error("MethodNotFound")]
    MethodNotFound,
    /// The parameters decoded but are semantically unusable.
    #[error("InvalidParams")]
    InvalidParams,
    /// The handler failed for a reason of its own.
    #[error("InternalError")]
    InternalError,
    /// A request arrived before `initialize` completed.
    #[error("ServerNotInitialized")]
    ServerNotInitialized,
    /// The request ran and failed; retrying will not help.
    #[error("RequestFailed")]
    RequestFailed,
    /// The server cancelled the request.
    #[error("ServerCancelled")]
    ServerCancelled,
    /// The document changed under the request.
    #[error("ContentModified")]
    ContentModified,
    /// The client cancelled the request.
    #[error("RequestCancelled")]
    RequestCancelled,
}

impl HandlerError {
    /// JSON-RPC error code reserved for this member.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::ServerNotInitialized => -32002,
            Self::RequestFailed => -32803,
            Self::ServerCancelled => -32802,
            Self::ContentModified => -32801,
            Self::RequestCancelled => -32800,
        }
    }

    /// Member name as surfaced in the error message.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ParseError => "ParseError",
            Self::InvalidRequest => "InvalidRequest",
            Self::MethodNotFound => "MethodNotFound",
            Self::InvalidParams => "InvalidParams",
            Self::InternalError => "InternalError",
            Self::ServerNotInitialized => "ServerNotInitialized",
            Self::RequestFailed => "RequestFailed",
            Self::ServerCancelled => "ServerCancelled",
            Self::ContentModified => "ContentModified",
            Self::RequestCancelled => "RequestCancelled",
        }
    }
}

impl From<HandlerError> for ResponseError {
    fn from(error: HandlerError) -> Self {
        Self {
            code: error.code(),
            message: error.name().to_string(),
            data: None,
        }
    }
}
