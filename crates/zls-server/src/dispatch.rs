//! Message dispatch.
//!
//! Takes one raw inbound frame through the full pipeline: JSON parse,
//! envelope classification, response correlation, lifecycle gating, typed
//! parameter decoding, handler invocation, and reply routing. The two
//! static tables below are the single source of truth for which methods
//! exist; a lookup miss is what "unknown method" means.

use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::configuration;
use crate::error::HandlerError;
use crate::handlers::{self, document, features};
use crate::jsonrpc::{Message, RequestId, ResponseError};
use crate::lifecycle;
use crate::server::Server;

/// Tracing target for dispatch operations.
const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

type RequestRun = fn(&mut Server, Value) -> Result<Value, HandlerError>;
type NotificationRun = fn(&mut Server, Value) -> Result<(), HandlerError>;

/// One registered request method.
struct RequestEntry {
    method: &'static str,
    run: RequestRun,
}

/// One registered notification method.
struct NotificationEntry {
    method: &'static str,
    run: NotificationRun,
}

/// Decodes the raw params and serialises the typed result back to JSON.
///
/// Each table entry monomorphises this adapter for its own parameter and
/// result types, so the dispatcher never sees a union of them.
fn run_request<P, R>(
    server: &mut Server,
    raw: Value,
    handler: fn(&mut Server, P) -> Result<R, HandlerError>,
) -> Result<Value, HandlerError>
where
    P: DeserializeOwned,
    R: Serialize,
{
    let params: P = serde_json::from_value(raw).map_err(|_| HandlerError::ParseError)?;
    let result = handler(server, params)?;
    serde_json::to_value(result).map_err(|_| HandlerError::InternalError)
}

fn run_notification<P>(
    server: &mut Server,
    raw: Value,
    handler: fn(&mut Server, P) -> Result<(), HandlerError>,
) -> Result<(), HandlerError>
where
    P: DeserializeOwned,
{
    let params: P = serde_json::from_value(raw).map_err(|_| HandlerError::ParseError)?;
    handler(server, params)
}

static REQUESTS: &[RequestEntry] = &[
    RequestEntry {
        method: "initialize",
        run: |server, raw| run_request(server, raw, handlers::initialize),
    },
    RequestEntry {
        method: "shutdown",
        run: |server, raw| run_request(server, raw, handlers::shutdown),
    },
    RequestEntry {
        method: "textDocument/willSaveWaitUntil",
        run: |server, raw| run_request(server, raw, document::will_save_wait_until),
    },
    RequestEntry {
        method: "textDocument/semanticTokens/full",
        run: |server, raw| run_request(server, raw, features::semantic_tokens_full),
    },
    RequestEntry {
        method: "textDocument/semanticTokens/range",
        run: |server, raw| run_request(server, raw, features::semantic_tokens_range),
    },
    RequestEntry {
        method: "textDocument/inlayHint",
        run: |server, raw| run_request(server, raw, features::inlay_hint),
    },
    RequestEntry {
        method: "textDocument/completion",
        run: |server, raw| run_request(server, raw, features::completion),
    },
    RequestEntry {
        method: "textDocument/signatureHelp",
        run: |server, raw| run_request(server, raw, features::signature_help),
    },
    RequestEntry {
        method: "textDocument/definition",
        run: |server, raw| run_request(server, raw, features::goto_definition),
    },
    RequestEntry {
        method: "textDocument/typeDefinition",
        run: |server, raw| run_request(server, raw, features::goto_type_definition),
    },
    RequestEntry {
        method: "textDocument/implementation",
        run: |server, raw| run_request(server, raw, features::goto_implementation),
    },
    RequestEntry {
        method: "textDocument/declaration",
        run: |server, raw| run_request(server, raw, features::goto_declaration),
    },
    RequestEntry {
        method: "textDocument/hover",
        run: |server, raw| run_request(server, raw, features::hover),
    },
    RequestEntry {
        method: "textDocument/documentSymbol",
        run: |server, raw| run_request(server, raw, features::document_symbol),
    },
    RequestEntry {
        method: "textDocument/formatting",
        run: |server, raw| run_request(server, raw, features::formatting),
    },
    RequestEntry {
        method: "textDocument/rename",
        run: |server, raw| run_request(server, raw, features::rename),
    },
    RequestEntry {
        method: "textDocument/references",
        run: |server, raw| run_request(server, raw, features::references),
    },
    RequestEntry {
        method: "textDocument/documentHighlight",
        run: |server, raw| run_request(server, raw, features::document_highlight),
    },
    RequestEntry {
        method: "textDocument/codeAction",
        run: |server, raw| run_request(server, raw, features::code_action),
    },
    RequestEntry {
        method: "textDocument/foldingRange",
        run: |server, raw| run_request(server, raw, features::folding_range),
    },
    RequestEntry {
        method: "textDocument/selectionRange",
        run: |server, raw| run_request(server, raw, features::selection_range),
    },
];

static NOTIFICATIONS: &[NotificationEntry] = &[
    NotificationEntry {
        method: "initialized",
        run: |server, raw| run_notification(server, raw, handlers::initialized),
    },
    NotificationEntry {
        method: "exit",
        run: |server, raw| run_notification(server, raw, handlers::exit),
    },
    NotificationEntry {
        method: "$/cancelRequest",
        run: |server, raw| run_notification(server, raw, handlers::cancel_request),
    },
    NotificationEntry {
        method: "$/setTrace",
        run: |server, raw| run_notification(server, raw, handlers::set_trace),
    },
    NotificationEntry {
        method: "$/progress",
        run: |server, raw| run_notification(server, raw, handlers::progress),
    },
    NotificationEntry {
        method: "textDocument/didOpen",
        run: |server, raw| run_notification(server, raw, document::did_open),
    },
    NotificationEntry {
        method: "textDocument/didChange",
        run: |server, raw| run_notification(server, raw, document::did_change),
    },
    NotificationEntry {
        method: "textDocument/didSave",
        run: |server, raw| run_notification(server, raw, document::did_save),
    },
    NotificationEntry {
        method: "textDocument/didClose",
        run: |server, raw| run_notification(server, raw, document::did_close),
    },
    NotificationEntry {
        method: "textDocument/willSave",
        run: |server, raw| run_notification(server, raw, document::will_save),
    },
    NotificationEntry {
        method: "workspace/didChangeConfiguration",
        run: |server, raw| run_notification(server, raw, handlers::did_change_configuration),
    },
];

/// Runs the pipeline for one raw frame.
///
/// Envelope failures are local: logged, dropped, never answered.
pub(crate) fn handle_message(server: &mut Server, raw: &[u8]) {
    let value: Value = match serde_json::from_slice(raw) {
        Ok(value) => value,
        Err(source) => {
            warn!(target: DISPATCH_TARGET, %source, "dropping unparsable frame");
            return;
        }
    };
    let message = match Message::decode(value) {
        Ok(message) => message,
        Err(source) => {
            warn!(target: DISPATCH_TARGET, %source, "dropping malformed envelope");
            return;
        }
    };

    match message {
        Message::Request { id, method, params } => handle_request(server, id, &method, params),
        Message::Notification { method, params } => handle_notification(server, &method, params),
        Message::Response { id, result, error } => handle_response(server, &id, result, error),
    }
}

fn handle_request(server: &mut Server, id: RequestId, method: &str, params: Value) {
    let Some(entry) = REQUESTS.iter().find(|entry| entry.method == method) else {
        server
            .outbound
            .respond_error(&id, HandlerError::MethodNotFound.into());
        return;
    };
    if let Err(refused) = lifecycle::check_request(server.status, method) {
        server.outbound.respond_error(&id, refused.into());
        return;
    }

    let started = Instant::now();
    match (entry.run)(server, params) {
        Ok(result) => server.outbound.respond(&id, result),
        Err(failed) => server.outbound.respond_error(&id, failed.into()),
    }
    log_elapsed(server, method, started);
}

fn handle_notification(server: &mut Server, method: &str, params: Value) {
    let Some(entry) = NOTIFICATIONS.iter().find(|entry| entry.method == method) else {
        warn!(
            target: DISPATCH_TARGET,
            method,
            error = %HandlerError::MethodNotFound,
            "dropping unknown notification"
        );
        return;
    };
    if let Err(refused) = lifecycle::check_notification(server.status, method) {
        warn!(
            target: DISPATCH_TARGET,
            method,
            status = server.status.as_str(),
            error = %refused,
            "dropping notification"
        );
        return;
    }

    let started = Instant::now();
    if let Err(failed) = (entry.run)(server, params) {
        // Notifications have no reply channel; the taxonomy error is
        // swallowed after logging.
        warn!(target: DISPATCH_TARGET, method, error = %failed, "notification handler failed");
    }
    log_elapsed(server, method, started);
}

fn handle_response(
    server: &mut Server,
    id: &RequestId,
    result: Option<Value>,
    error: Option<ResponseError>,
) {
    match id.as_str() {
        Some(configuration::CONFIGURATION_REQUEST_ID) => {
            configuration::apply_pull_response(server, result, error);
        }
        Some(handlers::document::APPLY_EDIT_REQUEST_ID) => {}
        Some(name) if name.starts_with("register-") => {
            if let Some(error) = error {
                warn!(
                    target: DISPATCH_TARGET,
                    id = name,
                    code = error.code,
                    message = %error.message,
                    "capability registration failed"
                );
            }
        }
        _ => {
            warn!(target: DISPATCH_TARGET, id = %id, "dropping unmatched response");
        }
    }
}

fn log_elapsed(server: &Server, method: &str, started: Instant) {
    if !server.log_timings {
        return;
    }
    debug!(
        target: DISPATCH_TARGET,
        method,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "handled"
    );
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn request_table_is_duplicate_free() {
        let mut seen = HashSet::new();
        for entry in REQUESTS {
            assert!(seen.insert(entry.method), "duplicate entry {}", entry.method);
        }
    }

    #[test]
    fn notification_table_is_duplicate_free() {
        let mut seen = HashSet::new();
        for entry in NOTIFICATIONS {
            assert!(seen.insert(entry.method), "duplicate entry {}", entry.method);
        }
    }

    #[test]
    fn tables_do_not_overlap() {
        for request in REQUESTS {
            assert!(
                !NOTIFICATIONS
                    .iter()
                    .any(|notification| notification.method == request.method),
                "{} registered as both kinds",
                request.method
            );
        }
    }

    #[test]
    fn lifecycle_methods_are_registered_with_the_right_kind() {
        let requests: Vec<&str> = REQUESTS.iter().map(|entry| entry.method).collect();
        let notifications: Vec<&str> = NOTIFICATIONS.iter().map(|entry| entry.method).collect();

        assert!(requests.contains(&"initialize"));
        assert!(requests.contains(&"shutdown"));
        assert!(notifications.contains(&"initialized"));
        assert!(notifications.contains(&"exit"));
        assert!(notifications.contains(&"$/cancelRequest"));
    }
}
