//! Typed handlers for the lifecycle methods.
//!
//! Document lifecycle lives in [`document`]; feature requests live in
//! [`features`]. Every handler has the uniform shape
//! `(server, params) -> Result<result, HandlerError>`; the dispatcher owns
//! decoding and reply routing.

pub(crate) mod document;
pub(crate) mod features;

use lsp_types::{
    CancelParams, InitializeParams, InitializeResult, InitializedParams, ProgressParams,
    Registration, RegistrationParams, SetTraceParams, TraceValue,
};
use tracing::{debug, info};

use crate::capabilities;
use crate::configuration;
use crate::error::HandlerError;
use crate::jsonrpc::RequestId;
use crate::lifecycle::{self, Status};
use crate::server::Server;

/// Tracing target for lifecycle handling.
const LIFECYCLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::lifecycle");

/// Correlation id of the configuration-push registration request.
pub(crate) const REGISTER_CONFIGURATION_ID: &str = "register-workspace/didChangeConfiguration";

/// `initialize`: negotiates the session and freezes the results.
pub(crate) fn initialize(
    server: &mut Server,
    params: InitializeParams,
) -> Result<InitializeResult, HandlerError> {
    if let Some(client) = &params.client_info {
        info!(
            target: LIFECYCLE_TARGET,
            name = %client.name,
            version = client.version.as_deref().unwrap_or("unknown"),
            "client connected"
        );
    }

    let negotiation = capabilities::negotiate(&params, &mut server.config);
    server.capabilities = negotiation.capabilities;
    server.offset_encoding = negotiation.offset_encoding;
    if negotiation.trace_messages {
        server.trace_messages = true;
    }
    server.status = Status::Initializing;
    server.post_session_notices();

    Ok(capabilities::initialize_result(
        &server.config,
        &server.capabilities,
        server.offset_encoding,
    ))
}

/// `initialized`: the handshake is complete; start post-initialize work.
pub(crate) fn initialized(
    server: &mut Server,
    _params: InitializedParams,
) -> Result<(), HandlerError> {
    server.status = Status::Initialized;

    if server.capabilities.dynamic_configuration_registration {
        server.outbound.request(
            RequestId::from(REGISTER_CONFIGURATION_ID),
            "client/registerCapability",
            &RegistrationParams {
                registrations: vec![Registration {
                    id: "workspace/didChangeConfiguration".to_string(),
                    method: "workspace/didChangeConfiguration".to_string(),
                    register_options: None,
                }],
            },
        );
    }
    configuration::request_configuration(server);
    Ok(())
}

/// `shutdown`: answer null and wait for `exit`.
pub(crate) fn shutdown(server: &mut Server, _params: ()) -> Result<Option<()>, HandlerError> {
    server.status = Status::Shutdown;
    Ok(None)
}

/// `exit`: terminal transition; the main loop reads the reached state.
pub(crate) fn exit(server: &mut Server, _params: ()) -> Result<(), HandlerError> {
    match lifecycle::exit_transition(server.status) {
        Some(next) => {
            debug!(target: LIFECYCLE_TARGET, status = next.as_str(), "exiting");
            server.status = next;
            Ok(())
        }
        None => Err(HandlerError::InvalidRequest),
    }
}

/// `$/cancelRequest`: accepted, deliberately inert.
///
/// Handlers run to completion; a cancellation-token map keyed by request id
/// is the shape a future implementation would take.
pub(crate) fn cancel_request(
    _server: &mut Server,
    _params: CancelParams,
) -> Result<(), HandlerError> {
    Ok(())
}

/// `$/setTrace`: toggles message tracing at runtime.
pub(crate) fn set_trace(server: &mut Server, params: SetTraceParams) -> Result<(), HandlerError> {
    server.trace_messages = !matches!(params.value, TraceValue::Off);
    Ok(())
}

/// `$/progress`: tolerated during the handshake, nothing to do.
pub(crate) fn progress(_server: &mut Server, _params: ProgressParams) -> Result<(), HandlerError> {
    Ok(())
}

/// `workspace/didChangeConfiguration`: pushed configuration override.
pub(crate) fn did_change_configuration(
    server: &mut Server,
    params: lsp_types::DidChangeConfigurationParams,
) -> Result<(), HandlerError> {
    configuration::handle_push(server, &params);
    Ok(())
}
