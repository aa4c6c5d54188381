//! Configuration pull and push.
//!
//! Two inbound paths feed the configuration record: the server pulls every
//! known option through `workspace/configuration` once the client is ready,
//! and the client pushes overrides through
//! `workspace/didChangeConfiguration`. Both paths run the same per-option
//! coercion, then report the batch to the aggregate so dependent caches can
//! react. Recording sessions never pull (the answer would not replay);
//! replayed sessions never apply.

use lsp_types::{ConfigurationItem, ConfigurationParams, DidChangeConfigurationParams};
use serde_json::Value;
use tracing::{debug, warn};
use zls_config::{Applied, ChangeReport, OPTIONS};

use crate::jsonrpc::{RequestId, ResponseError};
use crate::server::Server;

/// Tracing target for configuration traffic.
const CONFIGURATION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::configuration");

/// Correlation id of the configuration pull request.
pub const CONFIGURATION_REQUEST_ID: &str = "i_haz_configuration";

/// Issues the configuration pull, when the session allows one.
///
/// The request enumerates every known option as `zls.<name>`, in
/// declaration order; the client's answer must line up index for index.
pub(crate) fn request_configuration(server: &mut Server) {
    if !server.capabilities.supports_configuration {
        return;
    }
    if server.is_recording() || server.replay {
        debug!(
            target: CONFIGURATION_TARGET,
            "configuration pull disabled for deterministic sessions"
        );
        return;
    }

    let items = OPTIONS
        .iter()
        .map(|descriptor| ConfigurationItem {
            scope_uri: None,
            section: Some(format!("zls.{}", descriptor.name)),
        })
        .collect();
    server.outbound.request(
        RequestId::from(CONFIGURATION_REQUEST_ID),
        "workspace/configuration",
        &ConfigurationParams { items },
    );
}

/// Applies the client's answer to a configuration pull.
pub(crate) fn apply_pull_response(
    server: &mut Server,
    result: Option<Value>,
    error: Option<ResponseError>,
) {
    if let Some(error) = error {
        warn!(
            target: CONFIGURATION_TARGET,
            code = error.code,
            message = %error.message,
            "configuration pull failed"
        );
        return;
    }
    if server.replay {
        return;
    }
    let Some(Value::Array(values)) = result else {
        warn!(
            target: CONFIGURATION_TARGET,
            "configuration pull answered with a non-array result"
        );
        return;
    };
    if values.len() != OPTIONS.len() {
        warn!(
            target: CONFIGURATION_TARGET,
            expected = OPTIONS.len(),
            received = values.len(),
            "configuration pull answered with a short or long array"
        );
    }

    let mut report = ChangeReport::default();
    for (descriptor, value) in OPTIONS.iter().zip(values.iter()) {
        match server.config.apply_json(descriptor.name, value) {
            Ok(Applied::Changed) => report.changed.push(descriptor.name),
            Ok(Applied::Unchanged) => {}
            Err(reason) => report.rejected.push((descriptor.name, reason)),
        }
    }
    server.config_changed(&report);
}

/// Applies a pushed configuration change.
///
/// A null `settings` value means the client wants the server to re-pull.
pub(crate) fn handle_push(server: &mut Server, params: &DidChangeConfigurationParams) {
    if params.settings.is_null() {
        request_configuration(server);
        return;
    }
    if server.replay {
        debug!(
            target: CONFIGURATION_TARGET,
            "ignoring configuration push during replay"
        );
        return;
    }

    let overrides = params.settings.get("zls").unwrap_or(&params.settings);
    let report = server.config.apply_object(overrides);
    server.config_changed(&report);
}
