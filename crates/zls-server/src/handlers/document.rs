//! Document lifecycle handlers and the autofix pipeline.

use std::collections::HashMap;

use lsp_types::{
    ApplyWorkspaceEditParams, CodeActionKind, DidChangeTextDocumentParams,
    DidCloseTextDocumentParams, DidOpenTextDocumentParams, DidSaveTextDocumentParams,
    PublishDiagnosticsParams, TextEdit, Uri, WillSaveTextDocumentParams, WorkspaceEdit,
};
use tracing::{debug, warn};

use crate::error::HandlerError;
use crate::jsonrpc::RequestId;
use crate::server::{AutofixMode, Server};

/// Tracing target for document handling.
const DOCUMENT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::document");

/// Correlation id of autofix `workspace/applyEdit` requests.
pub(crate) const APPLY_EDIT_REQUEST_ID: &str = "apply_edit";

pub(crate) fn did_open(
    server: &mut Server,
    params: DidOpenTextDocumentParams,
) -> Result<(), HandlerError> {
    debug!(
        target: DOCUMENT_TARGET,
        uri = params.text_document.uri.as_str(),
        "opened"
    );
    let uri = params.text_document.uri.clone();
    server.collaborators.store.open(params.text_document);
    publish_diagnostics(server, &uri);
    Ok(())
}

pub(crate) fn did_change(
    server: &mut Server,
    params: DidChangeTextDocumentParams,
) -> Result<(), HandlerError> {
    let encoding = server.offset_encoding;
    let applied = server.collaborators.store.change(
        &params.text_document.uri,
        &params.content_changes,
        params.text_document.version,
        encoding,
    );
    if !applied {
        warn!(
            target: DOCUMENT_TARGET,
            uri = params.text_document.uri.as_str(),
            "change for a document that is not open"
        );
    }
    Ok(())
}

/// `textDocument/didSave`: refreshes diagnostics, then runs the post-save
/// autofix when that mode is on.
pub(crate) fn did_save(
    server: &mut Server,
    params: DidSaveTextDocumentParams,
) -> Result<(), HandlerError> {
    let uri = params.text_document.uri;
    publish_diagnostics(server, &uri);
    if server.autofix_mode() != AutofixMode::OnSave {
        return Ok(());
    }
    let edits = autofix_edits(server, &uri);
    if edits.is_empty() {
        return Ok(());
    }

    let mut changes = HashMap::new();
    changes.insert(uri, edits);
    server.outbound.request(
        RequestId::from(APPLY_EDIT_REQUEST_ID),
        "workspace/applyEdit",
        &ApplyWorkspaceEditParams {
            label: Some("autofix".to_string()),
            edit: WorkspaceEdit {
                changes: Some(changes),
                ..WorkspaceEdit::default()
            },
        },
    );
    Ok(())
}

pub(crate) fn did_close(
    server: &mut Server,
    params: DidCloseTextDocumentParams,
) -> Result<(), HandlerError> {
    if server.collaborators.store.close(&params.text_document.uri).is_none() {
        warn!(
            target: DOCUMENT_TARGET,
            uri = params.text_document.uri.as_str(),
            "close for a document that is not open"
        );
    }
    Ok(())
}

pub(crate) fn will_save(
    _server: &mut Server,
    _params: WillSaveTextDocumentParams,
) -> Result<(), HandlerError> {
    Ok(())
}

/// `textDocument/willSaveWaitUntil`: the synchronous autofix path.
pub(crate) fn will_save_wait_until(
    server: &mut Server,
    params: WillSaveTextDocumentParams,
) -> Result<Option<Vec<TextEdit>>, HandlerError> {
    if server.autofix_mode() != AutofixMode::WillSaveWaitUntil {
        return Ok(None);
    }
    let edits = autofix_edits(server, &params.text_document.uri);
    if edits.is_empty() {
        return Ok(None);
    }
    Ok(Some(edits))
}

/// Runs the syntax checker and pushes the findings to the client.
fn publish_diagnostics(server: &mut Server, uri: &Uri) {
    if !server.capabilities.supports_publish_diagnostics {
        return;
    }
    let Some(document) = server.collaborators.store.get(uri) else {
        return;
    };
    let text = document.text.clone();
    let version = document.version;
    let diagnostics = server.collaborators.syntax_checker.check(uri, &text);
    server.outbound.notify(
        "textDocument/publishDiagnostics",
        &PublishDiagnosticsParams {
            uri: uri.clone(),
            diagnostics,
            version: Some(version),
        },
    );
}

/// Computes the autofix edits for one buffer.
///
/// Checker diagnostics feed the action builder; only actions of kind
/// `source.fixAll` whose edit touches exactly the saved buffer survive.
fn autofix_edits(server: &mut Server, uri: &Uri) -> Vec<TextEdit> {
    let Some(document) = server.collaborators.store.get(uri) else {
        return Vec::new();
    };
    let text = document.text.clone();
    let diagnostics = server.collaborators.syntax_checker.check(uri, &text);
    if diagnostics.is_empty() {
        return Vec::new();
    }
    let actions = server
        .collaborators
        .action_builder
        .actions_for(uri, &diagnostics);

    actions
        .into_iter()
        .filter(|action| action.kind.as_ref() == Some(&CodeActionKind::SOURCE_FIX_ALL))
        .filter_map(|action| action.edit)
        .filter_map(|edit| edit.changes)
        .filter(|changes| changes.len() == 1 && changes.contains_key(uri))
        .flat_map(|mut changes| changes.remove(uri).unwrap_or_default())
        .collect()
}
