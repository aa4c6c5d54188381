//! Feature request handlers.
//!
//! Each handler resolves the addressed buffer through the store, applies
//! the configuration gates the kernel owns, and delegates the analysis to
//! the feature-provider collaborator. A request against a URI that is not
//! open answers null rather than erroring; the client may race a close
//! against an in-flight request.

use lsp_types::{
    CodeActionOrCommand, CodeActionParams, CodeActionResponse, CompletionParams,
    CompletionResponse, DocumentFormattingParams, DocumentHighlight, DocumentHighlightParams,
    DocumentSymbolParams, DocumentSymbolResponse, FoldingRange, FoldingRangeParams,
    GotoDefinitionParams, GotoDefinitionResponse, Hover, HoverParams, InlayHint, InlayHintParams,
    Location, ReferenceParams, RenameParams, SelectionRange, SelectionRangeParams,
    SemanticTokensParams, SemanticTokensRangeParams, SemanticTokensRangeResult,
    SemanticTokensResult, SignatureHelp, SignatureHelpParams, TextEdit, WorkspaceEdit,
};
use zls_config::SemanticTokensMode;

use crate::error::HandlerError;
use crate::server::Server;

pub(crate) fn hover(
    server: &mut Server,
    params: HoverParams,
) -> Result<Option<Hover>, HandlerError> {
    let uri = &params.text_document_position_params.text_document.uri;
    let Some(document) = server.collaborators.store.get(uri) else {
        return Ok(None);
    };
    Ok(server.collaborators.feature_provider.hover(document, &params))
}

pub(crate) fn completion(
    server: &mut Server,
    params: CompletionParams,
) -> Result<Option<CompletionResponse>, HandlerError> {
    let uri = &params.text_document_position.text_document.uri;
    let Some(document) = server.collaborators.store.get(uri) else {
        return Ok(None);
    };
    Ok(server
        .collaborators
        .feature_provider
        .completion(document, &params))
}

pub(crate) fn signature_help(
    server: &mut Server,
    params: SignatureHelpParams,
) -> Result<Option<SignatureHelp>, HandlerError> {
    let uri = &params.text_document_position_params.text_document.uri;
    let Some(document) = server.collaborators.store.get(uri) else {
        return Ok(None);
    };
    Ok(server
        .collaborators
        .feature_provider
        .signature_help(document, &params))
}

pub(crate) fn goto_definition(
    server: &mut Server,
    params: GotoDefinitionParams,
) -> Result<Option<GotoDefinitionResponse>, HandlerError> {
    let uri = &params.text_document_position_params.text_document.uri;
    let Some(document) = server.collaborators.store.get(uri) else {
        return Ok(None);
    };
    Ok(server
        .collaborators
        .feature_provider
        .definition(document, &params))
}

pub(crate) fn goto_type_definition(
    server: &mut Server,
    params: GotoDefinitionParams,
) -> Result<Option<GotoDefinitionResponse>, HandlerError> {
    let uri = &params.text_document_position_params.text_document.uri;
    let Some(document) = server.collaborators.store.get(uri) else {
        return Ok(None);
    };
    Ok(server
        .collaborators
        .feature_provider
        .type_definition(document, &params))
}

pub(crate) fn goto_implementation(
    server: &mut Server,
    params: GotoDefinitionParams,
) -> Result<Option<GotoDefinitionResponse>, HandlerError> {
    let uri = &params.text_document_position_params.text_document.uri;
    let Some(document) = server.collaborators.store.get(uri) else {
        return Ok(None);
    };
    Ok(server
        .collaborators
        .feature_provider
        .implementation(document, &params))
}

pub(crate) fn goto_declaration(
    server: &mut Server,
    params: GotoDefinitionParams,
) -> Result<Option<GotoDefinitionResponse>, HandlerError> {
    let uri = &params.text_document_position_params.text_document.uri;
    let Some(document) = server.collaborators.store.get(uri) else {
        return Ok(None);
    };
    Ok(server
        .collaborators
        .feature_provider
        .declaration(document, &params))
}

pub(crate) fn references(
    server: &mut Server,
    params: ReferenceParams,
) -> Result<Option<Vec<Location>>, HandlerError> {
    let uri = &params.text_document_position.text_document.uri;
    let Some(document) = server.collaborators.store.get(uri) else {
        return Ok(None);
    };
    Ok(server
        .collaborators
        .feature_provider
        .references(document, &params))
}

pub(crate) fn document_symbol(
    server: &mut Server,
    params: DocumentSymbolParams,
) -> Result<Option<DocumentSymbolResponse>, HandlerError> {
    let Some(document) = server.collaborators.store.get(&params.text_document.uri) else {
        return Ok(None);
    };
    Ok(server
        .collaborators
        .feature_provider
        .document_symbols(document, &params))
}

pub(crate) fn formatting(
    server: &mut Server,
    params: DocumentFormattingParams,
) -> Result<Option<Vec<TextEdit>>, HandlerError> {
    let Some(document) = server.collaborators.store.get(&params.text_document.uri) else {
        return Ok(None);
    };
    Ok(server
        .collaborators
        .feature_provider
        .formatting(document, &params))
}

pub(crate) fn rename(
    server: &mut Server,
    params: RenameParams,
) -> Result<Option<WorkspaceEdit>, HandlerError> {
    let uri = &params.text_document_position.text_document.uri;
    let Some(document) = server.collaborators.store.get(uri) else {
        return Ok(None);
    };
    Ok(server
        .collaborators
        .feature_provider
        .rename(document, &params))
}

pub(crate) fn document_highlight(
    server: &mut Server,
    params: DocumentHighlightParams,
) -> Result<Option<Vec<DocumentHighlight>>, HandlerError> {
    let uri = &params.text_document_position_params.text_document.uri;
    let Some(document) = server.collaborators.store.get(uri) else {
        return Ok(None);
    };
    Ok(server
        .collaborators
        .feature_provider
        .document_highlights(document, &params))
}

/// Builds actions from the diagnostics the client attached to the request.
pub(crate) fn code_action(
    server: &mut Server,
    params: CodeActionParams,
) -> Result<Option<CodeActionResponse>, HandlerError> {
    let uri = params.text_document.uri;
    if server.collaborators.store.get(&uri).is_none() {
        return Ok(None);
    }
    let actions = server
        .collaborators
        .action_builder
        .actions_for(&uri, &params.context.diagnostics);
    Ok(Some(
        actions
            .into_iter()
            .map(CodeActionOrCommand::CodeAction)
            .collect(),
    ))
}

pub(crate) fn folding_range(
    server: &mut Server,
    params: FoldingRangeParams,
) -> Result<Option<Vec<FoldingRange>>, HandlerError> {
    let Some(document) = server.collaborators.store.get(&params.text_document.uri) else {
        return Ok(None);
    };
    Ok(server
        .collaborators
        .feature_provider
        .folding_ranges(document, &params))
}

pub(crate) fn selection_range(
    server: &mut Server,
    params: SelectionRangeParams,
) -> Result<Option<Vec<SelectionRange>>, HandlerError> {
    let Some(document) = server.collaborators.store.get(&params.text_document.uri) else {
        return Ok(None);
    };
    Ok(server
        .collaborators
        .feature_provider
        .selection_ranges(document, &params))
}

pub(crate) fn inlay_hint(
    server: &mut Server,
    params: InlayHintParams,
) -> Result<Option<Vec<InlayHint>>, HandlerError> {
    if !server.config.enable_inlay_hints {
        return Ok(None);
    }
    let Some(document) = server.collaborators.store.get(&params.text_document.uri) else {
        return Ok(None);
    };
    Ok(server
        .collaborators
        .feature_provider
        .inlay_hints(document, &params))
}

pub(crate) fn semantic_tokens_full(
    server: &mut Server,
    params: SemanticTokensParams,
) -> Result<Option<SemanticTokensResult>, HandlerError> {
    if server.config.semantic_tokens == SemanticTokensMode::None {
        return Ok(None);
    }
    let Some(document) = server.collaborators.store.get(&params.text_document.uri) else {
        return Ok(None);
    };
    Ok(server
        .collaborators
        .feature_provider
        .semantic_tokens_full(document, &params))
}

pub(crate) fn semantic_tokens_range(
    server: &mut Server,
    params: SemanticTokensRangeParams,
) -> Result<Option<SemanticTokensRangeResult>, HandlerError> {
    if server.config.semantic_tokens == SemanticTokensMode::None {
        return Ok(None);
    }
    let Some(document) = server.collaborators.store.get(&params.text_document.uri) else {
        return Ok(None);
    };
    Ok(server
        .collaborators
        .feature_provider
        .semantic_tokens_range(document, &params))
}
