//! Seams for the external collaborators.
//!
//! The kernel consumes the document store, the syntax checker, the
//! code-action builder, and the feature providers only through these
//! traits, so tests and higher layers can inject lightweight
//! implementations without spawning a real toolchain or analyser.

use lsp_types::{
    CodeAction, CompletionParams, CompletionResponse, Diagnostic, DocumentFormattingParams,
    DocumentHighlight, DocumentHighlightParams, DocumentSymbolParams, DocumentSymbolResponse,
    FoldingRange, FoldingRangeParams, GotoDefinitionParams, GotoDefinitionResponse, Hover,
    HoverParams, InlayHint, InlayHintParams, Location, ReferenceParams, RenameParams,
    SelectionRange, SelectionRangeParams, SemanticTokensParams, SemanticTokensRangeParams,
    SemanticTokensRangeResult, SemanticTokensResult, SignatureHelp, SignatureHelpParams,
    TextEdit, Uri, WorkspaceEdit,
};

use crate::store::{DocumentStore, InMemoryDocumentStore, TextDocument};

/// External syntax checker consulted around save.
pub trait SyntaxChecker: Send {
    /// Produces diagnostics for the buffer's current text.
    fn check(&mut self, uri: &Uri, text: &str) -> Vec<Diagnostic>;
}

/// Builds code actions out of checker diagnostics.
pub trait ActionBuilder: Send {
    /// Produces the actions the given diagnostics suggest.
    fn actions_for(&mut self, uri: &Uri, diagnostics: &[Diagnostic]) -> Vec<CodeAction>;
}

/// Analysis behind the feature requests.
///
/// One method per request the dispatch core routes; every method receives
/// the already-resolved buffer, since the core answers null for unknown
/// URIs before the provider is consulted. The default bodies have nothing
/// to say, so implementations override only the features they analyse.
pub trait FeatureProvider: Send {
    /// `textDocument/hover`.
    fn hover(&mut self, _document: &TextDocument, _params: &HoverParams) -> Option<Hover> {
        None
    }

    /// `textDocument/completion`.
    fn completion(
        &mut self,
        _document: &TextDocument,
        _params: &CompletionParams,
    ) -> Option<CompletionResponse> {
        None
    }

    /// `textDocument/signatureHelp`.
    fn signature_help(
        &mut self,
        _document: &TextDocument,
        _params: &SignatureHelpParams,
    ) -> Option<SignatureHelp> {
        None
    }

    /// `textDocument/definition`.
    fn definition(
        &mut self,
        _document: &TextDocument,
        _params: &GotoDefinitionParams,
    ) -> Option<GotoDefinitionResponse> {
        None
    }

    /// `textDocument/typeDefinition`.
    fn type_definition(
        &mut self,
        _document: &TextDocument,
        _params: &GotoDefinitionParams,
    ) -> Option<GotoDefinitionResponse> {
        None
    }

    /// `textDocument/implementation`.
    fn implementation(
        &mut self,
        _document: &TextDocument,
        _params: &GotoDefinitionParams,
    ) -> Option<GotoDefinitionResponse> {
        None
    }

    /// `textDocument/declaration`.
    fn declaration(
        &mut self,
        _document: &TextDocument,
        _params: &GotoDefinitionParams,
    ) -> Option<GotoDefinitionResponse> {
        None
    }

    /// `textDocument/references`.
    fn references(
        &mut self,
        _document: &TextDocument,
        _params: &ReferenceParams,
    ) -> Option<Vec<Location>> {
        None
    }

    /// `textDocument/documentSymbol`.
    fn document_symbols(
        &mut self,
        _document: &TextDocument,
        _params: &DocumentSymbolParams,
    ) -> Option<DocumentSymbolResponse> {
        None
    }

    /// `textDocument/formatting`.
    fn formatting(
        &mut self,
        _document: &TextDocument,
        _params: &DocumentFormattingParams,
    ) -> Option<Vec<TextEdit>> {
        None
    }

    /// `textDocument/rename`.
    fn rename(
        &mut self,
        _document: &TextDocument,
        _params: &RenameParams,
    ) -> Option<WorkspaceEdit> {
        None
    }

    /// `textDocument/documentHighlight`.
    fn document_highlights(
        &mut self,
        _document: &TextDocument,
        _params: &DocumentHighlightParams,
    ) -> Option<Vec<DocumentHighlight>> {
        None
    }

    /// `textDocument/foldingRange`.
    fn folding_ranges(
        &mut self,
        _document: &TextDocument,
        _params: &FoldingRangeParams,
    ) -> Option<Vec<FoldingRange>> {
        None
    }

    /// `textDocument/selectionRange`.
    fn selection_ranges(
        &mut self,
        _document: &TextDocument,
        _params: &SelectionRangeParams,
    ) -> Option<Vec<SelectionRange>> {
        None
    }

    /// `textDocument/inlayHint`.
    fn inlay_hints(
        &mut self,
        _document: &TextDocument,
        _params: &InlayHintParams,
    ) -> Option<Vec<InlayHint>> {
        None
    }

    /// `textDocument/semanticTokens/full`.
    fn semantic_tokens_full(
        &mut self,
        _document: &TextDocument,
        _params: &SemanticTokensParams,
    ) -> Option<SemanticTokensResult> {
        None
    }

    /// `textDocument/semanticTokens/range`.
    fn semantic_tokens_range(
        &mut self,
        _document: &TextDocument,
        _params: &SemanticTokensRangeParams,
    ) -> Option<SemanticTokensRangeResult> {
        None
    }
}

/// Checker used until a real toolchain binding is wired in.
#[derive(Debug, Default)]
pub struct PlaceholderSyntaxChecker;

impl SyntaxChecker for PlaceholderSyntaxChecker {
    fn check(&mut self, _uri: &Uri, _text: &str) -> Vec<Diagnostic> {
        Vec::new()
    }
}

/// Builder used until a real code-action provider is wired in.
#[derive(Debug, Default)]
pub struct PlaceholderActionBuilder;

impl ActionBuilder for PlaceholderActionBuilder {
    fn actions_for(&mut self, _uri: &Uri, _diagnostics: &[Diagnostic]) -> Vec<CodeAction> {
        Vec::new()
    }
}

/// Provider with nothing to say, used until an analyser is wired in.
#[derive(Debug, Default)]
pub struct PlaceholderFeatureProvider;

impl FeatureProvider for PlaceholderFeatureProvider {}

/// The collaborator set the server aggregate owns.
pub struct Collaborators {
    /// Open-buffer store, diff arithmetic included.
    pub store: Box<dyn DocumentStore>,
    /// External syntax checker.
    pub syntax_checker: Box<dyn SyntaxChecker>,
    /// Code-action builder fed by checker diagnostics.
    pub action_builder: Box<dyn ActionBuilder>,
    /// Analysis behind the feature requests.
    pub feature_provider: Box<dyn FeatureProvider>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            store: Box::new(InMemoryDocumentStore::new()),
            syntax_checker: Box::new(PlaceholderSyntaxChecker),
            action_builder: Box::new(PlaceholderActionBuilder),
            feature_provider: Box::new(PlaceholderFeatureProvider),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("Collaborators")
    }
}
