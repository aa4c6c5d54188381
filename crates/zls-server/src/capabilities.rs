//! Capability negotiation.
//!
//! Runs exactly once, during `initialize`. The client's advertised
//! capability tree is read defensively (every nested group is optional) and
//! collapsed into a flat snapshot that is frozen for the rest of the
//! session. A small quirk registry patches the snapshot for clients whose
//! advertisement is known to be wrong, optionally keyed by semantic
//! version.

use lsp_types::{
    ClientCapabilities, ClientInfo, CompletionOptions, CompletionOptionsCompletionItem,
    DeclarationCapability, FoldingRangeProviderCapability, HoverProviderCapability,
    ImplementationProviderCapability, InitializeParams, InitializeResult, MarkupKind, OneOf,
    PositionEncodingKind, SaveOptions, SelectionRangeProviderCapability, SemanticTokenModifier,
    SemanticTokenType, SemanticTokensFullOptions, SemanticTokensLegend, SemanticTokensOptions,
    SemanticTokensServerCapabilities, ServerCapabilities, ServerInfo, SignatureHelpOptions,
    TextDocumentSyncCapability, TextDocumentSyncKind, TextDocumentSyncOptions,
    TextDocumentSyncSaveOptions, TraceValue, TypeDefinitionProviderCapability,
};
use tracing::debug;
use zls_config::Config;

/// Tracing target for negotiation decisions.
const CAPABILITIES_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::capabilities");

/// Name advertised back to the client in `serverInfo`.
pub const SERVER_NAME: &str = "zls";

/// Units in which character positions are measured over document text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OffsetEncoding {
    /// Bytes.
    Utf8,
    /// UTF-16 code units (the protocol default).
    #[default]
    Utf16,
    /// Unicode scalar values.
    Utf32,
}

impl OffsetEncoding {
    /// Canonical protocol tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf16 => "utf-16",
            Self::Utf32 => "utf-32",
        }
    }

    /// Picks the encoding from the client's ordered offer.
    ///
    /// Prefers utf-8, then utf-32, falling back to the mandatory utf-16.
    #[must_use]
    pub fn negotiate(offered: &[PositionEncodingKind]) -> Self {
        if offered.iter().any(|kind| kind.as_str() == "utf-8") {
            Self::Utf8
        } else if offered.iter().any(|kind| kind.as_str() == "utf-32") {
            Self::Utf32
        } else {
            Self::Utf16
        }
    }

    fn to_position_encoding(self) -> PositionEncodingKind {
        match self {
            Self::Utf8 => PositionEncodingKind::UTF8,
            Self::Utf16 => PositionEncodingKind::UTF16,
            Self::Utf32 => PositionEncodingKind::UTF32,
        }
    }
}

/// Flat snapshot of the client capabilities the server consults.
///
/// Set during `initialize`; read-only thereafter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientCapabilitySet {
    /// Completion items may contain snippet placeholders.
    pub supports_snippets: bool,
    /// The client honours `workspace/applyEdit`.
    pub supports_apply_edit: bool,
    /// The client sends `textDocument/willSave`.
    pub supports_will_save: bool,
    /// The client sends `textDocument/willSaveWaitUntil`.
    pub supports_will_save_wait_until: bool,
    /// The client renders published diagnostics.
    pub supports_publish_diagnostics: bool,
    /// The client understands the `source.fixAll` code-action kind.
    pub supports_code_action_fixall: bool,
    /// Hover content may be markdown.
    pub hover_markdown: bool,
    /// Completion documentation may be markdown.
    pub completion_doc_markdown: bool,
    /// Completion items may carry label details.
    pub label_details: bool,
    /// The client answers `workspace/configuration` pulls.
    pub supports_configuration: bool,
    /// The client accepts dynamic registration for configuration pushes.
    pub dynamic_configuration_registration: bool,
}

/// Everything `initialize` fixes for the rest of the session.
#[derive(Debug, Clone, Copy)]
pub struct Negotiation {
    /// Flat client capability snapshot.
    pub capabilities: ClientCapabilitySet,
    /// Position units for the session.
    pub offset_encoding: OffsetEncoding,
    /// Whether message tracing was requested at initialize time.
    pub trace_messages: bool,
}

/// Per-client override applied after the advertised tree is collapsed.
///
/// Clients are matched by `clientInfo.name`; a version predicate, when
/// present, further restricts the override to the releases it concerns.
struct ClientQuirk {
    name: &'static str,
    version: Option<fn(&semver::Version) -> bool>,
    apply: fn(&mut ClientCapabilitySet, &mut Config),
}

const QUIRKS: &[ClientQuirk] = &[
    // VS Code resolves fixAll actions fine but omits the kind from its
    // advertised literal set.
    ClientQuirk {
        name: "Visual Studio Code",
        version: None,
        apply: |capabilities, _| capabilities.supports_code_action_fixall = true,
    },
    // Pre-2.0 Sublime Text LSP truncates long detail popups badly.
    ClientQuirk {
        name: "Sublime Text LSP",
        version: Some(|version| version.major < 2),
        apply: |_, config| config.max_detail_length = 256,
    },
    // Neovim renders label details from 0.10 onwards without advertising
    // the capability.
    ClientQuirk {
        name: "Neovim",
        version: Some(|version| *version >= semver::Version::new(0, 10, 0)),
        apply: |capabilities, _| capabilities.label_details = true,
    },
];

/// Collapses the advertised tree into the session snapshot.
///
/// Quirk overrides may also adjust tuning options, so the configuration is
/// passed mutably.
#[must_use]
pub fn negotiate(params: &InitializeParams, config: &mut Config) -> Negotiation {
    let mut capabilities = collapse(&params.capabilities);
    apply_quirks(params.client_info.as_ref(), &mut capabilities, config);

    let offered = params
        .capabilities
        .general
        .as_ref()
        .and_then(|general| general.position_encodings.as_deref())
        .unwrap_or(&[]);
    let offset_encoding = OffsetEncoding::negotiate(offered);

    let trace_messages = !matches!(params.trace, None | Some(TraceValue::Off));

    debug!(
        target: CAPABILITIES_TARGET,
        encoding = offset_encoding.as_str(),
        trace = trace_messages,
        ?capabilities,
        "negotiated session capabilities"
    );

    Negotiation {
        capabilities,
        offset_encoding,
        trace_messages,
    }
}

fn collapse(advertised: &ClientCapabilities) -> ClientCapabilitySet {
    let workspace = advertised.workspace.as_ref();
    let text_document = advertised.text_document.as_ref();
    let synchronization = text_document.and_then(|td| td.synchronization.as_ref());
    let completion_item = text_document
        .and_then(|td| td.completion.as_ref())
        .and_then(|completion| completion.completion_item.as_ref());

    ClientCapabilitySet {
        supports_snippets: completion_item
            .and_then(|item| item.snippet_support)
            .unwrap_or(false),
        supports_apply_edit: workspace.and_then(|ws| ws.apply_edit).unwrap_or(false),
        supports_will_save: synchronization
            .and_then(|sync| sync.will_save)
            .unwrap_or(false),
        supports_will_save_wait_until: synchronization
            .and_then(|sync| sync.will_save_wait_until)
            .unwrap_or(false),
        supports_publish_diagnostics: text_document
            .map(|td| td.publish_diagnostics.is_some())
            .unwrap_or(false),
        supports_code_action_fixall: text_document
            .and_then(|td| td.code_action.as_ref())
            .and_then(|action| action.code_action_literal_support.as_ref())
            .map(|literal| {
                literal
                    .code_action_kind
                    .value_set
                    .iter()
                    .any(|kind| kind.as_str() == "source.fixAll")
            })
            .unwrap_or(false),
        hover_markdown: prefers_markdown(
            text_document
                .and_then(|td| td.hover.as_ref())
                .and_then(|hover| hover.content_format.as_deref()),
        ),
        completion_doc_markdown: prefers_markdown(
            completion_item.and_then(|item| item.documentation_format.as_deref()),
        ),
        label_details: completion_item
            .and_then(|item| item.label_details_support)
            .unwrap_or(false),
        supports_configuration: workspace.and_then(|ws| ws.configuration).unwrap_or(false),
        dynamic_configuration_registration: workspace
            .and_then(|ws| ws.did_change_configuration.as_ref())
            .and_then(|push| push.dynamic_registration)
            .unwrap_or(false),
    }
}

/// Markdown wins only when it precedes plaintext in the ordered list.
fn prefers_markdown(formats: Option<&[MarkupKind]>) -> bool {
    let Some(formats) = formats else {
        return false;
    };
    for format in formats {
        match format {
            MarkupKind::Markdown => return true,
            MarkupKind::PlainText => return false,
        }
    }
    false
}

fn apply_quirks(
    client: Option<&ClientInfo>,
    capabilities: &mut ClientCapabilitySet,
    config: &mut Config,
) {
    let Some(client) = client else {
        return;
    };
    for quirk in QUIRKS {
        if quirk.name != client.name {
            continue;
        }
        if let Some(predicate) = quirk.version {
            let Some(version) = client
                .version
                .as_deref()
                .and_then(|raw| semver::Version::parse(raw).ok())
            else {
                continue;
            };
            if !predicate(&version) {
                continue;
            }
        }
        debug!(
            target: CAPABILITIES_TARGET,
            client = quirk.name,
            "applying client quirk override"
        );
        (quirk.apply)(capabilities, config);
    }
}

/// The server's fixed capability advertisement.
#[must_use]
pub fn server_capabilities(
    config: &Config,
    client: &ClientCapabilitySet,
    encoding: OffsetEncoding,
) -> ServerCapabilities {
    ServerCapabilities {
        position_encoding: Some(encoding.to_position_encoding()),
        text_document_sync: Some(TextDocumentSyncCapability::Options(TextDocumentSyncOptions {
            open_close: Some(true),
            change: Some(TextDocumentSyncKind::INCREMENTAL),
            will_save: Some(true),
            will_save_wait_until: Some(true),
            save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                include_text: Some(false),
            })),
        })),
        completion_provider: Some(CompletionOptions {
            trigger_characters: Some(
                [".", ":", "@", "]", "/"].iter().map(ToString::to_string).collect(),
            ),
            completion_item: Some(CompletionOptionsCompletionItem {
                label_details_support: Some(
                    config.completion_label_details && client.label_details,
                ),
            }),
            ..CompletionOptions::default()
        }),
        signature_help_provider: Some(SignatureHelpOptions {
            trigger_characters: Some(vec!["(".to_string(), ",".to_string()]),
            ..SignatureHelpOptions::default()
        }),
        hover_provider: Some(HoverProviderCapability::Simple(true)),
        declaration_provider: Some(DeclarationCapability::Simple(true)),
        definition_provider: Some(OneOf::Left(true)),
        type_definition_provider: Some(TypeDefinitionProviderCapability::Simple(true)),
        implementation_provider: Some(ImplementationProviderCapability::Simple(true)),
        references_provider: Some(OneOf::Left(true)),
        document_symbol_provider: Some(OneOf::Left(true)),
        document_highlight_provider: Some(OneOf::Left(true)),
        document_formatting_provider: Some(OneOf::Left(true)),
        rename_provider: Some(OneOf::Left(true)),
        code_action_provider: Some(lsp_types::CodeActionProviderCapability::Simple(true)),
        folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
        selection_range_provider: Some(SelectionRangeProviderCapability::Simple(true)),
        inlay_hint_provider: Some(OneOf::Left(true)),
        semantic_tokens_provider: Some(
            SemanticTokensServerCapabilities::SemanticTokensOptions(SemanticTokensOptions {
                legend: token_legend(),
                full: Some(SemanticTokensFullOptions::Bool(true)),
                range: Some(true),
                ..SemanticTokensOptions::default()
            }),
        ),
        ..ServerCapabilities::default()
    }
}

fn token_legend() -> SemanticTokensLegend {
    SemanticTokensLegend {
        token_types: vec![
            SemanticTokenType::NAMESPACE,
            SemanticTokenType::TYPE,
            SemanticTokenType::STRUCT,
            SemanticTokenType::ENUM,
            SemanticTokenType::ENUM_MEMBER,
            SemanticTokenType::PARAMETER,
            SemanticTokenType::VARIABLE,
            SemanticTokenType::PROPERTY,
            SemanticTokenType::FUNCTION,
            SemanticTokenType::METHOD,
            SemanticTokenType::KEYWORD,
            SemanticTokenType::MODIFIER,
            SemanticTokenType::COMMENT,
            SemanticTokenType::STRING,
            SemanticTokenType::NUMBER,
            SemanticTokenType::OPERATOR,
        ],
        token_modifiers: vec![
            SemanticTokenModifier::DECLARATION,
            SemanticTokenModifier::DEFINITION,
            SemanticTokenModifier::READONLY,
            SemanticTokenModifier::STATIC,
            SemanticTokenModifier::DEPRECATED,
            SemanticTokenModifier::DOCUMENTATION,
            SemanticTokenModifier::DEFAULT_LIBRARY,
        ],
    }
}

/// Builds the full `initialize` reply.
#[must_use]
pub fn initialize_result(
    config: &Config,
    client: &ClientCapabilitySet,
    encoding: OffsetEncoding,
) -> InitializeResult {
    InitializeResult {
        capabilities: server_capabilities(config, client, encoding),
        server_info: Some(ServerInfo {
            name: SERVER_NAME.to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }),
        ..InitializeResult::default()
    }
}

#[cfg(test)]
mod tests {
    use lsp_types::{
        CodeActionClientCapabilities, CodeActionKindLiteralSupport, CodeActionLiteralSupport,
        CompletionClientCapabilities, CompletionItemCapability, GeneralClientCapabilities,
        HoverClientCapabilities, TextDocumentClientCapabilities, WorkspaceClientCapabilities,
    };
    use rstest::rstest;

    use super::*;

    fn params_with(capabilities: ClientCapabilities) -> InitializeParams {
        InitializeParams {
            capabilities,
            ..InitializeParams::default()
        }
    }

    #[rstest]
    #[case::prefers_utf8(vec!["utf-8", "utf-16"], OffsetEncoding::Utf8)]
    #[case::utf8_wins_late(vec!["utf-16", "utf-8"], OffsetEncoding::Utf8)]
    #[case::utf32_over_utf16(vec!["utf-32", "utf-16"], OffsetEncoding::Utf32)]
    #[case::only_utf16(vec!["utf-16"], OffsetEncoding::Utf16)]
    #[case::empty_offer(vec![], OffsetEncoding::Utf16)]
    fn offset_encoding_preference(
        #[case] offered: Vec<&'static str>,
        #[case] expected: OffsetEncoding,
    ) {
        let offered: Vec<PositionEncodingKind> =
            offered.into_iter().map(PositionEncodingKind::new).collect();
        assert_eq!(OffsetEncoding::negotiate(&offered), expected);
    }

    #[rstest]
    #[case::markdown_first(vec![MarkupKind::Markdown, MarkupKind::PlainText], true)]
    #[case::plaintext_first(vec![MarkupKind::PlainText, MarkupKind::Markdown], false)]
    #[case::markdown_only(vec![MarkupKind::Markdown], true)]
    #[case::empty(vec![], false)]
    fn markdown_wins_only_when_listed_first(
        #[case] formats: Vec<MarkupKind>,
        #[case] expected: bool,
    ) {
        assert_eq!(prefers_markdown(Some(&formats)), expected);
    }

    #[test]
    fn empty_advertisement_collapses_to_all_false() {
        let mut config = Config::default();
        let negotiation = negotiate(&params_with(ClientCapabilities::default()), &mut config);
        assert_eq!(negotiation.capabilities, ClientCapabilitySet::default());
        assert_eq!(negotiation.offset_encoding, OffsetEncoding::Utf16);
        assert!(!negotiation.trace_messages);
    }

    #[test]
    fn collapses_nested_advertisement() {
        let capabilities = ClientCapabilities {
            workspace: Some(WorkspaceClientCapabilities {
                apply_edit: Some(true),
                configuration: Some(true),
                ..WorkspaceClientCapabilities::default()
            }),
            text_document: Some(TextDocumentClientCapabilities {
                hover: Some(HoverClientCapabilities {
                    content_format: Some(vec![MarkupKind::Markdown, MarkupKind::PlainText]),
                    ..HoverClientCapabilities::default()
                }),
                completion: Some(CompletionClientCapabilities {
                    completion_item: Some(CompletionItemCapability {
                        snippet_support: Some(true),
                        label_details_support: Some(true),
                        documentation_format: Some(vec![
                            MarkupKind::PlainText,
                            MarkupKind::Markdown,
                        ]),
                        ..CompletionItemCapability::default()
                    }),
                    ..CompletionClientCapabilities::default()
                }),
                code_action: Some(CodeActionClientCapabilities {
                    code_action_literal_support: Some(CodeActionLiteralSupport {
                        code_action_kind: CodeActionKindLiteralSupport {
                            value_set: vec!["quickfix".into(), "source.fixAll".into()],
                        },
                    }),
                    ..CodeActionClientCapabilities::default()
                }),
                ..TextDocumentClientCapabilities::default()
            }),
            ..ClientCapabilities::default()
        };

        let mut config = Config::default();
        let negotiation = negotiate(&params_with(capabilities), &mut config);
        let set = negotiation.capabilities;

        assert!(set.supports_snippets);
        assert!(set.supports_apply_edit);
        assert!(set.supports_configuration);
        assert!(set.supports_code_action_fixall);
        assert!(set.hover_markdown);
        assert!(!set.completion_doc_markdown);
        assert!(set.label_details);
        assert!(!set.supports_will_save_wait_until);
    }

    #[test]
    fn trace_setting_enables_message_tracing() {
        let mut config = Config::default();
        let mut params = params_with(ClientCapabilities::default());
        params.trace = Some(TraceValue::Verbose);
        assert!(negotiate(&params, &mut config).trace_messages);

        params.trace = Some(TraceValue::Off);
        assert!(!negotiate(&params, &mut config).trace_messages);
    }

    #[rstest]
    #[case::old_sublime("Sublime Text LSP", Some("1.28.0"), 256)]
    #[case::new_sublime("Sublime Text LSP", Some("2.1.0"), zls_config::DEFAULT_MAX_DETAIL_LENGTH)]
    #[case::unversioned_sublime("Sublime Text LSP", None, zls_config::DEFAULT_MAX_DETAIL_LENGTH)]
    #[case::unknown_client("ed", Some("1.0.0"), zls_config::DEFAULT_MAX_DETAIL_LENGTH)]
    fn version_gated_quirk_tunes_detail_length(
        #[case] name: &str,
        #[case] version: Option<&str>,
        #[case] expected: u32,
    ) {
        let mut config = Config::default();
        let mut params = params_with(ClientCapabilities::default());
        params.client_info = Some(ClientInfo {
            name: name.to_string(),
            version: version.map(str::to_string),
        });

        negotiate(&params, &mut config);
        assert_eq!(config.max_detail_length, expected);
    }

    #[test]
    fn vscode_quirk_forces_fixall() {
        let mut config = Config::default();
        let mut params = params_with(ClientCapabilities::default());
        params.client_info = Some(ClientInfo {
            name: "Visual Studio Code".to_string(),
            version: Some("1.89.1".to_string()),
        });

        let negotiation = negotiate(&params, &mut config);
        assert!(negotiation.capabilities.supports_code_action_fixall);
    }

    #[test]
    fn advertisement_names_the_server() {
        let config = Config::default();
        let result = initialize_result(
            &config,
            &ClientCapabilitySet::default(),
            OffsetEncoding::Utf8,
        );

        let info = result.server_info.expect("server info expected");
        assert_eq!(info.name, "zls");
        assert_eq!(
            result.capabilities.position_encoding,
            Some(PositionEncodingKind::UTF8)
        );
    }
}
