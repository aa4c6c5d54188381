//! Configuration record for the zls server.
//!
//! The effective configuration is a flat record of typed options. Option
//! values arrive from the client over the protocol, either pulled through
//! `workspace/configuration` or pushed through
//! `workspace/didChangeConfiguration`, and every incoming value passes
//! through the per-kind coercion rules in [`options`] before it replaces the
//! current value. A value of the wrong shape never clobbers a good one.

mod options;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub use options::{
    Applied, ChangeReport, CoercionError, OptionDescriptor, OptionKind, OPTIONS,
};

/// Default clamp applied to hover and completion detail text.
pub const DEFAULT_MAX_DETAIL_LENGTH: u32 = 1_048_576;

/// Granularity of semantic token responses.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SemanticTokensMode {
    /// Semantic tokens are not produced.
    None,
    /// Only tokens the syntax tree alone can classify.
    Partial,
    /// Tokens backed by full semantic analysis.
    #[default]
    Full,
}

/// Effective server configuration.
///
/// Lives for the whole process; mutated only through the coercing appliers so
/// every field always holds a value of its declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Whether completions may contain snippet placeholders.
    pub enable_snippets: bool,
    /// Whether compiler-suggested fixes are applied around save.
    pub enable_autofix: bool,
    /// Whether inlay hints are produced.
    pub enable_inlay_hints: bool,
    /// Whether completion items carry label details.
    pub completion_label_details: bool,
    /// Semantic token granularity.
    pub semantic_tokens: SemanticTokensMode,
    /// Upper bound on detail text length, in bytes.
    pub max_detail_length: u32,
    /// Path to the toolchain executable used for external syntax checks.
    pub zig_exe_path: Option<String>,
    /// Path to a pre-resolved builtin description file.
    pub builtin_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_snippets: true,
            enable_autofix: false,
            enable_inlay_hints: true,
            completion_label_details: true,
            semantic_tokens: SemanticTokensMode::default(),
            max_detail_length: DEFAULT_MAX_DETAIL_LENGTH,
            zig_exe_path: None,
            builtin_path: None,
        }
    }
}
