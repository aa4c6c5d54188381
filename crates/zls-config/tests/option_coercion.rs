//! Behavioural coverage for option coercion across the whole record.

use rstest::rstest;
use serde_json::{json, Value};
use zls_config::{Config, OptionKind, SemanticTokensMode, OPTIONS};

/// A JSON value that is guaranteed to mismatch the option's declared kind.
fn mismatched_probe(kind: OptionKind) -> Value {
    match kind {
        OptionKind::Bool => json!("true"),
        OptionKind::Integer { .. } => json!(false),
        OptionKind::String => json!(17),
        OptionKind::Enum { .. } => json!(3.5),
    }
}

#[test]
fn coercion_is_type_preserving_for_every_option() {
    for descriptor in OPTIONS {
        let mut config = Config::default();
        let before = config.clone();
        let outcome = config.apply_json(descriptor.name, &mismatched_probe(descriptor.kind));
        assert!(
            outcome.is_err(),
            "option '{}' accepted a mismatched value",
            descriptor.name
        );
        assert_eq!(
            config, before,
            "option '{}' mutated the record on rejection",
            descriptor.name
        );
    }
}

#[test]
fn full_override_round_trips_every_kind() {
    let mut config = Config::default();
    let report = config.apply_object(&json!({
        "enable_snippets": false,
        "enable_autofix": true,
        "enable_inlay_hints": false,
        "completion_label_details": false,
        "semantic_tokens": "partial",
        "max_detail_length": 4096,
        "zig_exe_path": " /usr/local/bin/zig ",
        "builtin_path": "/tmp/builtin.zig",
    }));

    assert_eq!(report.changed.len(), OPTIONS.len());
    assert!(report.rejected.is_empty());
    assert!(!config.enable_snippets);
    assert!(config.enable_autofix);
    assert!(!config.enable_inlay_hints);
    assert!(!config.completion_label_details);
    assert_eq!(config.semantic_tokens, SemanticTokensMode::Partial);
    assert_eq!(config.max_detail_length, 4096);
    assert_eq!(config.zig_exe_path.as_deref(), Some("/usr/local/bin/zig"));
    assert_eq!(config.builtin_path.as_deref(), Some("/tmp/builtin.zig"));
}

#[rstest]
#[case::toolchain_path("zig_exe_path")]
#[case::builtin_path("builtin_path")]
fn nil_string_counts_as_absent(#[case] option: &str) {
    let mut config = Config::default();
    config
        .apply_json(option, &json!("/previous/path"))
        .expect("seed value should coerce");
    let outcome = config.apply_json(option, &json!("nil"));
    assert!(outcome.is_err());

    let report = config.apply_object(&json!({ option: "/next/path" }));
    assert!(report.option_changed(option));
}

#[test]
fn enumeration_order_is_stable() {
    let names: Vec<&str> = OPTIONS.iter().map(|descriptor| descriptor.name).collect();
    assert_eq!(
        names,
        vec![
            "enable_snippets",
            "enable_autofix",
            "enable_inlay_hints",
            "completion_label_details",
            "semantic_tokens",
            "max_detail_length",
            "zig_exe_path",
            "builtin_path",
        ]
    );
}
