//! Option descriptors and coercion rules.
//!
//! Every option the server recognises is listed in [`OPTIONS`], in the order
//! the configuration pull enumerates them on the wire. Incoming JSON values
//! are coerced into the option's declared kind; a mismatch is reported and
//! the previous value survives.

use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

use crate::Config;

/// Declared shape of a single option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// A strict JSON boolean.
    Bool,
    /// A JSON integer inside an inclusive range.
    Integer {
        /// Smallest accepted value.
        min: i64,
        /// Largest accepted value.
        max: i64,
    },
    /// A trimmed, non-empty string; the literal `"nil"` counts as absent.
    String,
    /// A JSON string naming one of the listed variants.
    Enum {
        /// Accepted variant names.
        variants: &'static [&'static str],
    },
}

/// One recognised option, as enumerated over the wire.
#[derive(Debug, Clone, Copy)]
pub struct OptionDescriptor {
    /// Option name without the `zls.` prefix.
    pub name: &'static str,
    /// Declared shape used during coercion.
    pub kind: OptionKind,
}

/// Inclusive range accepted for `max_detail_length`.
const MAX_DETAIL_LENGTH_RANGE: (i64, i64) = (0, 10_000_000);

/// Every recognised option, in wire enumeration order.
pub const OPTIONS: &[OptionDescriptor] = &[
    OptionDescriptor {
        name: "enable_snippets",
        kind: OptionKind::Bool,
    },
    OptionDescriptor {
        name: "enable_autofix",
        kind: OptionKind::Bool,
    },
    OptionDescriptor {
        name: "enable_inlay_hints",
        kind: OptionKind::Bool,
    },
    OptionDescriptor {
        name: "completion_label_details",
        kind: OptionKind::Bool,
    },
    OptionDescriptor {
        name: "semantic_tokens",
        kind: OptionKind::Enum {
            variants: &["none", "partial", "full"],
        },
    },
    OptionDescriptor {
        name: "max_detail_length",
        kind: OptionKind::Integer {
            min: MAX_DETAIL_LENGTH_RANGE.0,
            max: MAX_DETAIL_LENGTH_RANGE.1,
        },
    },
    OptionDescriptor {
        name: "zig_exe_path",
        kind: OptionKind::String,
    },
    OptionDescriptor {
        name: "builtin_path",
        kind: OptionKind::String,
    },
];

/// Errors raised while coercing an incoming option value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoercionError {
    /// The JSON value has the wrong type for the option.
    #[error("expected {expected}, found {found}")]
    WrongType {
        /// Declared type of the option.
        expected: &'static str,
        /// JSON type that actually arrived.
        found: &'static str,
    },

    /// A string option was empty after trimming.
    #[error("string value is empty")]
    EmptyString,

    /// A string option held the literal `"nil"`.
    #[error("string value is the literal \"nil\"")]
    NilString,

    /// An integer option fell outside its declared range.
    #[error("integer {value} is outside {min}..={max}")]
    OutOfRange {
        /// Value that arrived.
        value: i64,
        /// Smallest accepted value.
        min: i64,
        /// Largest accepted value.
        max: i64,
    },

    /// An enum option named no known variant.
    #[error("unknown variant '{variant}'")]
    UnknownVariant {
        /// Name that arrived.
        variant: String,
    },

    /// The option name itself is not recognised.
    #[error("unknown option '{name}'")]
    UnknownOption {
        /// Name that arrived.
        name: String,
    },
}

/// Whether an accepted value actually differed from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The option now holds a new value.
    Changed,
    /// The incoming value equalled the current one, or no value arrived.
    Unchanged,
}

/// Outcome of applying a batch of option updates.
#[derive(Debug, Default)]
pub struct ChangeReport {
    /// Options whose value changed, in application order.
    pub changed: Vec<&'static str>,
    /// Options whose incoming value was rejected, with the reason.
    pub rejected: Vec<(&'static str, CoercionError)>,
}

impl ChangeReport {
    /// Whether any option changed.
    #[must_use]
    pub fn any_changed(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Whether the named option changed in this batch.
    #[must_use]
    pub fn option_changed(&self, name: &str) -> bool {
        self.changed.iter().any(|changed| *changed == name)
    }
}

impl Config {
    /// Applies one incoming value to the named option.
    ///
    /// A JSON `null` means the client holds no value for the option and
    /// leaves the current value untouched.
    ///
    /// # Errors
    ///
    /// Returns a [`CoercionError`] when the option name is unknown or the
    /// value does not coerce into the option's declared kind. The current
    /// value survives every error.
    pub fn apply_json(&mut self, name: &str, value: &Value) -> Result<Applied, CoercionError> {
        if value.is_null() {
            return Ok(Applied::Unchanged);
        }
        match name {
            "enable_snippets" => replace(&mut self.enable_snippets, coerce_bool(value)?),
            "enable_autofix" => replace(&mut self.enable_autofix, coerce_bool(value)?),
            "enable_inlay_hints" => replace(&mut self.enable_inlay_hints, coerce_bool(value)?),
            "completion_label_details" => {
                replace(&mut self.completion_label_details, coerce_bool(value)?)
            }
            "semantic_tokens" => replace(&mut self.semantic_tokens, coerce_enum(value)?),
            "max_detail_length" => {
                let (min, max) = MAX_DETAIL_LENGTH_RANGE;
                let accepted = coerce_integer(value, min, max)?;
                // Range keeps the value inside u32.
                replace(&mut self.max_detail_length, accepted as u32)
            }
            "zig_exe_path" => replace(&mut self.zig_exe_path, Some(coerce_string(value)?)),
            "builtin_path" => replace(&mut self.builtin_path, Some(coerce_string(value)?)),
            _ => Err(CoercionError::UnknownOption {
                name: name.to_string(),
            }),
        }
    }

    /// Applies a full override object, one recognised option at a time.
    ///
    /// Unknown keys in `settings` are ignored; recognised options with
    /// malformed values are recorded as rejected and keep their current
    /// value.
    pub fn apply_object(&mut self, settings: &Value) -> ChangeReport {
        let mut report = ChangeReport::default();
        let Some(map) = settings.as_object() else {
            return report;
        };
        for descriptor in OPTIONS {
            let Some(value) = map.get(descriptor.name) else {
                continue;
            };
            match self.apply_json(descriptor.name, value) {
                Ok(Applied::Changed) => report.changed.push(descriptor.name),
                Ok(Applied::Unchanged) => {}
                Err(error) => report.rejected.push((descriptor.name, error)),
            }
        }
        report
    }
}

fn replace<T: PartialEq>(slot: &mut T, accepted: T) -> Result<Applied, CoercionError> {
    if *slot == accepted {
        return Ok(Applied::Unchanged);
    }
    *slot = accepted;
    Ok(Applied::Changed)
}

fn coerce_bool(value: &Value) -> Result<bool, CoercionError> {
    value.as_bool().ok_or(CoercionError::WrongType {
        expected: "boolean",
        found: json_type(value),
    })
}

fn coerce_integer(value: &Value, min: i64, max: i64) -> Result<i64, CoercionError> {
    let integer = value.as_i64().ok_or(CoercionError::WrongType {
        expected: "integer",
        found: json_type(value),
    })?;
    if integer < min || integer > max {
        return Err(CoercionError::OutOfRange {
            value: integer,
            min,
            max,
        });
    }
    Ok(integer)
}

fn coerce_string(value: &Value) -> Result<String, CoercionError> {
    let text = value.as_str().ok_or(CoercionError::WrongType {
        expected: "string",
        found: json_type(value),
    })?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CoercionError::EmptyString);
    }
    if trimmed == "nil" {
        return Err(CoercionError::NilString);
    }
    Ok(trimmed.to_string())
}

fn coerce_enum<E>(value: &Value) -> Result<E, CoercionError>
where
    E: FromStr,
{
    let text = value.as_str().ok_or(CoercionError::WrongType {
        expected: "string",
        found: json_type(value),
    })?;
    E::from_str(text).map_err(|_| CoercionError::UnknownVariant {
        variant: text.to_string(),
    })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
