use core_types::ElementId;
use thiserror::Error;

/// Why `attach` refused an element. Nothing is mutated when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachError {
    #[error("element {0} does not exist in the document")]
    UnknownElement(ElementId),

    #[error("element {element} is <{tag}>, spinners bind only to text-like <input> elements")]
    NotAnInput { element: ElementId, tag: String },
}

/// Configuration diagnostics. Never returned to callers; logged while the
/// resolver falls back to a lower-precedence source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("attribute {name}={value:?} is not a valid {expected}")]
    MalformedAttribute {
        name: String,
        value: String,
        expected: &'static str,
    },

    #[error("{source_name} value for `{key}` rejected ({value}): {reason}")]
    Rejected {
        source_name: &'static str,
        key: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("min {min} is greater than max {max}; max falls back to unbounded")]
    InvertedBounds { min: f64, max: f64 },
}
