//! Classification and copying of decoded document values.

use std::fmt;

use serde_json::Value as JsonValue;

/// Semantic kind of a decoded value.
///
/// Objects and arrays are told apart structurally, so an object used as an
/// ordered map never classifies as an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    String,
    Number,
    Boolean,
    Null,
    /// The value is absent altogether.
    Undefined,
    Array,
    Object,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Boolean => "boolean",
            Kind::Null => "null",
            Kind::Undefined => "undefined",
            Kind::Array => "array",
            Kind::Object => "object",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a decoded value.
pub fn classify(value: &JsonValue) -> Kind {
    match value {
        JsonValue::String(_) => Kind::String,
        JsonValue::Number(_) => Kind::Number,
        JsonValue::Bool(_) => Kind::Boolean,
        JsonValue::Null => Kind::Null,
        JsonValue::Array(_) => Kind::Array,
        JsonValue::Object(_) => Kind::Object,
    }
}

/// Classify a value that may be missing.
pub fn classify_opt(value: Option<&JsonValue>) -> Kind {
    value.map_or(Kind::Undefined, classify)
}

/// Whether `value` has the given kind.
pub fn is_kind(value: &JsonValue, kind: Kind) -> bool {
    classify(value) == kind
}

/// Produce an independent structural copy of `value`.
///
/// Every node handed out by the pointer resolver or the definition expander
/// goes through here, and the receiver owns the copy outright.
pub fn deep_copy(value: &JsonValue) -> JsonValue {
    value.clone()
}

/// Whether a value counts as present when choosing between fallbacks.
///
/// `null`, `false`, zero and the empty string are treated like an absent
/// field. Empty arrays and objects are present.
pub fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}

/// Return the first present value in a fallback chain.
pub fn first_truthy<'a, I>(candidates: I) -> Option<&'a JsonValue>
where
    I: IntoIterator<Item = Option<&'a JsonValue>>,
{
    candidates.into_iter().flatten().find(|v| is_truthy(v))
}
