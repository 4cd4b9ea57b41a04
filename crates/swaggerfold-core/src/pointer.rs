//! Reference pointers, cycle markers and pointer resolution.
//!
//! A pointer has the form `#/<section>/<name>` and is only meaningful against
//! the root document that produced it. External references are not supported.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::value::{deep_copy, is_kind, Kind};

/// Prefix shared by every pointer into the definitions section.
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

static POINTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#/([^/]+)/([^/]+)((?:/[^/]*)*)$").unwrap());

/// A parsed local reference pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pointer {
    raw: String,
    section: String,
    name: String,
    depth: usize,
}

impl Pointer {
    /// Parse `#/<section>/<name>[/...]`.
    ///
    /// Segments are unescaped per RFC 6901 (`~1` is `/`, `~0` is `~`).
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = POINTER_RE.captures(raw)?;
        let rest = caps.get(3).map_or("", |m| m.as_str());
        Some(Self {
            raw: raw.to_string(),
            section: unescape(&caps[1]),
            name: unescape(&caps[2]),
            depth: rest.matches('/').count(),
        })
    }

    /// Pointer to a named definition.
    pub fn definition(name: &str) -> Self {
        Self {
            raw: format!("{}{}", DEFINITIONS_PREFIX, escape(name)),
            section: "definitions".to_string(),
            name: name.to_string(),
            depth: 0,
        }
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether this addresses a whole definition, not something inside one.
    pub fn is_definition(&self) -> bool {
        self.section == "definitions" && self.depth == 0
    }

    /// Look the pointer up in `root` without copying.
    pub fn locate<'a>(&self, root: &'a JsonValue) -> Option<&'a JsonValue> {
        if !is_kind(root, Kind::Object) {
            return None;
        }
        root.pointer(&self.raw[1..])
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Terminal marker left where expanding a definition would loop back onto
/// one already being expanded.
///
/// A marker is an opaque leaf. Nothing dereferences it again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedRef {
    pub path: String,
    pub nested: bool,
}

impl NestedRef {
    pub fn new(pointer: &Pointer) -> Self {
        Self {
            path: pointer.as_str().to_string(),
            nested: true,
        }
    }

    /// Recognise a marker. Only `nested: true` counts.
    pub fn from_value(value: &JsonValue) -> Option<Self> {
        let map = value.as_object()?;
        if map.get("nested") != Some(&JsonValue::Bool(true)) {
            return None;
        }
        let path = map.get("path")?.as_str()?;
        Some(Self {
            path: path.to_string(),
            nested: true,
        })
    }

    pub fn to_value(&self) -> JsonValue {
        json!({ "path": self.path, "nested": true })
    }
}

/// Resolve a reference against the root document.
///
/// * An absent pointer stays absent.
/// * A non-string pointer is a node that was already inlined. A copy of it
///   comes back.
/// * A string pointer resolves to a copy of its target. A malformed pointer or
///   a missing target gives `None`.
pub fn get_ref(root: &JsonValue, pointer: Option<&JsonValue>) -> Option<JsonValue> {
    let pointer = pointer?;
    let Some(raw) = pointer.as_str() else {
        return Some(deep_copy(pointer));
    };
    let target = Pointer::parse(raw)?.locate(root)?;
    Some(deep_copy(target))
}
