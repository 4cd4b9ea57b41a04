//! Soft failures collected while resolving a document.
//!
//! A diagnostic means one unit of output (a parameter, a response, a path, an
//! operation or a definition) was dropped and the walk carried on. Every
//! diagnostic is also emitted through the `log` facade as it is recorded.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What went wrong with the dropped unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Textual input could not be decoded as JSON or YAML.
    DecodeFailed,
    /// An object was expected and something else was found.
    NotAnObject,
    /// A `$ref` pointer did not lead anywhere.
    UnresolvedReference,
    /// A path item's `$ref` did not lead anywhere.
    UnresolvedPath,
    /// A definition could not be expanded.
    DefinitionDropped,
    /// A container had a shape the walker does not understand.
    InvalidShape,
    /// Schema nesting went past the configured depth.
    DepthExceeded,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticKind::DecodeFailed => "decode failed",
            DiagnosticKind::NotAnObject => "not an object",
            DiagnosticKind::UnresolvedReference => "unresolved reference",
            DiagnosticKind::UnresolvedPath => "unresolved path",
            DiagnosticKind::DefinitionDropped => "definition dropped",
            DiagnosticKind::InvalidShape => "invalid shape",
            DiagnosticKind::DepthExceeded => "depth exceeded",
        };
        f.write_str(s)
    }
}

/// A single soft failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// JSON Pointer to the dropped unit in the input document.
    pub location: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.location.is_empty() {
            write!(f, "{}: {}", self.kind, self.message)
        } else {
            write!(f, "{} at {}: {}", self.kind, self.location, self.message)
        }
    }
}

/// Ordered collection of diagnostics for one resolution session.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and log it.
    pub fn push(
        &mut self,
        kind: DiagnosticKind,
        location: impl Into<String>,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            kind,
            location: location.into(),
            message: message.into(),
        };
        match kind {
            DiagnosticKind::DecodeFailed => log::error!("{}", diagnostic),
            _ => log::warn!("{}", diagnostic),
        }
        self.entries.push(diagnostic);
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of diagnostics of a given kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    /// Drain the collected diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// JSON Pointer to a node of the input document, built up while walking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location(String);

impl Location {
    pub fn root() -> Self {
        Self::default()
    }

    /// Location of a child node, escaping the segment as RFC 6901 requires.
    pub fn child(&self, segment: impl AsRef<str>) -> Self {
        let escaped = segment.as_ref().replace('~', "~0").replace('/', "~1");
        Self(format!("{}/{}", self.0, escaped))
    }

    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}/{}", self.0, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Location> for String {
    fn from(location: &Location) -> Self {
        location.0.clone()
    }
}

impl From<Location> for String {
    fn from(location: Location) -> Self {
        location.0
    }
}
