//! The document resolver and its three entry points.
//!
//! A [`Resolver`] owns one resolved document. [`Resolver::resolve`] decodes the
//! input and expands its definitions, [`Resolver::parse`] normalizes every
//! operation, and [`Resolver::compare`] checks another input against it.
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use swaggerfold_core::Resolver;
//!
//! let mut resolver = Resolver::new(json!({
//!     "swagger": "2.0",
//!     "paths": {
//!         "/users/{userId}": {
//!             "get": { "parameters": { "userId": { "type": "string" } } }
//!         }
//!     }
//! }));
//!
//! let document = resolver.parse().unwrap();
//! let parameters = &document["paths"]["/users/{userId}"]["get"]["parameters"];
//! assert_eq!(parameters[0]["name"], "userId");
//! assert!(resolver.diagnostics().is_empty());
//! ```

// Internal imports (std, crate)
use crate::compare::structurally_equal;
use crate::config::Config;
use crate::definitions::expand_definitions;
use crate::diagnostics::{DiagnosticKind, Diagnostics, Location};
use crate::normalize::{Node, Normalizer};
use crate::pointer;
use crate::value::{classify, deep_copy};
use crate::walker::Walker;
use crate::Error;

// External imports (alphabetized)
use serde_json::Value as JsonValue;

/// What a resolver can be given: document text or an already decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// YAML or JSON text
    Text(String),
    /// A decoded document
    Value(JsonValue),
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Input::Text(text.to_string())
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Input::Text(text)
    }
}

impl From<JsonValue> for Input {
    fn from(value: JsonValue) -> Self {
        Input::Value(value)
    }
}

impl From<&JsonValue> for Input {
    fn from(value: &JsonValue) -> Self {
        Input::Value(deep_copy(value))
    }
}

/// Resolves references in one Swagger 2.0 document and normalizes its
/// operations.
#[derive(Debug, Clone)]
pub struct Resolver {
    document: Option<JsonValue>,
    diagnostics: Diagnostics,
    config: Config,
    parsed: bool,
}

impl Resolver {
    /// Resolve `input` with the default configuration.
    pub fn new(input: impl Into<Input>) -> Self {
        Self::with_config(input, Config::default())
    }

    pub fn with_config(input: impl Into<Input>, config: Config) -> Self {
        let mut resolver = Self {
            document: None,
            diagnostics: Diagnostics::new(),
            config,
            parsed: false,
        };
        resolver.document = resolver.resolve(input);
        resolver
    }

    /// Decode `input` and expand its `definitions`.
    ///
    /// Decoding problems are soft: they are recorded as diagnostics and the
    /// result is `None`. The resolver's own document is left unchanged.
    pub fn resolve(&mut self, input: impl Into<Input>) -> Option<JsonValue> {
        let document = match input.into() {
            Input::Value(value) => value,
            Input::Text(text) => decode(&text, &mut self.diagnostics)?,
        };
        let kind = classify(&document);
        let JsonValue::Object(mut document) = document else {
            self.diagnostics.push(
                DiagnosticKind::NotAnObject,
                Location::root(),
                format!("expected a document object, found {}", kind),
            );
            return None;
        };

        if let Some(JsonValue::Object(definitions)) = document.get("definitions") {
            let expanded = expand_definitions(definitions, &mut self.diagnostics);
            log::debug!("expanded {} of {} definitions", expanded.len(), definitions.len());
            document.insert("definitions".to_string(), JsonValue::Object(expanded));
        }
        Some(JsonValue::Object(document))
    }

    /// Validate the document and normalize every operation in place.
    ///
    /// On failure the document is left as it was.
    pub fn parse(&mut self) -> crate::Result<&JsonValue> {
        let document = self
            .document
            .as_ref()
            .ok_or_else(|| Error::specification("no document was resolved"))?;
        let paths = Walker::new(document, &self.config, &mut self.diagnostics).walk()?;

        let document = self
            .document
            .as_mut()
            .ok_or_else(|| Error::specification("no document was resolved"))?;
        if let JsonValue::Object(map) = document {
            map.insert("paths".to_string(), JsonValue::Object(paths));
        }
        self.parsed = true;
        Ok(&*document)
    }

    /// Whether `other`, resolved the same way as this document, is
    /// structurally equal to it.
    ///
    /// Once this resolver has been parsed, `other` is parsed as well.
    /// Diagnostics raised while resolving `other` are not kept.
    pub fn compare(&self, other: impl Into<Input>) -> bool {
        let Some(other) = self.resolve_other(other) else {
            return false;
        };
        match &self.document {
            Some(document) => structurally_equal(document, &other),
            None => false,
        }
    }

    /// Resolve `other` at the same stage as this document, in a resolver of its own.
    pub fn resolve_other(&self, other: impl Into<Input>) -> Option<JsonValue> {
        let mut resolver = Resolver::with_config(other, self.config.clone());
        if self.parsed {
            if let Err(e) = resolver.parse() {
                log::debug!("compared document does not parse: {}", e);
                return None;
            }
        }
        resolver.into_document()
    }

    /// Normalize a single fragment against this document.
    pub fn lookup(&mut self, fragment: JsonValue) -> Option<Node> {
        let document = self.document.as_ref()?;
        Normalizer::new(document, &mut self.diagnostics)
            .with_max_depth(self.config.max_depth)
            .lookup(fragment, &Location::root())
    }

    /// Look up a `#/<section>/<name>` pointer in this document.
    pub fn get_ref(&self, pointer: Option<&JsonValue>) -> Option<JsonValue> {
        match &self.document {
            Some(document) => pointer::get_ref(document, pointer),
            None => pointer.map(deep_copy),
        }
    }

    pub fn document(&self) -> Option<&JsonValue> {
        self.document.as_ref()
    }

    pub fn into_document(self) -> Option<JsonValue> {
        self.document
    }

    pub fn is_parsed(&self) -> bool {
        self.parsed
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// JSON first, then YAML. Most JSON is also YAML, but the JSON parser gives
/// the better error for documents that are neither.
fn decode(text: &str, diagnostics: &mut Diagnostics) -> Option<JsonValue> {
    match serde_json::from_str(text) {
        Ok(value) => Some(value),
        Err(json_error) => match serde_yaml::from_str::<JsonValue>(text) {
            Ok(value) => Some(value),
            Err(yaml_error) => {
                let message = if text.trim_start().starts_with(['{', '[']) {
                    json_error.to_string()
                } else {
                    yaml_error.to_string()
                };
                diagnostics.push(DiagnosticKind::DecodeFailed, Location::root(), message);
                None
            }
        },
    }
}
