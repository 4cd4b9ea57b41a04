//! Walking the declared paths and operations of a document.
//!
//! For every operation the walker replaces `parameters` with an ordered list
//! of normalized nodes and `responses` with a mapping of normalized nodes keyed
//! by response name. Paths and operations it cannot make sense of are
//! dropped with a diagnostic.

// Internal imports (std, crate)
use std::fmt;
use std::str::FromStr;

use crate::config::Config;
use crate::diagnostics::{DiagnosticKind, Diagnostics, Location};
use crate::normalize::{named_fragment, Node, Normalizer};
use crate::pointer::get_ref;
use crate::value::{classify, deep_copy, first_truthy};
use crate::Error;

// External imports (alphabetized)
use serde_json::{Map, Value as JsonValue};

/// The only version marker accepted.
pub const SWAGGER_VERSION: &str = "2.0";

/// HTTP methods that name an operation under a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "get" => Ok(HttpMethod::Get),
            "put" => Ok(HttpMethod::Put),
            "post" => Ok(HttpMethod::Post),
            "delete" => Ok(HttpMethod::Delete),
            "options" => Ok(HttpMethod::Options),
            "head" => Ok(HttpMethod::Head),
            "patch" => Ok(HttpMethod::Patch),
            _ => Err(format!("Unknown HTTP method: {}", s)),
        }
    }
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Post => "post",
            Self::Delete => "delete",
            Self::Options => "options",
            Self::Head => "head",
            Self::Patch => "patch",
        }
    }

    pub fn all() -> impl Iterator<Item = Self> {
        use HttpMethod::*;
        [Get, Put, Post, Delete, Options, Head, Patch].into_iter()
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Check the version marker and the presence of `paths`.
pub fn validate(document: &JsonValue) -> crate::Result<()> {
    match document.get("swagger") {
        Some(JsonValue::String(version)) if version == SWAGGER_VERSION => {}
        Some(other) => {
            return Err(Error::specification(format!(
                "unsupported swagger version {}, expected \"{}\"",
                other, SWAGGER_VERSION
            )))
        }
        None => {
            return Err(Error::specification(
                "missing `swagger` version marker",
            ))
        }
    }
    match document.get("paths") {
        Some(JsonValue::Object(_)) => Ok(()),
        Some(JsonValue::Null) | None => Err(Error::specification(
            "`paths` is required for the specification",
        )),
        Some(other) => Err(Error::specification(format!(
            "`paths` must be a mapping, found {}",
            classify(other)
        ))),
    }
}

/// Normalizes every operation of a validated document.
pub struct Walker<'a> {
    root: &'a JsonValue,
    config: &'a Config,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> Walker<'a> {
    pub fn new(root: &'a JsonValue, config: &'a Config, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            root,
            config,
            diagnostics,
        }
    }

    /// Validate the document and build its normalized `paths` mapping.
    ///
    /// The root document is only read. The caller swaps the result in.
    pub fn walk(&mut self) -> crate::Result<Map<String, JsonValue>> {
        let root = self.root;
        validate(root)?;
        let paths = root
            .get("paths")
            .and_then(JsonValue::as_object)
            .ok_or_else(|| Error::specification("`paths` must be a mapping"))?;

        let mut walked = Map::new();
        for (path, item) in paths {
            if let Some(item) = self.walk_path(path, item) {
                walked.insert(path.clone(), item);
            }
        }
        log::debug!("walked {} of {} paths", walked.len(), paths.len());
        Ok(walked)
    }

    fn walk_path(&mut self, path: &str, item: &JsonValue) -> Option<JsonValue> {
        let at = Location::root().child("paths").child(path);
        let item = match first_truthy([item.get("$ref")]) {
            Some(reference) => match get_ref(self.root, Some(reference)) {
                Some(resolved) => resolved,
                None => {
                    self.diagnostics.push(
                        DiagnosticKind::UnresolvedPath,
                        &at,
                        format!("unknown path $ref {}, path removed", reference),
                    );
                    return None;
                }
            },
            None => deep_copy(item),
        };
        let kind = classify(&item);
        let JsonValue::Object(mut operations) = item else {
            self.diagnostics.push(
                DiagnosticKind::NotAnObject,
                &at,
                format!("expected a path item object, found {}, path removed", kind),
            );
            return None;
        };

        let path_parameters = operations.get("parameters").cloned();
        let path_responses = operations.get("responses").cloned();
        let methods: Vec<String> = operations
            .keys()
            .filter(|key| key.parse::<HttpMethod>().is_ok())
            .cloned()
            .collect();

        let mut dropped = Vec::new();
        for method in methods {
            let Some(slot) = operations.get_mut(&method) else {
                continue;
            };
            let operation = std::mem::take(slot);
            let walked = self.walk_operation(
                operation,
                path_parameters.as_ref(),
                path_responses.as_ref(),
                &at.child(&method),
            );
            match walked {
                Some(operation) => *slot = operation,
                None => dropped.push(method),
            }
        }
        if !dropped.is_empty() {
            operations.retain(|key, _| !dropped.contains(key));
        }
        Some(JsonValue::Object(operations))
    }

    fn walk_operation(
        &mut self,
        operation: JsonValue,
        path_parameters: Option<&JsonValue>,
        path_responses: Option<&JsonValue>,
        at: &Location,
    ) -> Option<JsonValue> {
        let kind = classify(&operation);
        let JsonValue::Object(mut operation) = operation else {
            self.diagnostics.push(
                DiagnosticKind::NotAnObject,
                at,
                format!("expected an operation object, found {}, operation removed", kind),
            );
            return None;
        };

        let parameters = first_truthy([
            operation.get("parameters"),
            path_parameters,
            self.root.get("parameters"),
        ])
        .cloned();
        let parameters = self.normalize_parameters(parameters, &at.child("parameters"));
        operation.insert(
            "parameters".to_string(),
            JsonValue::Array(parameters.into_iter().map(JsonValue::from).collect()),
        );

        let path_responses = path_responses.filter(|_| self.config.path_level_responses);
        let responses = first_truthy([
            operation.get("responses"),
            path_responses,
            self.root.get("responses"),
        ])
        .cloned();
        let responses = self.normalize_responses(responses, &at.child("responses"));
        operation.insert("responses".to_string(), JsonValue::Object(responses));

        Some(JsonValue::Object(operation))
    }

    /// Map-style parameters take their name from the key. List-style
    /// parameters carry their own.
    fn normalize_parameters(&mut self, parameters: Option<JsonValue>, at: &Location) -> Vec<Node> {
        match parameters {
            None => Vec::new(),
            Some(JsonValue::Array(list)) => {
                let mut normalizer = self.normalizer();
                list.into_iter()
                    .enumerate()
                    .filter_map(|(i, p)| normalizer.lookup(p, &at.index(i)))
                    .collect()
            }
            Some(JsonValue::Object(map)) => {
                let mut normalizer = self.normalizer();
                map.into_iter()
                    .filter_map(|(name, p)| {
                        normalizer.lookup(named_fragment(&name, p), &at.child(&name))
                    })
                    .collect()
            }
            Some(other) => {
                self.diagnostics.push(
                    DiagnosticKind::InvalidShape,
                    at,
                    format!("expected a list or mapping of parameters, found {}", classify(&other)),
                );
                Vec::new()
            }
        }
    }

    fn normalize_responses(
        &mut self,
        responses: Option<JsonValue>,
        at: &Location,
    ) -> Map<String, JsonValue> {
        let mut normalized = Map::new();
        match responses {
            None => {}
            Some(JsonValue::Object(map)) => {
                let mut normalizer = self.normalizer();
                for (name, response) in map {
                    let fragment = named_fragment(&name, response);
                    if let Some(node) = normalizer.lookup(fragment, &at.child(&name)) {
                        normalized.insert(name, node.into());
                    }
                }
            }
            Some(other) => self.diagnostics.push(
                DiagnosticKind::InvalidShape,
                at,
                format!("expected a mapping of responses, found {}", classify(&other)),
            ),
        }
        normalized
    }

    fn normalizer(&mut self) -> Normalizer<'_> {
        Normalizer::new(self.root, self.diagnostics).with_max_depth(self.config.max_depth)
    }
}
