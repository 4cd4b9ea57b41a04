//! Normalization of parameter, response and schema fragments.
//!
//! Swagger 2.0 describes the same thing in several shapes: a parameter with a
//! `schema`, a bare `$ref`, an `items` array, an `allOf` group, an object with
//! `properties` and a list of required names. [`Normalizer::lookup`] folds all
//! of them into a single [`Node`]: a type tag, an ordered list of children
//! and the descriptive fields of the source fragment.
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use swaggerfold_core::diagnostics::{Diagnostics, Location};
//! use swaggerfold_core::normalize::Normalizer;
//!
//! let root = json!({});
//! let mut diagnostics = Diagnostics::new();
//! let mut normalizer = Normalizer::new(&root, &mut diagnostics);
//!
//! let node = normalizer
//!     .lookup(json!({"type": "integer"}), &Location::root())
//!     .unwrap();
//! assert_eq!(serde_json::Value::from(node), json!({"type": "number", "format": "int64"}));
//! ```

use serde::{Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};

use crate::config::DEFAULT_MAX_DEPTH;
use crate::diagnostics::{DiagnosticKind, Diagnostics, Location};
use crate::pointer::{get_ref, NestedRef};
use crate::value::{classify, is_truthy};

/// Keys of the source shapes that a normalized node never carries.
const SHAPE_KEYS: [&str; 7] = [
    "$ref",
    "schema",
    "items",
    "allOf",
    "properties",
    "requireds",
    "children",
];

/// The uniform node every parameter, response and schema is turned into.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Member name, for parameters, responses and object properties.
    pub name: Option<String>,
    /// Set by the parent object from its list of required names, or carried
    /// over from a parameter's own boolean flag.
    pub required: Option<bool>,
    pub kind: NodeKind,
    /// Descriptive fields passed through from the source (`description`,
    /// `enum`, `in`, `default`, vendor extensions, ...).
    pub attributes: Map<String, JsonValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Scalar {
        ty: Option<String>,
        format: Option<String>,
    },
    /// Item schema for `items`, or the members of an `allOf` group.
    Array { children: Vec<Node> },
    Object { children: Vec<Node> },
    /// Back-reference left by the definition expander. Never dereferenced.
    Nested(NestedRef),
}

impl Node {
    pub fn nested(marker: NestedRef) -> Self {
        Self {
            name: None,
            required: None,
            kind: NodeKind::Nested(marker),
            attributes: Map::new(),
        }
    }

    /// The normalized `type` tag.
    pub fn type_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Scalar { ty, .. } => ty.as_deref(),
            NodeKind::Array { .. } => Some("array"),
            NodeKind::Object { .. } => Some("object"),
            NodeKind::Nested(_) => None,
        }
    }

    pub fn format(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Scalar { format, .. } => format.as_deref(),
            _ => self.attributes.get("format").and_then(JsonValue::as_str),
        }
    }

    pub fn children(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Array { children } | NodeKind::Object { children } => children,
            _ => &[],
        }
    }

    /// Find a direct child by name.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children()
            .iter()
            .find(|c| c.name.as_deref() == Some(name))
    }

    pub fn is_nested(&self) -> bool {
        matches!(self.kind, NodeKind::Nested(_))
    }

    pub fn to_value(&self) -> JsonValue {
        JsonValue::from(self.clone())
    }
}

impl From<Node> for JsonValue {
    fn from(node: Node) -> Self {
        let mut map = Map::new();
        if let NodeKind::Nested(marker) = node.kind {
            map.insert("path".to_string(), JsonValue::String(marker.path));
            map.insert("nested".to_string(), JsonValue::Bool(true));
            if let Some(required) = node.required {
                map.insert("required".to_string(), JsonValue::Bool(required));
            }
            return JsonValue::Object(map);
        }

        if let Some(name) = node.name {
            map.insert("name".to_string(), JsonValue::String(name));
        }
        map.extend(node.attributes);
        let children = match node.kind {
            NodeKind::Scalar { ty, format } => {
                if let Some(ty) = ty {
                    map.insert("type".to_string(), JsonValue::String(ty));
                }
                if let Some(format) = format {
                    map.insert("format".to_string(), JsonValue::String(format));
                }
                None
            }
            NodeKind::Array { children } => {
                map.insert("type".to_string(), JsonValue::from("array"));
                Some(children)
            }
            NodeKind::Object { children } => {
                map.insert("type".to_string(), JsonValue::from("object"));
                Some(children)
            }
            NodeKind::Nested(_) => None,
        };
        if let Some(required) = node.required {
            map.insert("required".to_string(), JsonValue::Bool(required));
        }
        if let Some(children) = children {
            let children = children.into_iter().map(JsonValue::from).collect();
            map.insert("children".to_string(), JsonValue::Array(children));
        }
        JsonValue::Object(map)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Turns fragments into [`Node`]s, resolving references against `root`.
pub struct Normalizer<'a> {
    root: &'a JsonValue,
    max_depth: usize,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> Normalizer<'a> {
    pub fn new(root: &'a JsonValue, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            root,
            max_depth: DEFAULT_MAX_DEPTH,
            diagnostics,
        }
    }

    /// Cap on schema nesting. Deeper fragments are dropped.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Normalize one fragment found at `at`.
    ///
    /// Returns `None` when the fragment is dropped: it is not an object, its
    /// reference does not resolve, or it nests too deeply. A diagnostic is
    /// recorded in each case.
    pub fn lookup(&mut self, fragment: JsonValue, at: &Location) -> Option<Node> {
        self.normalize(fragment, at, 0)
    }

    fn normalize(&mut self, fragment: JsonValue, at: &Location, depth: usize) -> Option<Node> {
        if depth > self.max_depth {
            self.diagnostics.push(
                DiagnosticKind::DepthExceeded,
                at,
                format!("schema nests deeper than {} levels", self.max_depth),
            );
            return None;
        }
        let kind = classify(&fragment);
        let JsonValue::Object(mut fragment) = fragment else {
            self.diagnostics.push(
                DiagnosticKind::NotAnObject,
                at,
                format!("expected an object, found {}", kind),
            );
            return None;
        };

        if let Some(reference) = reference_of(&fragment) {
            if let Some(marker) = NestedRef::from_value(&reference) {
                return Some(Node::nested(marker));
            }
            let Some(target) = get_ref(self.root, Some(&reference)) else {
                self.diagnostics.push(
                    DiagnosticKind::UnresolvedReference,
                    at,
                    format!("unknown $ref {}", describe(&reference)),
                );
                return None;
            };
            let target_kind = classify(&target);
            let JsonValue::Object(target) = target else {
                self.diagnostics.push(
                    DiagnosticKind::NotAnObject,
                    at,
                    format!("$ref {} points at a {}", describe(&reference), target_kind),
                );
                return None;
            };
            fragment.remove("$ref");
            let mut schema = match fragment.remove("schema") {
                Some(JsonValue::Object(schema)) => schema,
                _ => Map::new(),
            };
            schema.remove("$ref");
            schema.extend(target);
            fragment.insert("schema".to_string(), JsonValue::Object(schema));
        }

        if let Some(schema) = fragment.remove("schema") {
            match schema {
                JsonValue::Object(mut schema) => {
                    rename_required_list(&mut schema);
                    fragment.extend(schema);
                }
                other => self.diagnostics.push(
                    DiagnosticKind::InvalidShape,
                    at.child("schema"),
                    format!("expected an object, found {}", classify(&other)),
                ),
            }
        }
        rename_required_list(&mut fragment);

        // A resolved target may itself be a reference, e.g. `A: {$ref: B}`.
        if fragment.get("$ref").is_some_and(is_truthy) {
            return self.normalize(JsonValue::Object(fragment), at, depth + 1);
        }

        Some(self.unify(fragment, at, depth))
    }

    /// Fold the shape keys into a type tag and children. `items` wins over
    /// `allOf`, which wins over `properties`.
    fn unify(&mut self, mut fragment: Map<String, JsonValue>, at: &Location, depth: usize) -> Node {
        let requireds = take_requireds(&mut fragment);
        let items = fragment.remove("items");
        let all_of = fragment.remove("allOf");
        let properties = fragment.remove("properties");
        let previous = fragment.remove("children");
        for key in SHAPE_KEYS {
            fragment.remove(key);
        }

        let name = take_string(&mut fragment, "name");
        let required = take_bool(&mut fragment, "required");
        let ty = take_string(&mut fragment, "type");

        let kind = if let Some(items) = items {
            let children = self
                .normalize(items, &at.child("items"), depth + 1)
                .into_iter()
                .collect();
            NodeKind::Array { children }
        } else if let Some(all_of) = all_of {
            NodeKind::Array {
                children: self.normalize_each(all_of, &at.child("allOf"), depth),
            }
        } else if let Some(properties) = properties {
            NodeKind::Object {
                children: self.normalize_properties(
                    properties,
                    &requireds,
                    &at.child("properties"),
                    depth,
                ),
            }
        } else {
            match ty.as_deref() {
                Some("array") => NodeKind::Array {
                    children: self.renormalize(previous, at, depth),
                },
                Some("object") => NodeKind::Object {
                    children: self.renormalize(previous, at, depth),
                },
                Some("integer") => NodeKind::Scalar {
                    ty: Some("number".to_string()),
                    format: Some(
                        take_string(&mut fragment, "format")
                            .filter(|f| !f.is_empty())
                            .unwrap_or_else(|| "int64".to_string()),
                    ),
                },
                _ => NodeKind::Scalar {
                    ty,
                    format: take_string(&mut fragment, "format"),
                },
            }
        };

        Node {
            name,
            required,
            kind,
            attributes: fragment,
        }
    }

    fn normalize_each(&mut self, members: JsonValue, at: &Location, depth: usize) -> Vec<Node> {
        let found = classify(&members);
        let JsonValue::Array(members) = members else {
            self.diagnostics.push(
                DiagnosticKind::InvalidShape,
                at,
                format!("expected an array, found {}", found),
            );
            return Vec::new();
        };
        members
            .into_iter()
            .enumerate()
            .filter_map(|(i, member)| self.normalize(member, &at.index(i), depth + 1))
            .collect()
    }

    fn normalize_properties(
        &mut self,
        properties: JsonValue,
        requireds: &[String],
        at: &Location,
        depth: usize,
    ) -> Vec<Node> {
        let found = classify(&properties);
        let JsonValue::Object(properties) = properties else {
            self.diagnostics.push(
                DiagnosticKind::InvalidShape,
                at,
                format!("expected an object, found {}", found),
            );
            return Vec::new();
        };

        let mut children = Vec::with_capacity(properties.len());
        for (name, definition) in properties {
            let fragment = named_fragment(&name, definition);
            if let Some(mut child) = self.normalize(fragment, &at.child(&name), depth + 1) {
                child.required = Some(requireds.contains(&name));
                children.push(child);
            }
        }
        children
    }

    /// Children left by an earlier normalization pass are normalized again.
    fn renormalize(&mut self, previous: Option<JsonValue>, at: &Location, depth: usize) -> Vec<Node> {
        match previous {
            Some(previous @ JsonValue::Array(_)) => {
                self.normalize_each(previous, &at.child("children"), depth)
            }
            _ => Vec::new(),
        }
    }
}

/// `{ name, ...fragment }`. Fields of the fragment win over the given name,
/// and non-object fragments pass through for the normalizer to reject.
pub(crate) fn named_fragment(name: &str, fragment: JsonValue) -> JsonValue {
    match fragment {
        JsonValue::Object(body) => {
            let mut named = Map::new();
            named.insert("name".to_string(), JsonValue::String(name.to_string()));
            named.extend(body);
            JsonValue::Object(named)
        }
        other => other,
    }
}

/// The reference to follow: `schema.$ref` when a schema is present,
/// otherwise the fragment's own `$ref`.
fn reference_of(fragment: &Map<String, JsonValue>) -> Option<JsonValue> {
    let reference = match fragment.get("schema") {
        Some(schema) if is_truthy(schema) => schema.get("$ref"),
        _ => fragment.get("$ref"),
    }?;
    is_truthy(reference).then(|| reference.clone())
}

fn describe(reference: &JsonValue) -> String {
    match reference.as_str() {
        Some(pointer) => pointer.to_string(),
        None => reference.to_string(),
    }
}

/// Move a list-valued `required` to `requireds`, leaving `required` free for
/// the per-node boolean.
fn rename_required_list(map: &mut Map<String, JsonValue>) {
    if matches!(map.get("required"), Some(JsonValue::Array(_))) {
        if let Some(list) = map.remove("required") {
            map.insert("requireds".to_string(), list);
        }
    }
}

fn take_requireds(map: &mut Map<String, JsonValue>) -> Vec<String> {
    match map.remove("requireds") {
        Some(JsonValue::Array(names)) => names
            .into_iter()
            .filter_map(|n| match n {
                JsonValue::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn take_string(map: &mut Map<String, JsonValue>, key: &str) -> Option<String> {
    if !matches!(map.get(key), Some(JsonValue::String(_))) {
        return None;
    }
    match map.remove(key) {
        Some(JsonValue::String(s)) => Some(s),
        _ => None,
    }
}

fn take_bool(map: &mut Map<String, JsonValue>, key: &str) -> Option<bool> {
    let value = map.get(key)?.as_bool()?;
    map.remove(key);
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize_with(root: &JsonValue, fragment: JsonValue) -> (Option<Node>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let node = Normalizer::new(root, &mut diagnostics).lookup(fragment, &Location::root());
        (node, diagnostics)
    }

    fn normalize(fragment: JsonValue) -> Node {
        normalize_with(&json!({}), fragment).0.unwrap()
    }

    #[test]
    fn test_integer_defaults_to_int64() {
        let node = normalize(json!({"type": "integer"}));
        assert_eq!(node.type_name(), Some("number"));
        assert_eq!(node.format(), Some("int64"));
        assert_eq!(JsonValue::from(node), json!({"type": "number", "format": "int64"}));
    }

    #[test]
    fn test_integer_keeps_given_format() {
        let node = normalize(json!({"type": "integer", "format": "int32"}));
        assert_eq!(node.to_value(), json!({"type": "number", "format": "int32"}));
    }

    #[test]
    fn test_required_stamping() {
        let node = normalize(json!({
            "type": "object",
            "properties": {
                "id": {"type": "string"},
                "name": {"type": "string"}
            },
            "required": ["id"]
        }));
        assert_eq!(node.type_name(), Some("object"));
        assert_eq!(node.child("id").unwrap().required, Some(true));
        assert_eq!(node.child("name").unwrap().required, Some(false));
        assert_eq!(
            node.to_value(),
            json!({
                "type": "object",
                "children": [
                    {"name": "id", "type": "string", "required": true},
                    {"name": "name", "type": "string", "required": false}
                ]
            })
        );
    }

    #[test]
    fn test_schema_is_hoisted_and_required_list_renamed() {
        let node = normalize(json!({
            "name": "body",
            "in": "body",
            "required": true,
            "schema": {
                "type": "object",
                "required": ["tag"],
                "properties": {"tag": {"type": "string"}}
            }
        }));
        assert_eq!(node.name.as_deref(), Some("body"));
        assert_eq!(node.required, Some(true));
        assert_eq!(node.attributes.get("in"), Some(&json!("body")));
        assert_eq!(node.child("tag").unwrap().required, Some(true));
        let value = node.to_value();
        assert!(value.get("schema").is_none());
        assert!(value.get("requireds").is_none());
    }

    #[test]
    fn test_items_becomes_single_child() {
        let node = normalize(json!({
            "type": "array",
            "description": "tags",
            "items": {"type": "integer", "format": "int32"}
        }));
        assert_eq!(
            node.to_value(),
            json!({
                "description": "tags",
                "type": "array",
                "children": [{"type": "number", "format": "int32"}]
            })
        );
    }

    #[test]
    fn test_all_of_becomes_array_group() {
        let root = json!({"definitions": {"Base": {"type": "object", "properties": {}}}});
        let (node, diagnostics) = normalize_with(
            &root,
            json!({"allOf": [{"$ref": "#/definitions/Base"}, {"type": "string"}, 7]}),
        );
        let node = node.unwrap();
        assert_eq!(node.type_name(), Some("array"));
        assert_eq!(node.children().len(), 2);
        assert_eq!(node.children()[0].type_name(), Some("object"));
        assert_eq!(diagnostics.count(DiagnosticKind::NotAnObject), 1);
    }

    #[test]
    fn test_items_takes_precedence_over_properties() {
        let node = normalize(json!({
            "items": {"type": "string"},
            "properties": {"a": {"type": "string"}}
        }));
        assert_eq!(node.type_name(), Some("array"));
        assert_eq!(node.children().len(), 1);
        assert!(node.attributes.get("properties").is_none());
    }

    #[test]
    fn test_bare_object_and_empty_properties_get_children() {
        let bare = normalize(json!({"type": "object"}));
        assert_eq!(bare.to_value(), json!({"type": "object", "children": []}));
        let empty = normalize(json!({"properties": {}}));
        assert_eq!(empty.to_value(), json!({"type": "object", "children": []}));
        let array = normalize(json!({"type": "array"}));
        assert_eq!(array.to_value(), json!({"type": "array", "children": []}));
    }

    #[test]
    fn test_reference_is_resolved_into_schema() {
        let root = json!({
            "definitions": {
                "Pet": {
                    "type": "object",
                    "required": ["id"],
                    "properties": {"id": {"type": "integer"}}
                }
            }
        });
        let (node, diagnostics) = normalize_with(
            &root,
            json!({"name": "pet", "in": "body", "schema": {"$ref": "#/definitions/Pet"}}),
        );
        let node = node.unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(node.name.as_deref(), Some("pet"));
        assert_eq!(
            node.child("id").unwrap().to_value(),
            json!({"name": "id", "type": "number", "format": "int64", "required": true})
        );
        // The source document is untouched.
        assert_eq!(root["definitions"]["Pet"]["required"], json!(["id"]));
    }

    #[test]
    fn test_inlined_reference_chain_is_followed() {
        // What the definition expander produces for `A: {$ref: B}`.
        let root = json!({"definitions": {"A": {"$ref": {"type": "string", "format": "uuid"}}}});
        let (node, _) = normalize_with(&root, json!({"name": "id", "$ref": "#/definitions/A"}));
        assert_eq!(
            node.unwrap().to_value(),
            json!({"name": "id", "type": "string", "format": "uuid"})
        );
    }

    #[test]
    fn test_nested_marker_is_returned_unchanged() {
        let root = json!({
            "definitions": {
                "Node": {
                    "type": "object",
                    "properties": {
                        "children": {
                            "type": "array",
                            "items": {"$ref": {"path": "#/definitions/Node", "nested": true}}
                        }
                    }
                }
            }
        });
        let (node, diagnostics) = normalize_with(&root, json!({"$ref": "#/definitions/Node"}));
        let node = node.unwrap();
        assert!(diagnostics.is_empty());
        let children = node.child("children").unwrap();
        assert_eq!(children.type_name(), Some("array"));
        assert!(children.children()[0].is_nested());
        assert_eq!(
            children.children()[0].to_value(),
            json!({"path": "#/definitions/Node", "nested": true})
        );
    }

    #[test]
    fn test_dangling_reference_drops_fragment() {
        let (node, diagnostics) = normalize_with(
            &json!({"definitions": {}}),
            json!({"name": "x", "schema": {"$ref": "#/definitions/DoesNotExist"}}),
        );
        assert!(node.is_none());
        assert_eq!(diagnostics.count(DiagnosticKind::UnresolvedReference), 1);
    }

    #[test]
    fn test_non_object_fragment_is_dropped() {
        let (node, diagnostics) = normalize_with(&json!({}), json!("string"));
        assert!(node.is_none());
        assert_eq!(diagnostics.as_slice()[0].message, "expected an object, found string");
    }

    #[test]
    fn test_requireds_never_survive() {
        let node = normalize(json!({"type": "string", "required": ["a"]}));
        assert_eq!(node.to_value(), json!({"type": "string"}));
    }

    #[test]
    fn test_self_referencing_pointer_hits_depth_cap() {
        let root = json!({"parameters": {"loop": {"$ref": "#/parameters/loop"}}});
        let mut diagnostics = Diagnostics::new();
        let node = Normalizer::new(&root, &mut diagnostics)
            .with_max_depth(8)
            .lookup(json!({"$ref": "#/parameters/loop"}), &Location::root());
        assert!(node.is_none());
        assert_eq!(diagnostics.count(DiagnosticKind::DepthExceeded), 1);
    }

    #[test]
    fn test_normalizing_output_again_is_stable() {
        let first = normalize(json!({
            "type": "object",
            "required": ["id"],
            "properties": {
                "id": {"type": "integer"},
                "tags": {"type": "array", "items": {"type": "string"}}
            }
        }))
        .to_value();
        let second = normalize(first.clone()).to_value();
        assert_eq!(first, second);
    }
}
