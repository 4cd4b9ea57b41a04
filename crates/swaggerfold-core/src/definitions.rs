//! Cycle-safe expansion of the `definitions` section.
//!
//! Each definition gets a slot in a table keyed by name. Expanding a
//! definition inlines every `#/definitions/<name>` reference found in its body,
//! recursively. A reference back to a definition that is already being
//! expanded on the current path becomes a [`NestedRef`] marker instead. Each
//! name therefore appears at most once per path, and recursion depth is bounded
//! by the number of definitions.
//!
//! Inlined references keep their `$ref` key: the pointer string is replaced by
//! the expanded node (or by the marker), and the normalizer picks it up from
//! there.

use std::collections::HashMap;

use serde_json::{Map, Value as JsonValue};

use crate::diagnostics::{DiagnosticKind, Diagnostics, Location};
use crate::pointer::{NestedRef, Pointer};
use crate::value::deep_copy;

/// Definitions indexed by name, plus the per-path expansion state.
pub struct DefinitionTable<'a> {
    names: Vec<&'a str>,
    bodies: Vec<&'a JsonValue>,
    slots: HashMap<&'a str, usize>,
    /// Slots currently being expanded on the active path.
    on_path: Vec<bool>,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> DefinitionTable<'a> {
    pub fn new(definitions: &'a Map<String, JsonValue>, diagnostics: &'a mut Diagnostics) -> Self {
        let mut names = Vec::with_capacity(definitions.len());
        let mut bodies = Vec::with_capacity(definitions.len());
        let mut slots = HashMap::with_capacity(definitions.len());
        for (slot, (name, body)) in definitions.iter().enumerate() {
            names.push(name.as_str());
            bodies.push(body);
            slots.insert(name.as_str(), slot);
        }
        Self {
            on_path: vec![false; names.len()],
            names,
            bodies,
            slots,
            diagnostics,
        }
    }

    /// Expand every definition. Names whose expansion fails are left out.
    pub fn expand_all(&mut self) -> Map<String, JsonValue> {
        let mut expanded = Map::new();
        for slot in 0..self.names.len() {
            if let Some(body) = self.expand_slot(slot) {
                expanded.insert(self.names[slot].to_string(), body);
            }
        }
        expanded
    }

    /// Expand a single definition by name.
    pub fn expand(&mut self, name: &str) -> Option<JsonValue> {
        match self.slots.get(name) {
            Some(&slot) => self.expand_slot(slot),
            None => {
                self.diagnostics.push(
                    DiagnosticKind::DefinitionDropped,
                    Location::root().child("definitions").child(name),
                    format!("no definition named '{}'", name),
                );
                None
            }
        }
    }

    fn expand_slot(&mut self, slot: usize) -> Option<JsonValue> {
        let body = self.bodies[slot];
        let at = Location::root().child("definitions").child(self.names[slot]);
        if body.is_null() {
            self.diagnostics.push(
                DiagnosticKind::DefinitionDropped,
                &at,
                "definition is null",
            );
            return None;
        }

        log::trace!("expanding {}", at);
        // The mark only lives for this call, so sibling branches never see it.
        self.on_path[slot] = true;
        let mut expanded = deep_copy(body);
        self.inline_refs(&mut expanded, &at);
        self.on_path[slot] = false;
        Some(expanded)
    }

    fn inline_refs(&mut self, node: &mut JsonValue, at: &Location) {
        match node {
            JsonValue::Object(map) => {
                let target = map
                    .get("$ref")
                    .and_then(JsonValue::as_str)
                    .and_then(Pointer::parse)
                    .filter(Pointer::is_definition);
                if let Some(pointer) = target {
                    self.substitute(map, &pointer, at);
                }
                for (key, child) in map.iter_mut() {
                    if key != "$ref" {
                        self.inline_refs(child, &at.child(key));
                    }
                }
            }
            JsonValue::Array(items) => {
                for (i, child) in items.iter_mut().enumerate() {
                    self.inline_refs(child, &at.index(i));
                }
            }
            _ => {}
        }
    }

    fn substitute(&mut self, map: &mut Map<String, JsonValue>, pointer: &Pointer, at: &Location) {
        let slot = self.slots.get(pointer.name()).copied();
        match slot {
            Some(slot) if self.on_path[slot] => {
                map.insert("$ref".to_string(), NestedRef::new(pointer).to_value());
            }
            Some(slot) => match self.expand_slot(slot) {
                Some(expanded) => {
                    map.insert("$ref".to_string(), expanded);
                }
                None => {
                    map.remove("$ref");
                }
            },
            None => {
                self.diagnostics.push(
                    DiagnosticKind::UnresolvedReference,
                    at,
                    format!("unknown $ref {}, reference removed", pointer),
                );
                map.remove("$ref");
            }
        }
    }
}

/// Expand a whole `definitions` mapping.
pub fn expand_definitions(
    definitions: &Map<String, JsonValue>,
    diagnostics: &mut Diagnostics,
) -> Map<String, JsonValue> {
    DefinitionTable::new(definitions, diagnostics).expand_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn definitions(value: JsonValue) -> Map<String, JsonValue> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_plain_reference_is_inlined() {
        let defs = definitions(json!({
            "Tag": {"type": "object", "properties": {"label": {"type": "string"}}},
            "Pet": {"type": "object", "properties": {"tag": {"$ref": "#/definitions/Tag"}}}
        }));
        let mut diagnostics = Diagnostics::new();
        let expanded = expand_definitions(&defs, &mut diagnostics);
        assert_eq!(
            expanded["Pet"]["properties"]["tag"]["$ref"],
            json!({"type": "object", "properties": {"label": {"type": "string"}}})
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_mutual_cycle_terminates_with_marker() {
        let defs = definitions(json!({
            "A": {"$ref": "#/definitions/B"},
            "B": {"$ref": "#/definitions/A"}
        }));
        let mut diagnostics = Diagnostics::new();
        let expanded = expand_definitions(&defs, &mut diagnostics);
        assert_eq!(
            expanded["A"],
            json!({"$ref": {"$ref": {"path": "#/definitions/A", "nested": true}}})
        );
        assert_eq!(
            expanded["B"],
            json!({"$ref": {"$ref": {"path": "#/definitions/B", "nested": true}}})
        );
    }

    #[test]
    fn test_self_reference_expands_once() {
        let defs = definitions(json!({
            "Node": {
                "type": "object",
                "properties": {
                    "children": {"type": "array", "items": {"$ref": "#/definitions/Node"}}
                }
            }
        }));
        let mut diagnostics = Diagnostics::new();
        let expanded = expand_definitions(&defs, &mut diagnostics);
        assert_eq!(
            expanded["Node"]["properties"]["children"]["items"]["$ref"],
            json!({"path": "#/definitions/Node", "nested": true})
        );
    }

    #[test]
    fn test_visited_set_is_path_local() {
        // Both siblings reference Leaf. The second must be expanded, not marked.
        let defs = definitions(json!({
            "Leaf": {"type": "string"},
            "Pair": {
                "properties": {
                    "left": {"$ref": "#/definitions/Leaf"},
                    "right": {"$ref": "#/definitions/Leaf"}
                }
            }
        }));
        let mut diagnostics = Diagnostics::new();
        let expanded = expand_definitions(&defs, &mut diagnostics);
        let props = &expanded["Pair"]["properties"];
        assert_eq!(props["left"]["$ref"], json!({"type": "string"}));
        assert_eq!(props["right"]["$ref"], json!({"type": "string"}));
    }

    #[test]
    fn test_dangling_reference_is_removed() {
        let defs = definitions(json!({
            "Pet": {"properties": {"owner": {"$ref": "#/definitions/Person", "description": "x"}}},
            "Empty": null
        }));
        let mut diagnostics = Diagnostics::new();
        let expanded = expand_definitions(&defs, &mut diagnostics);
        assert_eq!(expanded["Pet"]["properties"]["owner"], json!({"description": "x"}));
        assert!(!expanded.contains_key("Empty"));
        assert_eq!(diagnostics.count(DiagnosticKind::UnresolvedReference), 1);
        assert_eq!(diagnostics.count(DiagnosticKind::DefinitionDropped), 1);
        assert_eq!(
            diagnostics.as_slice()[0].location,
            "/definitions/Pet/properties/owner"
        );
    }

    #[test]
    fn test_other_sections_and_deep_pointers_are_left_alone() {
        let defs = definitions(json!({
            "Pet": {
                "properties": {
                    "id": {"$ref": "#/definitions/Id/properties/value"},
                    "limit": {"$ref": "#/parameters/limit"}
                }
            },
            "Id": {"properties": {"value": {"type": "string"}}}
        }));
        let mut diagnostics = Diagnostics::new();
        let expanded = expand_definitions(&defs, &mut diagnostics);
        assert_eq!(
            expanded["Pet"]["properties"]["id"]["$ref"],
            "#/definitions/Id/properties/value"
        );
        assert_eq!(expanded["Pet"]["properties"]["limit"]["$ref"], "#/parameters/limit");
    }

    #[test]
    fn test_expand_single_name() {
        let defs = definitions(json!({"Id": {"type": "integer"}}));
        let mut diagnostics = Diagnostics::new();
        let mut table = DefinitionTable::new(&defs, &mut diagnostics);
        assert_eq!(table.expand("Id"), Some(json!({"type": "integer"})));
        assert_eq!(table.expand("Missing"), None);
        drop(table);
        assert_eq!(diagnostics.count(DiagnosticKind::DefinitionDropped), 1);
    }
}
