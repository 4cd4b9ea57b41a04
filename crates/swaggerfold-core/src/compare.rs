//! Structural comparison of resolved documents.
//!
//! Object fields are compared without regard to order. Sequences are compared
//! position by position.

use std::fmt;

use serde_json::Value as JsonValue;

use crate::diagnostics::Location;

/// How a location differs between the two documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DifferenceKind {
    /// Present on the left only.
    OnlyLeft,
    /// Present on the right only.
    OnlyRight,
    /// Present on both sides with different values.
    Changed,
}

/// A single difference between two documents.
#[derive(Debug, Clone, PartialEq)]
pub struct Difference {
    /// JSON Pointer to the differing node.
    pub pointer: String,
    pub kind: DifferenceKind,
    pub left: Option<JsonValue>,
    pub right: Option<JsonValue>,
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pointer: &str = if self.pointer.is_empty() { "/" } else { &self.pointer };
        match (&self.kind, &self.left, &self.right) {
            (DifferenceKind::OnlyLeft, Some(left), _) => write!(f, "- {}: {}", pointer, left),
            (DifferenceKind::OnlyRight, _, Some(right)) => write!(f, "+ {}: {}", pointer, right),
            (_, Some(left), Some(right)) => write!(f, "~ {}: {} -> {}", pointer, left, right),
            _ => write!(f, "? {}", pointer),
        }
    }
}

/// Whether two documents are structurally equal.
pub fn structurally_equal(left: &JsonValue, right: &JsonValue) -> bool {
    // serde_json compares object fields by key, so order never matters here.
    left == right
}

/// Every location at which `left` and `right` differ, in document order.
pub fn differences(left: &JsonValue, right: &JsonValue) -> Vec<Difference> {
    let mut found = Vec::new();
    walk(left, right, &Location::root(), &mut found);
    found
}

fn walk(left: &JsonValue, right: &JsonValue, at: &Location, found: &mut Vec<Difference>) {
    match (left, right) {
        (JsonValue::Object(l), JsonValue::Object(r)) => {
            for (key, lv) in l {
                match r.get(key) {
                    Some(rv) => walk(lv, rv, &at.child(key), found),
                    None => found.push(only_left(&at.child(key), lv)),
                }
            }
            for (key, rv) in r {
                if !l.contains_key(key) {
                    found.push(only_right(&at.child(key), rv));
                }
            }
        }
        (JsonValue::Array(l), JsonValue::Array(r)) => {
            for (i, (lv, rv)) in l.iter().zip(r).enumerate() {
                walk(lv, rv, &at.index(i), found);
            }
            for (i, lv) in l.iter().enumerate().skip(r.len()) {
                found.push(only_left(&at.index(i), lv));
            }
            for (i, rv) in r.iter().enumerate().skip(l.len()) {
                found.push(only_right(&at.index(i), rv));
            }
        }
        _ if left == right => {}
        _ => found.push(Difference {
            pointer: at.as_str().to_string(),
            kind: DifferenceKind::Changed,
            left: Some(left.clone()),
            right: Some(right.clone()),
        }),
    }
}

fn only_left(at: &Location, value: &JsonValue) -> Difference {
    Difference {
        pointer: at.as_str().to_string(),
        kind: DifferenceKind::OnlyLeft,
        left: Some(value.clone()),
        right: None,
    }
}

fn only_right(at: &Location, value: &JsonValue) -> Difference {
    Difference {
        pointer: at.as_str().to_string(),
        kind: DifferenceKind::OnlyRight,
        left: None,
        right: Some(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_order_is_ignored() {
        let a = json!({"swagger": "2.0", "paths": {"/a": {}, "/b": {}}});
        let b = json!({"paths": {"/b": {}, "/a": {}}, "swagger": "2.0"});
        assert!(structurally_equal(&a, &b));
        assert!(differences(&a, &b).is_empty());
    }

    #[test]
    fn test_sequence_order_matters() {
        let a = json!({"parameters": [{"name": "a"}, {"name": "b"}]});
        let b = json!({"parameters": [{"name": "b"}, {"name": "a"}]});
        assert!(!structurally_equal(&a, &b));
        let found = differences(&a, &b);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].pointer, "/parameters/0/name");
        assert_eq!(found[0].kind, DifferenceKind::Changed);
    }

    #[test]
    fn test_missing_and_extra_fields() {
        let a = json!({"paths": {"/pets": {"get": {}}}, "x-left": 1});
        let b = json!({"paths": {"/pets": {"get": {}, "post": {}}}});
        let found = differences(&a, &b);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].kind, DifferenceKind::OnlyRight);
        assert_eq!(found[0].pointer, "/paths/~1pets/post");
        assert_eq!(found[0].to_string(), "+ /paths/~1pets/post: {}");
        assert_eq!(found[1].kind, DifferenceKind::OnlyLeft);
        assert_eq!(found[1].pointer, "/x-left");
    }

    #[test]
    fn test_longer_sequence_reports_tail() {
        let found = differences(&json!([1, 2, 3]), &json!([1]));
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].pointer, "/1");
        assert_eq!(found[1].to_string(), "- /2: 3");
    }
}
