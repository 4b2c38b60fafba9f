//! JSON-LD documents as exchanged with the transport.

use serde_json::Value as JsonValue;

use super::NodeId;

/// A JSON-LD node document.
pub type Document = serde_json::Map<String, JsonValue>;

pub const ID_KEY: &str = "@id";
pub const TYPE_KEY: &str = "@type";
/// Key under which the service reports the space a node lives in.
pub const SPACE_KEY: &str = "https://core.kg.ebrains.eu/vocab/meta/space";

/// `@id` of a document or reference object.
pub fn id_of(doc: &Document) -> Option<NodeId> {
    doc.get(ID_KEY).and_then(JsonValue::as_str).map(NodeId::from)
}

/// All `@type` URIs of a document. Accepts a string or an array of strings.
pub fn types_of(doc: &Document) -> Vec<&str> {
    match doc.get(TYPE_KEY) {
        Some(JsonValue::String(t)) => vec![t.as_str()],
        Some(JsonValue::Array(items)) => items.iter().filter_map(JsonValue::as_str).collect(),
        _ => Vec::new(),
    }
}

pub fn space_of(doc: &Document) -> Option<&str> {
    doc.get(SPACE_KEY).and_then(JsonValue::as_str)
}

/// `{"@id": .., "@type": ..}` reference object.
pub fn reference(id: &NodeId, type_uri: &str) -> JsonValue {
    let mut obj = Document::new();
    obj.insert(ID_KEY.into(), JsonValue::String(id.0.clone()));
    obj.insert(TYPE_KEY.into(), JsonValue::String(type_uri.to_owned()));
    JsonValue::Object(obj)
}

/// Whether a wire value is a node reference rather than an inline document.
pub fn is_reference(value: &JsonValue) -> bool {
    value.as_object().is_some_and(|o| o.contains_key(ID_KEY))
}

/// Structural match used by filters: `actual` satisfies `expected` when
///
/// - references compare by `@id` only,
/// - an array satisfies a scalar if any element does,
/// - an array satisfies an array if every expected element is present,
/// - anything else compares by equality.
pub fn json_matches(actual: &JsonValue, expected: &JsonValue) -> bool {
    match (actual, expected) {
        (JsonValue::Array(items), JsonValue::Array(wanted)) => {
            wanted.iter().all(|w| items.iter().any(|i| json_matches(i, w)))
        }
        (JsonValue::Array(items), e) => items.iter().any(|i| json_matches(i, e)),
        (JsonValue::Object(a), JsonValue::Object(e)) if e.contains_key(ID_KEY) => {
            a.get(ID_KEY) == e.get(ID_KEY)
        }
        (a, e) => a == e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: JsonValue) -> Document {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_types_string_or_array() {
        assert_eq!(types_of(&doc(json!({"@type": "a"}))), vec!["a"]);
        assert_eq!(types_of(&doc(json!({"@type": ["a", "b"]}))), vec!["a", "b"]);
        assert!(types_of(&doc(json!({}))).is_empty());
    }

    #[test]
    fn test_reference_matches_by_id() {
        let actual = json!({"@id": "x", "@type": "T", "extra": 1});
        assert!(json_matches(&actual, &json!({"@id": "x"})));
        assert!(!json_matches(&actual, &json!({"@id": "y"})));
    }

    #[test]
    fn test_array_matches() {
        let actual = json!([{"@id": "a"}, {"@id": "b"}]);
        assert!(json_matches(&actual, &json!({"@id": "b"})));
        assert!(json_matches(&actual, &json!([{"@id": "b"}, {"@id": "a"}])));
        assert!(!json_matches(&actual, &json!([{"@id": "c"}])));
        assert!(json_matches(&json!("Ada"), &json!("Ada")));
        assert!(!json_matches(&json!("Ada"), &json!("ada")));
    }
}
