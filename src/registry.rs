//! Type registry: schema name and type URI to static schema table.
//!
//! Built once at start-up (see [`crate::schemas::registry`]) and shared by
//! every session through an `Arc`.

use std::collections::HashMap;

use crate::model::document::types_of;
use crate::model::{Document, Schema};
use crate::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct Registry {
    by_name: HashMap<&'static str, &'static Schema>,
    by_uri: HashMap<&'static str, &'static Schema>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema. A later schema with the same name or type URI
    /// replaces the earlier one.
    pub fn register(&mut self, schema: &'static Schema) -> &mut Self {
        if let Some(previous) = self.by_name.insert(schema.name, schema) {
            if previous.type_uri != schema.type_uri {
                self.by_uri.remove(previous.type_uri);
            }
            tracing::debug!(name = schema.name, "replacing registered schema");
        }
        self.by_uri.insert(schema.type_uri, schema);
        self
    }

    pub fn with(mut self, schema: &'static Schema) -> Self {
        self.register(schema);
        self
    }

    pub fn get(&self, name: &str) -> Option<&'static Schema> {
        self.by_name.get(name).copied()
    }

    pub fn by_type_uri(&self, uri: &str) -> Option<&'static Schema> {
        self.by_uri.get(uri).copied()
    }

    /// Like [`get`](Self::get), failing with [`Error::UnknownType`].
    pub fn require(&self, name: &str) -> Result<&'static Schema> {
        self.get(name).ok_or_else(|| Error::UnknownType(name.to_owned()))
    }

    /// The first registered node (non-embedded) schema named by the
    /// document's `@type`.
    pub fn schema_for(&self, doc: &Document) -> Result<&'static Schema> {
        let types = types_of(doc);
        types
            .iter()
            .filter_map(|t| self.by_type_uri(t))
            .find(|s| !s.is_embedded())
            .ok_or_else(|| Error::UnknownType(types.join(", ")))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn schemas(&self) -> impl Iterator<Item = &'static Schema> + '_ {
        self.by_name.values().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SchemaKind;
    use serde_json::json;

    static A: Schema = Schema {
        name: "A",
        type_uri: "https://example.org/A",
        kind: SchemaKind::Entity,
        default_space: "common",
        properties: &[],
        reverse_properties: &[],
        existence_key: &[],
    };

    static INLINE: Schema = Schema {
        name: "Inline",
        type_uri: "https://example.org/Inline",
        kind: SchemaKind::Embedded,
        default_space: "",
        properties: &[],
        reverse_properties: &[],
        existence_key: &[],
    };

    #[test]
    fn test_lookup_by_name_and_uri() {
        let registry = Registry::new().with(&A).with(&INLINE);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("A"), Some(&A));
        assert_eq!(registry.by_type_uri("https://example.org/Inline"), Some(&INLINE));
        assert!(matches!(registry.require("B"), Err(Error::UnknownType(_))));
    }

    #[test]
    fn test_schema_for_document_skips_embedded() {
        let registry = Registry::new().with(&A).with(&INLINE);
        let doc = json!({"@type": ["https://example.org/Inline", "https://example.org/A"]});
        let schema = registry.schema_for(doc.as_object().unwrap()).unwrap();
        assert_eq!(schema.name, "A");

        let unknown = json!({"@type": "https://example.org/Z"});
        assert!(registry.schema_for(unknown.as_object().unwrap()).is_err());
    }
}
