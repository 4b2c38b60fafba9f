//! Embedded values: identifier-less property bundles inlined into an owner.

use serde_json::Value as JsonValue;

use super::codec;
use super::document::TYPE_KEY;
use super::validation::validate;
use super::{Descriptor, Document, PropertyMap, Schema, Value};
use crate::config::ValidationPolicy;
use crate::registry::Registry;
use crate::{Error, Result};

/// A value object with no identity of its own.
///
/// Owned by value: it lives and dies with the property map that holds it,
/// is never cached and is never the target of a proxy.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedValue {
    schema: &'static Schema,
    properties: PropertyMap,
}

impl EmbeddedValue {
    pub fn new(schema: &'static Schema) -> Self {
        Self { schema, properties: PropertyMap::new() }
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub(crate) fn properties_mut(&mut self) -> &mut PropertyMap {
        &mut self.properties
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Set a property by name.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let d = self.schema.descriptor(name).ok_or_else(|| Error::UnknownProperty {
            type_name: self.schema.name.to_owned(),
            property: name.to_owned(),
        })?;
        self.put(d, value);
        Ok(())
    }

    /// Set a property through its descriptor. Multiple-valued properties are
    /// always stored as lists; an empty list removes the property.
    pub fn put(&mut self, d: &Descriptor, value: impl Into<Value>) {
        super::entity::store(&mut self.properties, d, value.into());
    }

    pub fn with(mut self, d: &Descriptor, value: impl Into<Value>) -> Self {
        self.put(d, value);
        self
    }

    pub fn validate(&self) -> Vec<super::ValidationIssue> {
        validate(self.schema, &self.properties)
    }

    /// Parse an inline document as an embedded value of `schema`.
    pub fn from_document(
        schema: &'static Schema,
        doc: &Document,
        registry: &Registry,
        policy: &ValidationPolicy,
    ) -> Result<Self> {
        if !schema.is_embedded() {
            return Err(Error::InvalidDocument(format!("{} is not an embedded type", schema.name)));
        }
        Self::decode(schema, doc, registry, policy)
    }

    pub(crate) fn decode(
        schema: &'static Schema,
        doc: &Document,
        registry: &Registry,
        policy: &ValidationPolicy,
    ) -> Result<Self> {
        let mut issues = Vec::new();
        let properties = codec::decode_properties(schema, doc, registry, policy, &mut issues)?;
        issues.extend(validate(schema, &properties));
        policy.check(schema.name, issues)?;
        Ok(Self { schema, properties })
    }

    /// Serialize inline: `@type` plus properties, no `@id`.
    pub fn to_document(&self, policy: &ValidationPolicy) -> Result<Document> {
        policy.check(self.schema.name, self.validate())?;
        let mut doc = Document::new();
        doc.insert(TYPE_KEY.into(), JsonValue::String(self.schema.type_uri.to_owned()));
        codec::encode_properties(self.schema, &self.properties, policy, &mut doc)?;
        Ok(doc)
    }
}
