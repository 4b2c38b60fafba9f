//! Entities: identified, independently persisted nodes.

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde_json::Value as JsonValue;

use super::codec;
use super::document::{ID_KEY, TYPE_KEY, id_of, space_of};
use super::validation::validate;
use super::{Descriptor, Document, NodeId, PropertyMap, ReleaseStatus, Schema, ValidationIssue, Value};
use crate::config::ValidationPolicy;
use crate::lazy::{DeferredQuery, Filter, Proxy};
use crate::registry::Registry;
use crate::{Error, Result};

// ============================================================================
// Entity
// ============================================================================

/// A typed node of the knowledge graph.
///
/// `id` is `None` until the node is first saved (or adopted through an
/// existence query). Properties are keyed by descriptor name.
#[derive(Debug, Clone)]
pub struct Entity {
    schema: &'static Schema,
    id: Option<NodeId>,
    space: Option<String>,
    scope: Option<ReleaseStatus>,
    properties: PropertyMap,
}

impl Entity {
    pub fn new(schema: &'static Schema) -> Self {
        Self { schema, id: None, space: None, scope: None, properties: PropertyMap::new() }
    }

    /// Attach an identifier up front, e.g. to link to a node known by id.
    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_space(mut self, space: impl Into<String>) -> Self {
        self.space = Some(space.into());
        self
    }

    pub fn with(mut self, d: &Descriptor, value: impl Into<Value>) -> Self {
        self.put(d, value);
        self
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn type_uri(&self) -> &'static str {
        self.schema.type_uri
    }

    pub fn id(&self) -> Option<&NodeId> {
        self.id.as_ref()
    }

    /// Space the node lives in, once known.
    pub fn space(&self) -> Option<&str> {
        self.space.as_deref()
    }

    /// Scope the node was read under. `None` for locally built entities.
    pub fn scope(&self) -> Option<ReleaseStatus> {
        self.scope
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Set a forward or reverse property by name.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        if let Some(d) = self.schema.descriptor(name) {
            self.put(d, value);
            return Ok(());
        }
        if self.schema.reverse(name).is_some() {
            self.properties.insert(name.to_owned(), value.into());
            return Ok(());
        }
        Err(Error::UnknownProperty {
            type_name: self.schema.name.to_owned(),
            property: name.to_owned(),
        })
    }

    /// Set a forward property through its descriptor.
    pub fn put(&mut self, d: &Descriptor, value: impl Into<Value>) {
        store(&mut self.properties, d, value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.properties.remove(name)
    }

    pub fn validate(&self) -> Vec<ValidationIssue> {
        validate(self.schema, &self.properties)
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = Some(id);
    }

    pub(crate) fn set_space(&mut self, space: impl Into<String>) {
        self.space = Some(space.into());
    }

    pub(crate) fn set_scope(&mut self, scope: ReleaseStatus) {
        self.scope = Some(scope);
    }

    pub(crate) fn properties_mut(&mut self) -> &mut PropertyMap {
        &mut self.properties
    }

    // ========================================================================
    // JSON-LD
    // ========================================================================

    /// Parse a node document, picking the schema from its `@type`.
    pub fn from_document(
        doc: &Document,
        registry: &Registry,
        policy: &ValidationPolicy,
    ) -> Result<Self> {
        let schema = registry.schema_for(doc)?;
        Self::from_document_as(schema, doc, registry, policy)
    }

    /// Parse a node document as `schema`.
    ///
    /// Entity-typed properties become proxies; reverse properties become
    /// deferred queries when the document carries an `@id`.
    pub fn from_document_as(
        schema: &'static Schema,
        doc: &Document,
        registry: &Registry,
        policy: &ValidationPolicy,
    ) -> Result<Self> {
        if schema.is_embedded() {
            return Err(Error::InvalidDocument(format!(
                "{} is an embedded type, not a node",
                schema.name
            )));
        }

        let mut issues = Vec::new();
        let mut properties = codec::decode_properties(schema, doc, registry, policy, &mut issues)?;
        let id = id_of(doc);

        if let Some(id) = &id {
            for r in schema.reverse_properties {
                if let Some(query) = DeferredQuery::reverse(r, id, registry) {
                    properties.insert(r.name.to_owned(), Value::Query(query));
                }
            }
        }

        issues.extend(validate(schema, &properties));
        policy.check(schema.name, issues)?;

        Ok(Self {
            schema,
            id,
            space: space_of(doc).map(str::to_owned),
            scope: None,
            properties,
        })
    }

    /// Serialize to a node document. Linked entities must have identifiers.
    pub fn to_document(&self, policy: &ValidationPolicy) -> Result<Document> {
        policy.check(self.schema.name, self.validate())?;

        let mut doc = Document::new();
        if let Some(id) = &self.id {
            doc.insert(ID_KEY.into(), JsonValue::String(id.0.clone()));
        }
        doc.insert(TYPE_KEY.into(), JsonValue::String(self.schema.type_uri.to_owned()));
        codec::encode_properties(self.schema, &self.properties, policy, &mut doc)?;
        Ok(doc)
    }

    /// Filter over the existence-query key, or `None` when the schema has no
    /// key or none of its properties is set.
    ///
    /// Unset key properties must be absent on the matching node too, so
    /// `Ada` does not match `Ada Lovelace`.
    pub(crate) fn existence_filter(&self, policy: &ValidationPolicy) -> Result<Option<Filter>> {
        let mut filter = Filter::new();
        let mut any_set = false;
        for name in self.schema.existence_key {
            let Some(d) = self.schema.descriptor(name) else {
                return Err(Error::UnknownProperty {
                    type_name: self.schema.name.to_owned(),
                    property: (*name).to_owned(),
                });
            };
            let encoded = match self.properties.get(*name) {
                Some(value) => codec::encode_property(self.schema, d, value, policy)?,
                None => None,
            };
            filter = match encoded {
                Some(json) => {
                    any_set = true;
                    filter.equals(d.path, json)
                }
                None => filter.absent(d.path),
            };
        }
        Ok(any_set.then_some(filter))
    }

    /// Linked entities without an identifier, including those inside lists
    /// and embedded values.
    pub(crate) fn unsaved_links(&self) -> Vec<EntityRef> {
        let mut out = Vec::new();
        for value in self.properties.values() {
            collect_unsaved(value, &mut out);
        }
        out
    }
}

fn collect_unsaved(value: &Value, out: &mut Vec<EntityRef>) {
    match value {
        Value::Entity(e) if e.id().is_none() => out.push(e.clone()),
        Value::List(items) => items.iter().for_each(|v| collect_unsaved(v, out)),
        Value::Embedded(e) => e.properties().values().for_each(|v| collect_unsaved(v, out)),
        _ => {}
    }
}

/// Store `value` under `d`, normalizing multiplicity: multiple-valued
/// properties are always lists and an empty list removes the property.
pub(crate) fn store(props: &mut PropertyMap, d: &Descriptor, value: Value) {
    let value = match value {
        Value::List(items) if items.is_empty() => {
            props.remove(d.name);
            return;
        }
        Value::List(mut items) if !d.is_multiple() && items.len() == 1 => items.remove(0),
        list @ Value::List(_) => list,
        single if d.is_multiple() => Value::List(vec![single]),
        single => single,
    };
    props.insert(d.name.to_owned(), value);
}

// ============================================================================
// EntityRef
// ============================================================================

/// Shared handle to a live [`Entity`].
///
/// This is what the identity cache hands out: two handles for the same
/// identifier obtained from one session are [`ptr_eq`](Self::ptr_eq).
#[derive(Clone)]
pub struct EntityRef(Arc<EntityCell>);

struct EntityCell {
    // Fixed for the lifetime of the entity, kept outside the lock.
    schema: &'static Schema,
    entity: RwLock<Entity>,
}

impl EntityRef {
    pub fn new(entity: Entity) -> Self {
        Self(Arc::new(EntityCell { schema: entity.schema, entity: RwLock::new(entity) }))
    }

    pub fn schema(&self) -> &'static Schema {
        self.0.schema
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Entity> {
        self.0.entity.read_recursive()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Entity> {
        self.0.entity.write()
    }

    pub fn ptr_eq(&self, other: &EntityRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn id(&self) -> Option<NodeId> {
        self.read().id.clone()
    }

    /// Clone of a property value.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.read().properties.get(name).cloned()
    }

    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.write().set(name, value)
    }

    pub fn put(&self, d: &Descriptor, value: impl Into<Value>) {
        self.write().put(d, value);
    }

    /// Unresolved reference to this node, if it has an identifier.
    pub fn to_proxy(&self) -> Option<Proxy> {
        self.id().map(|id| Proxy::new(self.schema(), id))
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl From<Entity> for EntityRef {
    fn from(entity: Entity) -> Self {
        Self::new(entity)
    }
}

// Never prints properties: resolved graphs are routinely cyclic.
impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut t = f.debug_tuple("EntityRef");
        t.field(&self.schema().name);
        match self.0.entity.try_read_recursive() {
            Some(e) => t.field(&e.id),
            None => t.field(&"<locked>"),
        };
        t.finish()
    }
}
