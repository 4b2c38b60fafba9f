//! Identity cache: at most one live [`EntityRef`] per node identifier.
//!
//! ## Lifecycle
//!
//! One cache per [`Session`](crate::Session), created with it and dropped
//! with it. Entries are added on first materialization or save and are never
//! invalidated by this layer. A node changed remotely by another client
//! stays stale here until it is evicted.
//!
//! ## Threading
//!
//! There is no internal locking. All mutation goes through `&mut self`, so
//! the borrow checker rules out concurrent registration within a session.
//! Sharing one cache across threads behind an external lock of your own is
//! possible, but two sessions (or two caches) can each hold a live instance
//! for the same identifier. The one-instance guarantee is per cache.

use std::collections::HashMap;
use std::fmt;

use crate::model::{EntityRef, NodeId};

#[derive(Default)]
pub struct IdentityCache {
    entries: HashMap<NodeId, EntityRef>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &NodeId) -> Option<EntityRef> {
        self.entries.get(id).cloned()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.entries.contains_key(id)
    }

    /// Register `entity` under its identifier and return the canonical
    /// instance: the one already cached, if any, otherwise `entity` itself.
    ///
    /// Entities without an identifier are returned unchanged and not cached.
    pub fn register(&mut self, entity: EntityRef) -> EntityRef {
        let Some(id) = entity.id() else {
            return entity;
        };
        match self.entries.get(&id) {
            Some(existing) => {
                if !existing.ptr_eq(&entity) {
                    tracing::debug!(%id, "identity cache already holds an instance");
                }
                existing.clone()
            }
            None => {
                tracing::debug!(%id, type_name = entity.schema().name, "caching entity");
                self.entries.insert(id, entity.clone());
                entity
            }
        }
    }

    /// Drop the entry for `id`. The next lookup of that node fetches again.
    pub fn evict(&mut self, id: &NodeId) -> Option<EntityRef> {
        self.entries.remove(id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.entries.keys()
    }
}

impl fmt::Debug for IdentityCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityCache").field("len", &self.entries.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entity, Schema, SchemaKind};

    static NODE: Schema = Schema {
        name: "Node",
        type_uri: "https://example.org/Node",
        kind: SchemaKind::Entity,
        default_space: "common",
        properties: &[],
        reverse_properties: &[],
        existence_key: &[],
    };

    #[test]
    fn test_register_returns_canonical_instance() {
        let mut cache = IdentityCache::new();
        let first = EntityRef::new(Entity::new(&NODE).with_id("n1"));
        let second = EntityRef::new(Entity::new(&NODE).with_id("n1"));

        assert!(cache.register(first.clone()).ptr_eq(&first));
        assert!(cache.register(second).ptr_eq(&first));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_unsaved_entities_are_not_cached() {
        let mut cache = IdentityCache::new();
        let local = EntityRef::new(Entity::new(&NODE));
        assert!(cache.register(local.clone()).ptr_eq(&local));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_evict() {
        let mut cache = IdentityCache::new();
        let id = NodeId::from("n1");
        cache.register(EntityRef::new(Entity::new(&NODE).with_id("n1")));
        assert!(cache.contains(&id));
        assert!(cache.evict(&id).is_some());
        assert!(cache.get(&id).is_none());
    }
}
