//! Session: the top-level handle.
//!
//! A session owns a transport, shares a registry, and owns the identity
//! cache and validation policy. Every lookup, resolve and save goes through
//! it. Sessions are independent of each other: two sessions in one process
//! have separate caches.

use std::collections::HashSet;
use std::sync::Arc;

use crate::cache::IdentityCache;
use crate::config::{ExistenceCheck, SessionConfig, ValidationPolicy};
use crate::lazy::{DeferredQuery, Filter, Proxy, QueryResult};
use crate::model::codec;
use crate::model::document::{id_of, json_matches, space_of};
use crate::model::{Document, Entity, EntityRef, NodeId, ReleaseStatus, Schema};
use crate::registry::Registry;
use crate::resolve;
use crate::transport::Transport;
use crate::{Error, Result};

pub struct Session<T: Transport> {
    transport: T,
    registry: Arc<Registry>,
    cache: IdentityCache,
    config: SessionConfig,
    policy: ValidationPolicy,
}

impl<T: Transport> Session<T> {
    /// Session with the default configuration.
    pub fn new(transport: T, registry: impl Into<Arc<Registry>>) -> Self {
        Self::with_config(transport, registry, SessionConfig::default())
    }

    pub fn with_config(
        transport: T,
        registry: impl Into<Arc<Registry>>,
        config: SessionConfig,
    ) -> Self {
        Self {
            transport,
            registry: registry.into(),
            cache: IdentityCache::new(),
            policy: ValidationPolicy::new(config.validation),
            config,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn cache(&self) -> &IdentityCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut IdentityCache {
        &mut self.cache
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut ValidationPolicy {
        &mut self.policy
    }

    /// Change the read scope. Returns the previous one.
    pub fn set_scope(&mut self, scope: ReleaseStatus) -> ReleaseStatus {
        std::mem::replace(&mut self.config.scope, scope)
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Live entity for `id`, from the cache or fetched.
    pub fn get(&mut self, schema: &'static Schema, id: &NodeId) -> Result<EntityRef> {
        Proxy::new(schema, id.clone()).resolve(self)
    }

    /// [`get`](Self::get) with the type given by registry name.
    pub fn get_by_name(&mut self, type_name: &str, id: &NodeId) -> Result<EntityRef> {
        let schema = self.registry.require(type_name)?;
        self.get(schema, id)
    }

    /// Deferred query over one type. Nothing is fetched until it is resolved.
    pub fn query(&self, schema: &'static Schema, filter: Filter) -> DeferredQuery {
        DeferredQuery::new(schema, filter)
    }

    /// Run a query right away.
    pub fn list(&mut self, schema: &'static Schema, filter: Filter) -> Result<QueryResult> {
        self.query(schema, filter).resolve(self)
    }

    /// Turn a node document into the live entity for its `@id`.
    ///
    /// If the identifier is already cached, the cached instance is returned
    /// unchanged and the document is ignored.
    pub fn materialize(&mut self, doc: &Document) -> Result<EntityRef> {
        let scope = self.config.scope;
        self.materialize_as(doc, None, scope)
    }

    pub(crate) fn materialize_as(
        &mut self,
        doc: &Document,
        fallback: Option<&'static Schema>,
        scope: ReleaseStatus,
    ) -> Result<EntityRef> {
        let id = id_of(doc)
            .ok_or_else(|| Error::InvalidDocument("node document without @id".into()))?;
        if let Some(hit) = self.cache.get(&id) {
            tracing::debug!(%id, "document matched a cached entity");
            return Ok(hit);
        }

        let schema = match (self.registry.schema_for(doc), fallback) {
            (Ok(schema), _) => schema,
            (Err(_), Some(schema)) => schema,
            (Err(err), None) => return Err(err),
        };
        let mut entity = Entity::from_document_as(schema, doc, &self.registry, &self.policy)?;
        entity.set_scope(scope);
        Ok(self.cache.register(EntityRef::new(entity)))
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Resolve the entity's links `depth` levels deep.
    pub fn resolve(&mut self, entity: &EntityRef, depth: u32) -> Result<()> {
        resolve::resolve(self, entity, depth)
    }

    /// [`resolve`](Self::resolve) with the configured default depth.
    pub fn resolve_default(&mut self, entity: &EntityRef) -> Result<()> {
        let depth = self.config.default_resolve_depth;
        self.resolve(entity, depth)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    pub fn to_document(&self, entity: &EntityRef) -> Result<Document> {
        entity.read().to_document(&self.policy)
    }

    /// Whether the entity already exists remotely.
    ///
    /// True right away if it has an identifier. Otherwise its existence key
    /// is queried across all spaces and scopes: no match is `false`, one
    /// match is adopted (the entity takes its identifier and is cached) and
    /// several matches are [`Error::AmbiguousIdentity`]. Unset key
    /// properties must be unset on the match as well; with no key property
    /// set there is nothing to query and the answer is `false`.
    pub fn exists(&mut self, entity: &EntityRef) -> Result<bool> {
        let filter = {
            let e = entity.read();
            if e.id().is_some() {
                return Ok(true);
            }
            match e.existence_filter(&self.policy)? {
                Some(filter) => filter,
                None => {
                    tracing::debug!(type_name = e.schema().name, "existence key unset, treating as new");
                    return Ok(false);
                }
            }
        };

        let schema = entity.schema();
        let matches = self.transport.filter(schema.type_uri, &filter, None, ReleaseStatus::Any)?;
        match matches.as_slice() {
            [] => Ok(false),
            [doc] => {
                self.adopt(entity, doc)?;
                Ok(true)
            }
            many => Err(Error::AmbiguousIdentity {
                type_name: schema.name.to_owned(),
                matches: many.len(),
            }),
        }
    }

    fn adopt(&mut self, entity: &EntityRef, doc: &Document) -> Result<()> {
        let id = id_of(doc)
            .ok_or_else(|| Error::InvalidDocument("existence match without @id".into()))?;

        if self.config.existence_check == ExistenceCheck::Strict {
            let mismatched = self.mismatched_properties(entity, doc)?;
            if !mismatched.is_empty() {
                return Err(Error::IdentityConflict { id, mismatched });
            }
        }

        tracing::info!(%id, type_name = entity.schema().name, "adopting identifier of existing node");
        {
            let mut e = entity.write();
            e.set_id(id);
            if let Some(space) = space_of(doc) {
                e.set_space(space);
            }
        }
        self.cache.register(entity.clone());
        Ok(())
    }

    /// Locally set forward properties whose value differs from `doc`.
    fn mismatched_properties(&self, entity: &EntityRef, doc: &Document) -> Result<Vec<String>> {
        let e = entity.read();
        let schema = e.schema();
        let mut mismatched = Vec::new();

        for d in schema.properties {
            let Some(value) = e.get(d.name) else { continue };
            let Some(local) = codec::encode_property(schema, d, value, &self.policy)? else {
                continue;
            };
            let agrees = doc
                .get(d.path)
                .is_some_and(|remote| json_matches(remote, &local) && json_matches(&local, remote));
            if !agrees {
                mismatched.push(d.name.to_owned());
            }
        }
        Ok(mismatched)
    }

    /// Persist the entity.
    ///
    /// Linked entities without an identifier are saved first (always with
    /// `exists_ok`). Then:
    ///
    /// - with an identifier, the node is updated;
    /// - else if [`exists`](Self::exists) finds it, nothing is written, or
    ///   [`Error::ResourceExists`] is returned when `exists_ok` is false;
    /// - else the node is created in the entity's space (default: the
    ///   schema's) and the new identifier is stored.
    ///
    /// The entity ends up registered in the identity cache.
    pub fn save(&mut self, entity: &EntityRef, exists_ok: bool) -> Result<()> {
        let mut visited = HashSet::new();
        self.save_node(entity, exists_ok, &mut visited)
    }

    fn save_node(
        &mut self,
        entity: &EntityRef,
        exists_ok: bool,
        visited: &mut HashSet<usize>,
    ) -> Result<()> {
        if !visited.insert(entity.addr()) {
            return Ok(());
        }

        let children = entity.read().unsaved_links();
        for child in &children {
            self.save_node(child, true, visited)?;
        }

        let schema = entity.schema();

        if let Some(id) = entity.id() {
            let doc = self.to_document(entity)?;
            tracing::debug!(%id, type_name = schema.name, "updating node");
            self.transport.update(&id, doc)?;
            self.cache.register(entity.clone());
            return Ok(());
        }

        if self.exists(entity)? {
            let id = entity
                .id()
                .ok_or_else(|| Error::InvalidDocument("adopted node has no @id".into()))?;
            if !exists_ok {
                return Err(Error::ResourceExists { type_name: schema.name.to_owned(), id });
            }
            tracing::info!(%id, type_name = schema.name, "node already exists, nothing created");
            return Ok(());
        }

        let space = entity.read().space().unwrap_or(schema.default_space).to_owned();
        let doc = self.to_document(entity)?;
        let created = self.transport.create(schema.type_uri, doc, &space)?;
        let id = id_of(&created)
            .ok_or_else(|| Error::InvalidDocument("create returned no @id".into()))?;
        tracing::info!(%id, type_name = schema.name, space = %space, "created node");
        {
            let mut e = entity.write();
            e.set_id(id);
            e.set_space(space);
        }
        self.cache.register(entity.clone());
        Ok(())
    }
}

impl<T: Transport + std::fmt::Debug> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("transport", &self.transport)
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish()
    }
}
