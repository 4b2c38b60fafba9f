//! In-memory transport.
//!
//! This is the reference implementation of `Transport`: a flat node store
//! behind a `RwLock`, shared between clones.
//!
//! ## Limitations
//!
//! - **Linear scans**: `filter()` walks every stored node.
//! - **No revisions**: a node is either released or not. Under
//!   `ReleaseStatus::Released` unreleased nodes are invisible; the other
//!   scopes see the latest document.
//! - **No access control**: every space is readable and writable.
//!
//! Use this transport for:
//! - Testing the mapping layer without a network
//! - Seeding fixtures and asserting on the exact calls a session makes

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde_json::Value as JsonValue;

use super::Transport;
use crate::lazy::Filter;
use crate::model::document::{ID_KEY, SPACE_KEY, TYPE_KEY, id_of, types_of};
use crate::model::{Document, NodeId, ReleaseStatus};
use crate::{Error, Result};

/// Prefix of identifiers handed out by [`MemoryTransport`].
pub const INSTANCE_BASE: &str = "https://kg.ebrains.eu/api/instances/";

// ============================================================================
// MemoryTransport
// ============================================================================

/// In-memory knowledge graph. Clones share the same store.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    nodes: RwLock<Vec<StoredNode>>,
    next_id: AtomicU64,
    calls: Calls,
}

struct StoredNode {
    id: NodeId,
    released: bool,
    document: Document,
}

#[derive(Default)]
struct Calls {
    get_by_id: AtomicU64,
    filter: AtomicU64,
    create: AtomicU64,
    update: AtomicU64,
}

/// Number of calls per operation since creation or the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallStats {
    pub get_by_id: u64,
    pub filter: u64,
    pub create: u64,
    pub update: u64,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> NodeId {
        let n = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        NodeId(format!("{INSTANCE_BASE}00000000-0000-4000-8000-{n:012x}"))
    }

    /// Store a document directly, bypassing `create`. Keeps the document's
    /// `@id` if it has one. Returns the node identifier.
    pub fn insert(&self, mut document: Document, space: &str, released: bool) -> NodeId {
        let id = id_of(&document).unwrap_or_else(|| self.allocate_id());
        document.insert(ID_KEY.into(), JsonValue::String(id.0.clone()));
        document.insert(SPACE_KEY.into(), JsonValue::String(space.to_owned()));

        let mut nodes = self.inner.nodes.write();
        nodes.retain(|n| n.id != id);
        nodes.push(StoredNode { id: id.clone(), released, document });
        id
    }

    /// Mark a node as released.
    pub fn release(&self, id: &NodeId) -> Result<()> {
        let mut nodes = self.inner.nodes.write();
        let node = nodes
            .iter_mut()
            .find(|n| &n.id == id)
            .ok_or_else(|| Error::ResolutionFailure(format!("Node {id}")))?;
        node.released = true;
        Ok(())
    }

    /// Stored document, regardless of release state.
    pub fn document(&self, id: &NodeId) -> Option<Document> {
        self.inner.nodes.read().iter().find(|n| &n.id == id).map(|n| n.document.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.nodes.read().is_empty()
    }

    /// Number of stored nodes of one type.
    pub fn count_of_type(&self, type_uri: &str) -> usize {
        self.inner
            .nodes
            .read()
            .iter()
            .filter(|n| types_of(&n.document).contains(&type_uri))
            .count()
    }

    pub fn calls(&self) -> CallStats {
        let c = &self.inner.calls;
        CallStats {
            get_by_id: c.get_by_id.load(Ordering::Relaxed),
            filter: c.filter.load(Ordering::Relaxed),
            create: c.create.load(Ordering::Relaxed),
            update: c.update.load(Ordering::Relaxed),
        }
    }

    pub fn reset_calls(&self) {
        let c = &self.inner.calls;
        for counter in [&c.get_by_id, &c.filter, &c.create, &c.update] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport").field("nodes", &self.len()).finish()
    }
}

// ============================================================================
// Transport impl
// ============================================================================

impl Transport for MemoryTransport {
    fn get_by_id(&self, id: &NodeId, scope: ReleaseStatus) -> Result<Option<Document>> {
        self.inner.calls.get_by_id.fetch_add(1, Ordering::Relaxed);
        let nodes = self.inner.nodes.read();
        Ok(nodes
            .iter()
            .find(|n| &n.id == id && scope.admits(n.released))
            .map(|n| n.document.clone()))
    }

    fn filter(
        &self,
        type_uri: &str,
        filter: &Filter,
        space: Option<&str>,
        scope: ReleaseStatus,
    ) -> Result<Vec<Document>> {
        self.inner.calls.filter.fetch_add(1, Ordering::Relaxed);
        // Brute force scan
        let nodes = self.inner.nodes.read();
        Ok(nodes
            .iter()
            .filter(|n| scope.admits(n.released))
            .filter(|n| types_of(&n.document).contains(&type_uri))
            .filter(|n| {
                space.is_none_or(|s| n.document.get(SPACE_KEY).and_then(JsonValue::as_str) == Some(s))
            })
            .filter(|n| filter.matches(&n.document))
            .map(|n| n.document.clone())
            .collect())
    }

    fn create(&self, type_uri: &str, mut document: Document, space: &str) -> Result<Document> {
        self.inner.calls.create.fetch_add(1, Ordering::Relaxed);
        if document.contains_key(ID_KEY) {
            return Err(Error::InvalidDocument("create() called with an @id".into()));
        }
        if !document.contains_key(TYPE_KEY) {
            document.insert(TYPE_KEY.into(), JsonValue::String(type_uri.to_owned()));
        }
        let id = self.insert(document, space, false);
        tracing::debug!(%id, type_uri, space, "memory transport created node");
        self.document(&id)
            .ok_or_else(|| Error::ResolutionFailure(format!("Node {id} vanished after create")))
    }

    fn update(&self, id: &NodeId, mut document: Document) -> Result<Document> {
        self.inner.calls.update.fetch_add(1, Ordering::Relaxed);
        let mut nodes = self.inner.nodes.write();
        let node = nodes
            .iter_mut()
            .find(|n| &n.id == id)
            .ok_or_else(|| Error::ResolutionFailure(format!("Node {id}")))?;

        document.insert(ID_KEY.into(), JsonValue::String(id.0.clone()));
        if let Some(space) = node.document.get(SPACE_KEY).cloned() {
            document.insert(SPACE_KEY.into(), space);
        }
        node.document = document;
        Ok(node.document.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================
