//! # Transport Trait
//!
//! The contract between the graph layer and the knowledge-graph service.
//! Every network operation the mapping layer needs is defined here; HTTP,
//! authentication, rate limiting and timeouts belong to implementations.
//!
//! ## Implementations
//!
//! | Transport | Module | Description |
//! |-----------|--------|-------------|
//! | `MemoryTransport` | `memory` | In-memory node store for testing/embedding |
//! | `Retrying` | `retry` | Wraps another transport with a retry policy |

pub mod memory;
pub mod retry;

use crate::Result;
use crate::lazy::Filter;
use crate::model::{Document, NodeId, ReleaseStatus};

pub use memory::{CallStats, MemoryTransport};
pub use retry::{FixedRetry, NoRetry, RetryPolicy, Retrying};

/// Blocking access to the remote graph.
///
/// Calls are synchronous: each returns after one round trip. Errors from
/// the network side should be reported as [`crate::Error::Transport`] so that
/// retry policies can recognize them.
pub trait Transport {
    /// Fetch one node. `Ok(None)` when it does not exist in `scope`.
    fn get_by_id(&self, id: &NodeId, scope: ReleaseStatus) -> Result<Option<Document>>;

    /// All nodes of `type_uri` matching `filter`, optionally within one space.
    fn filter(
        &self,
        type_uri: &str,
        filter: &Filter,
        space: Option<&str>,
        scope: ReleaseStatus,
    ) -> Result<Vec<Document>>;

    /// Create a node in `space`. Returns the stored document with its `@id`.
    fn create(&self, type_uri: &str, document: Document, space: &str) -> Result<Document>;

    /// Replace the properties of an existing node.
    fn update(&self, id: &NodeId, document: Document) -> Result<Document>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get_by_id(&self, id: &NodeId, scope: ReleaseStatus) -> Result<Option<Document>> {
        (**self).get_by_id(id, scope)
    }

    fn filter(
        &self,
        type_uri: &str,
        filter: &Filter,
        space: Option<&str>,
        scope: ReleaseStatus,
    ) -> Result<Vec<Document>> {
        (**self).filter(type_uri, filter, space, scope)
    }

    fn create(&self, type_uri: &str, document: Document, space: &str) -> Result<Document> {
        (**self).create(type_uri, document, space)
    }

    fn update(&self, id: &NodeId, document: Document) -> Result<Document> {
        (**self).update(id, document)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn get_by_id(&self, id: &NodeId, scope: ReleaseStatus) -> Result<Option<Document>> {
        (**self).get_by_id(id, scope)
    }

    fn filter(
        &self,
        type_uri: &str,
        filter: &Filter,
        space: Option<&str>,
        scope: ReleaseStatus,
    ) -> Result<Vec<Document>> {
        (**self).filter(type_uri, filter, space, scope)
    }

    fn create(&self, type_uri: &str, document: Document, space: &str) -> Result<Document> {
        (**self).create(type_uri, document, space)
    }

    fn update(&self, id: &NodeId, document: Document) -> Result<Document> {
        (**self).update(id, document)
    }
}
