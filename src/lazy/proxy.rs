//! Proxy: an unresolved `(type, identifier)` reference.

use std::hash::{Hash, Hasher};

use crate::model::{EntityRef, NodeId, Schema};
use crate::session::Session;
use crate::transport::Transport;
use crate::{Error, Result};

/// A reference to a node that has not been fetched.
///
/// Equality and hashing use `(type URI, identifier)`, so two proxies for the
/// same node compare equal before either is resolved.
#[derive(Debug, Clone)]
pub struct Proxy {
    schema: &'static Schema,
    id: NodeId,
}

impl Proxy {
    pub fn new(schema: &'static Schema, id: impl Into<NodeId>) -> Self {
        Self { schema, id: id.into() }
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Turn the reference into a live entity.
    ///
    /// A cached instance is returned as is. Otherwise the node is fetched
    /// under the session scope, materialized and cached. A missing node is
    /// a [`Error::ResolutionFailure`] and is not remembered: the next call
    /// asks the transport again.
    pub fn resolve<T: Transport>(&self, session: &mut Session<T>) -> Result<EntityRef> {
        if let Some(hit) = session.cache().get(&self.id) {
            tracing::debug!(id = %self.id, "proxy resolved from cache");
            return Ok(hit);
        }

        let scope = session.config().scope;
        tracing::debug!(id = %self.id, type_name = self.schema.name, %scope, "fetching node");
        let doc = session.transport().get_by_id(&self.id, scope)?.ok_or_else(|| {
            Error::ResolutionFailure(format!(
                "{} {} not found (scope: {scope})",
                self.schema.name, self.id
            ))
        })?;
        session.materialize_as(&doc, Some(self.schema), scope)
    }
}

impl PartialEq for Proxy {
    fn eq(&self, other: &Self) -> bool {
        self.schema.type_uri == other.schema.type_uri && self.id == other.id
    }
}

impl Eq for Proxy {}

impl Hash for Proxy {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.schema.type_uri.hash(state);
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SchemaKind;
    use std::collections::HashSet;

    static NODE: Schema = Schema {
        name: "Node",
        type_uri: "https://example.org/Node",
        kind: SchemaKind::Entity,
        default_space: "common",
        properties: &[],
        reverse_properties: &[],
        existence_key: &[],
    };

    static OTHER: Schema = Schema {
        name: "Other",
        type_uri: "https://example.org/Other",
        kind: SchemaKind::Entity,
        default_space: "common",
        properties: &[],
        reverse_properties: &[],
        existence_key: &[],
    };

    #[test]
    fn test_equality_by_type_and_id() {
        let a = Proxy::new(&NODE, "n1");
        let b = Proxy::new(&NODE, "n1");
        let c = Proxy::new(&OTHER, "n1");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<Proxy> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
