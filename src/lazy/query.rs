//! DeferredQuery: an unresolved filtered lookup.

use std::collections::HashSet;

use serde_json::Value as JsonValue;

use crate::model::document::{ID_KEY, id_of, json_matches};
use crate::model::{Document, EntityRef, NodeId, ReleaseStatus, ReverseDescriptor, Schema, Value};
use crate::registry::Registry;
use crate::session::Session;
use crate::transport::Transport;
use crate::Result;

// ============================================================================
// Filter
// ============================================================================

/// Condition on one property of a node document.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `path == value`, using [`json_matches`].
    Equals { path: String, value: JsonValue },
    /// `path` is missing, null or an empty array.
    Absent { path: String },
}

impl Condition {
    pub fn path(&self) -> &str {
        match self {
            Condition::Equals { path, .. } | Condition::Absent { path } => path,
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Condition::Equals { path, value } => {
                doc.get(path).is_some_and(|actual| json_matches(actual, value))
            }
            Condition::Absent { path } => match doc.get(path) {
                None | Some(JsonValue::Null) => true,
                Some(JsonValue::Array(items)) => items.is_empty(),
                Some(_) => false,
            },
        }
    }
}

/// Conjunction of conditions. The empty filter matches every node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equals(mut self, path: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.conditions.push(Condition::Equals { path: path.into(), value: value.into() });
        self
    }

    pub fn absent(mut self, path: impl Into<String>) -> Self {
        self.conditions.push(Condition::Absent { path: path.into() });
        self
    }

    /// Condition on a link property pointing at `id`.
    pub fn links_to(self, path: impl Into<String>, id: &NodeId) -> Self {
        let mut reference = Document::new();
        reference.insert(ID_KEY.into(), JsonValue::String(id.0.clone()));
        self.equals(path, JsonValue::Object(reference))
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluate against a document. See [`json_matches`] for the rules.
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|c| c.matches(doc))
    }
}

// ============================================================================
// QueryResult
// ============================================================================

/// Outcome of resolving a [`DeferredQuery`].
///
/// Exactly one match collapses to [`QueryResult::One`]; zero or several
/// matches are [`QueryResult::Many`]. Zero matches is not an error.
#[derive(Debug, Clone)]
pub enum QueryResult {
    One(EntityRef),
    Many(Vec<EntityRef>),
}

impl QueryResult {
    pub fn collapse(mut entities: Vec<EntityRef>) -> Self {
        if entities.len() == 1 {
            QueryResult::One(entities.remove(0))
        } else {
            QueryResult::Many(entities)
        }
    }

    pub fn as_slice(&self) -> &[EntityRef] {
        match self {
            QueryResult::One(e) => std::slice::from_ref(e),
            QueryResult::Many(all) => all,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn as_one(&self) -> Option<&EntityRef> {
        match self {
            QueryResult::One(e) => Some(e),
            QueryResult::Many(_) => None,
        }
    }

    pub fn into_vec(self) -> Vec<EntityRef> {
        match self {
            QueryResult::One(e) => vec![e],
            QueryResult::Many(all) => all,
        }
    }

    /// Property value with the same collapsing: one entity or a list.
    pub fn into_value(self) -> Value {
        match self {
            QueryResult::One(e) => Value::Entity(e),
            QueryResult::Many(all) => Value::List(all.into_iter().map(Value::Entity).collect()),
        }
    }
}

// ============================================================================
// DeferredQuery
// ============================================================================

/// A filter over one or more node types, executed on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredQuery {
    targets: Vec<&'static Schema>,
    filter: Filter,
    space: Option<String>,
    scope: Option<ReleaseStatus>,
}

impl DeferredQuery {
    pub fn new(target: &'static Schema, filter: Filter) -> Self {
        Self::union(vec![target], filter)
    }

    /// Query over several types; results are concatenated in target order.
    pub fn union(targets: Vec<&'static Schema>, filter: Filter) -> Self {
        Self { targets, filter, space: None, scope: None }
    }

    /// Restrict to one space.
    pub fn in_space(mut self, space: impl Into<String>) -> Self {
        self.space = Some(space.into());
        self
    }

    /// Override the session scope for this query.
    pub fn with_scope(mut self, scope: ReleaseStatus) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Lookup of the nodes whose forward property points at `id`.
    ///
    /// `None` when none of the source types is registered.
    pub fn reverse(r: &ReverseDescriptor, id: &NodeId, registry: &Registry) -> Option<Self> {
        let targets: Vec<&'static Schema> = r
            .sources
            .iter()
            .filter_map(|name| {
                let hit = registry.get(name);
                if hit.is_none() {
                    tracing::debug!(reverse = r.name, source = *name, "reverse source not registered");
                }
                hit
            })
            .collect();
        if targets.is_empty() {
            return None;
        }
        Some(Self::union(targets, Filter::new().links_to(r.forward_path, id)))
    }

    pub fn targets(&self) -> &[&'static Schema] {
        &self.targets
    }

    pub fn type_names(&self) -> Vec<&'static str> {
        self.targets.iter().map(|s| s.name).collect()
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn space(&self) -> Option<&str> {
        self.space.as_deref()
    }

    /// Run the query and materialize every match through the session's
    /// identity cache. A node matched under several targets is returned once.
    pub fn resolve<T: Transport>(&self, session: &mut Session<T>) -> Result<QueryResult> {
        let scope = self.scope.unwrap_or(session.config().scope);
        let mut seen = HashSet::new();
        let mut entities = Vec::new();

        for target in &self.targets {
            let docs = session
                .transport()
                .filter(target.type_uri, &self.filter, self.space.as_deref(), scope)?;
            tracing::debug!(type_name = target.name, matches = docs.len(), "query executed");

            for doc in docs {
                if let Some(id) = id_of(&doc) {
                    if !seen.insert(id) {
                        continue;
                    }
                }
                entities.push(session.materialize_as(&doc, Some(*target), scope)?);
            }
        }

        Ok(QueryResult::collapse(entities))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_matches() {
        let doc = json!({
            "https://example.org/name": "Ada",
            "https://example.org/org": [{"@id": "o1"}, {"@id": "o2"}],
        });
        let doc = doc.as_object().unwrap();

        assert!(Filter::new().matches(doc));
        assert!(Filter::new().equals("https://example.org/name", "Ada").matches(doc));
        assert!(!Filter::new().equals("https://example.org/name", "Bob").matches(doc));
        assert!(Filter::new().links_to("https://example.org/org", &NodeId::from("o2")).matches(doc));
        assert!(!Filter::new().equals("https://example.org/missing", "x").matches(doc));
        assert!(Filter::new().absent("https://example.org/missing").matches(doc));
        assert!(!Filter::new().absent("https://example.org/name").matches(doc));
    }

    #[test]
    fn test_absent_accepts_null_and_empty() {
        let doc = json!({"https://example.org/a": null, "https://example.org/b": []});
        let doc = doc.as_object().unwrap();
        assert!(Filter::new()
            .absent("https://example.org/a")
            .absent("https://example.org/b")
            .matches(doc));
    }

    #[test]
    fn test_collapse_branches() {
        assert!(matches!(QueryResult::collapse(vec![]), QueryResult::Many(v) if v.is_empty()));
        assert_eq!(QueryResult::Many(vec![]).into_value(), Value::List(vec![]));
    }
}
