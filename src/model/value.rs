//! Property value type shared by entities and embedded values.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

use super::{EmbeddedValue, EntityRef, NodeId};
use crate::lazy::{DeferredQuery, Proxy};

/// A property value.
///
/// Covers:
/// - Scalars: Bool, Int, Float, String, Date, DateTime
/// - Containers: List (multiple-valued properties)
/// - Inline: Embedded
/// - Graph: Entity (resolved), Proxy (unresolved reference), Query (unresolved lookup)
///
/// Absent properties are simply missing from the map; there is no null.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    List(Vec<Value>),
    Embedded(Box<EmbeddedValue>),
    Entity(EntityRef),
    Proxy(Proxy),
    Query(DeferredQuery),
}

// ============================================================================
// Type checking
// ============================================================================

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::List(_) => "list",
            Value::Embedded(_) => "embedded",
            Value::Entity(_) => "entity",
            Value::Proxy(_) => "proxy",
            Value::Query(_) => "query",
        }
    }

    /// True for proxies, queries, and lists or embedded values containing any.
    pub fn is_unresolved(&self) -> bool {
        match self {
            Value::Proxy(_) | Value::Query(_) => true,
            Value::List(items) => items.iter().any(Value::is_unresolved),
            Value::Embedded(e) => e.properties().values().any(Value::is_unresolved),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&EntityRef> {
        match self {
            Value::Entity(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_proxy(&self) -> Option<&Proxy> {
        match self {
            Value::Proxy(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_embedded(&self) -> Option<&EmbeddedValue> {
        match self {
            Value::Embedded(e) => Some(e.as_ref()),
            _ => None,
        }
    }

    /// The value's elements: a list yields its items, anything else yields itself.
    pub fn items(&self) -> &[Value] {
        match self {
            Value::List(items) => items,
            other => std::slice::from_ref(other),
        }
    }

    /// `(identifier, type URI)` of a node reference, resolved or not.
    /// `None` for non-references and for entities that were never saved.
    pub fn reference(&self) -> Option<(NodeId, &'static str)> {
        match self {
            Value::Entity(e) => e.id().map(|id| (id, e.schema().type_uri)),
            Value::Proxy(p) => Some((p.id().clone(), p.schema().type_uri)),
            _ => None,
        }
    }
}

// ============================================================================
// Equality
// ============================================================================

/// Node references compare by identity: an entity equals a proxy (or another
/// entity) naming the same `(type, identifier)`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Embedded(a), Value::Embedded(b)) => a == b,
            (Value::Query(a), Value::Query(b)) => a == b,
            (Value::Entity(a), Value::Entity(b)) if a.ptr_eq(b) => true,
            _ => match (self.reference(), other.reference()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

// ============================================================================
// Conversions (From impls)
// ============================================================================

impl From<bool> for Value { fn from(v: bool) -> Self { Value::Bool(v) } }
impl From<i32> for Value { fn from(v: i32) -> Self { Value::Int(v as i64) } }
impl From<i64> for Value { fn from(v: i64) -> Self { Value::Int(v) } }
impl From<f64> for Value { fn from(v: f64) -> Self { Value::Float(v) } }
impl From<String> for Value { fn from(v: String) -> Self { Value::String(v) } }
impl From<&str> for Value { fn from(v: &str) -> Self { Value::String(v.to_owned()) } }
impl From<NaiveDate> for Value { fn from(v: NaiveDate) -> Self { Value::Date(v) } }
impl From<DateTime<Utc>> for Value { fn from(v: DateTime<Utc>) -> Self { Value::DateTime(v) } }
impl From<EntityRef> for Value { fn from(v: EntityRef) -> Self { Value::Entity(v) } }
impl From<&EntityRef> for Value { fn from(v: &EntityRef) -> Self { Value::Entity(v.clone()) } }
impl From<Proxy> for Value { fn from(v: Proxy) -> Self { Value::Proxy(v) } }
impl From<DeferredQuery> for Value { fn from(v: DeferredQuery) -> Self { Value::Query(v) } }
impl From<EmbeddedValue> for Value { fn from(v: EmbeddedValue) -> Self { Value::Embedded(Box::new(v)) } }
impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self { Value::List(v.into_iter().map(Into::into).collect()) }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            Value::Date(d) => write!(f, "{d}"),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Embedded(e) => write!(f, "<{}>", e.schema().name),
            Value::Entity(e) => match e.id() {
                Some(id) => write!(f, "{}({id})", e.schema().name),
                None => write!(f, "{}(unsaved)", e.schema().name),
            },
            Value::Proxy(p) => write!(f, "proxy {}({})", p.schema().name, p.id()),
            Value::Query(q) => write!(f, "query {}", q.type_names().join("|")),
        }
    }
}
