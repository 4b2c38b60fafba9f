//! Property-level JSON-LD codec shared by [`Entity`] and [`EmbeddedValue`].
//!
//! Decoding never fetches: entity-typed properties become [`Proxy`] values.
//! Values that cannot be decoded are dropped and reported as validation
//! issues, so the caller's policy decides whether that is fatal.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Number, Value as JsonValue};

use super::document::{ID_KEY, id_of, reference, types_of};
use super::{
    Descriptor, Document, EmbeddedValue, PropertyMap, ScalarKind, Schema, SchemaKind,
    ValidationIssue, Value,
};
use crate::config::ValidationPolicy;
use crate::lazy::Proxy;
use crate::registry::Registry;
use crate::{Error, Result};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// Decoding
// ============================================================================

/// Decode every forward property of `schema` present in `doc`.
///
/// Multiple-valued properties always decode to [`Value::List`]; a single
/// value wrapped in a one-element array decodes to the bare value.
pub(crate) fn decode_properties(
    schema: &'static Schema,
    doc: &Document,
    registry: &Registry,
    policy: &ValidationPolicy,
    issues: &mut Vec<ValidationIssue>,
) -> Result<PropertyMap> {
    let mut props = PropertyMap::new();

    for d in schema.properties {
        let Some(raw) = doc.get(d.path) else { continue };

        let decoded = match raw {
            JsonValue::Null => continue,
            JsonValue::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(v) = decode_value(d, item, registry, policy, issues)? {
                        values.push(v);
                    }
                }
                if values.is_empty() {
                    continue;
                }
                if !d.is_multiple() && values.len() == 1 {
                    values.remove(0)
                } else {
                    Value::List(values)
                }
            }
            other => match decode_value(d, other, registry, policy, issues)? {
                Some(v) if d.is_multiple() => Value::List(vec![v]),
                Some(v) => v,
                None => continue,
            },
        };

        props.insert(d.name.to_owned(), decoded);
    }

    Ok(props)
}

fn decode_value(
    d: &'static Descriptor,
    raw: &JsonValue,
    registry: &Registry,
    policy: &ValidationPolicy,
    issues: &mut Vec<ValidationIssue>,
) -> Result<Option<Value>> {
    let value = match raw {
        JsonValue::Null => return Ok(None),
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => match (d.admits_scalar(ScalarKind::Integer), n.as_i64(), n.as_f64()) {
            (true, Some(i), _) => Value::Int(i),
            (_, _, Some(f)) => Value::Float(f),
            _ => {
                issues.push(unexpected(d, "number"));
                return Ok(None);
            }
        },
        JsonValue::String(s) => decode_string(d, s),
        JsonValue::Object(obj) if obj.contains_key(ID_KEY) => {
            let Some(id) = id_of(obj) else {
                issues.push(unexpected(d, "non-string @id"));
                return Ok(None);
            };
            let types = types_of(obj);
            match pick_target(d, &types, SchemaKind::Entity, registry) {
                Some(target) => Value::Proxy(Proxy::new(target, id)),
                None => {
                    issues.push(unexpected(d, &describe_types(&types)));
                    return Ok(None);
                }
            }
        }
        JsonValue::Object(obj) => {
            let types = types_of(obj);
            match pick_target(d, &types, SchemaKind::Embedded, registry) {
                Some(target) => {
                    let embedded = EmbeddedValue::decode(target, obj, registry, policy)?;
                    Value::Embedded(Box::new(embedded))
                }
                None => {
                    issues.push(unexpected(d, &describe_types(&types)));
                    return Ok(None);
                }
            }
        }
        JsonValue::Array(_) => {
            issues.push(unexpected(d, "nested array"));
            return Ok(None);
        }
    };
    Ok(Some(value))
}

fn decode_string(d: &Descriptor, s: &str) -> Value {
    if d.admits_scalar(ScalarKind::Date) {
        if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
            return Value::Date(date);
        }
    }
    if d.admits_scalar(ScalarKind::DateTime) {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Value::DateTime(dt.with_timezone(&Utc));
        }
    }
    Value::String(s.to_owned())
}

/// Choose the schema a wire object decodes to.
///
/// A declared target named by `@type` wins, then any registered schema of
/// the right kind named by `@type` (validation will flag it), then the
/// first declared target of the right kind.
fn pick_target(
    d: &Descriptor,
    types: &[&str],
    kind: SchemaKind,
    registry: &Registry,
) -> Option<&'static Schema> {
    let candidates: Vec<&'static Schema> = d
        .schema_targets()
        .filter_map(|name| registry.get(name))
        .filter(|s| s.kind == kind)
        .collect();

    if let Some(hit) = candidates.iter().find(|s| types.contains(&s.type_uri)) {
        return Some(*hit);
    }
    if let Some(hit) = types
        .iter()
        .filter_map(|t| registry.by_type_uri(t))
        .find(|s| s.kind == kind)
    {
        return Some(hit);
    }
    candidates.first().copied()
}

fn unexpected(d: &Descriptor, found: &str) -> ValidationIssue {
    ValidationIssue::UnexpectedType { property: d.name, found: found.to_owned() }
}

fn describe_types(types: &[&str]) -> String {
    if types.is_empty() {
        "untyped object".to_owned()
    } else {
        types.join("|")
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode the forward properties of `props` into `doc`.
///
/// Reverse properties are never written. Empty lists are omitted.
pub(crate) fn encode_properties(
    schema: &Schema,
    props: &PropertyMap,
    policy: &ValidationPolicy,
    doc: &mut Document,
) -> Result<()> {
    for d in schema.properties {
        let Some(value) = props.get(d.name) else { continue };
        if let Some(json) = encode_property(schema, d, value, policy)? {
            doc.insert(d.path.to_owned(), json);
        }
    }
    Ok(())
}

pub(crate) fn encode_property(
    owner: &Schema,
    d: &Descriptor,
    value: &Value,
    policy: &ValidationPolicy,
) -> Result<Option<JsonValue>> {
    let items = value.items();
    if items.is_empty() {
        return Ok(None);
    }
    if d.is_multiple() || items.len() > 1 {
        let encoded = items
            .iter()
            .map(|v| encode_value(owner, d, v, policy))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Some(JsonValue::Array(encoded)));
    }
    encode_value(owner, d, &items[0], policy).map(Some)
}

fn encode_value(
    owner: &Schema,
    d: &Descriptor,
    value: &Value,
    policy: &ValidationPolicy,
) -> Result<JsonValue> {
    Ok(match value {
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::Number((*i).into()),
        Value::Float(f) => Number::from_f64(*f).map(JsonValue::Number).ok_or_else(|| {
            Error::InvalidDocument(format!("{}.{} is not a finite number", owner.name, d.name))
        })?,
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Date(date) => JsonValue::String(date.format(DATE_FORMAT).to_string()),
        Value::DateTime(dt) => JsonValue::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        Value::List(items) => JsonValue::Array(
            items
                .iter()
                .map(|v| encode_value(owner, d, v, policy))
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Embedded(e) => JsonValue::Object(e.to_document(policy)?),
        Value::Entity(e) => match e.id() {
            Some(id) => reference(&id, e.schema().type_uri),
            None => {
                return Err(Error::UnsavedReference {
                    type_name: owner.name.to_owned(),
                    property: d.name.to_owned(),
                });
            }
        },
        Value::Proxy(p) => reference(p.id(), p.schema().type_uri),
        Value::Query(_) => {
            return Err(Error::InvalidDocument(format!(
                "{}.{} holds an unresolved query",
                owner.name, d.name
            )));
        }
    })
}
