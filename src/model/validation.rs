//! Schema validation of property maps.
//!
//! Validation only reports. What happens with a report is decided by
//! [`crate::ValidationPolicy`].

use std::fmt;

use super::{Descriptor, PropertyMap, PropertyType, ScalarKind, Schema, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A required property has no value.
    MissingRequired { property: &'static str },
    /// A single-valued property holds several values.
    TooManyValues { property: &'static str, count: usize },
    /// A value matches none of the property's declared targets.
    UnexpectedType { property: &'static str, found: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingRequired { property } => {
                write!(f, "required property '{property}' is missing")
            }
            ValidationIssue::TooManyValues { property, count } => {
                write!(f, "'{property}' takes a single value, got {count}")
            }
            ValidationIssue::UnexpectedType { property, found } => {
                write!(f, "'{property}' does not accept {found}")
            }
        }
    }
}

/// Check `props` against the forward descriptors of `schema`.
pub fn validate(schema: &Schema, props: &PropertyMap) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for d in schema.properties {
        let Some(value) = props.get(d.name) else {
            if d.required {
                issues.push(ValidationIssue::MissingRequired { property: d.name });
            }
            continue;
        };

        let items = value.items();
        if items.is_empty() && d.required {
            issues.push(ValidationIssue::MissingRequired { property: d.name });
        }
        if !d.is_multiple() && items.len() > 1 {
            issues.push(ValidationIssue::TooManyValues { property: d.name, count: items.len() });
        }
        for item in items {
            if !admits(d, item) {
                issues.push(ValidationIssue::UnexpectedType {
                    property: d.name,
                    found: describe(item),
                });
            }
        }
    }

    issues
}

fn admits(d: &Descriptor, value: &Value) -> bool {
    match value {
        Value::Bool(_) => d.admits_scalar(ScalarKind::Boolean),
        Value::Int(_) => d.admits_scalar(ScalarKind::Integer) || d.admits_scalar(ScalarKind::Float),
        Value::Float(_) => d.admits_scalar(ScalarKind::Float),
        Value::String(_) => d.admits_scalar(ScalarKind::Text) || d.admits_scalar(ScalarKind::Iri),
        Value::Date(_) => d.admits_scalar(ScalarKind::Date),
        Value::DateTime(_) => d.admits_scalar(ScalarKind::DateTime),
        Value::Embedded(e) => d.admits_schema(e.schema().name),
        Value::Entity(e) => d.admits_schema(e.schema().name),
        Value::Proxy(p) => d.admits_schema(p.schema().name),
        // Query results are typed by the query itself.
        Value::Query(_) => d.types.iter().any(|t| matches!(t, PropertyType::Schema(_))),
        Value::List(_) => false,
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Embedded(e) => e.schema().name.to_owned(),
        Value::Entity(e) => e.schema().name.to_owned(),
        Value::Proxy(p) => p.schema().name.to_owned(),
        other => other.type_name().to_owned(),
    }
}
