//! Generated openMINDS classes.
//!
//! Each class is a static [`Schema`] table plus a thin typed wrapper over
//! the generic [`EntityRef`] / [`EmbeddedValue`]. The wrappers only add
//! named accessors; all behavior lives in the core.
//!
//! | Class | Kind | Module |
//! |-------|------|--------|
//! | `Person` | entity | `actors` |
//! | `Organization` | entity | `actors` |
//! | `ContactInformation` | entity | `actors` |
//! | `Affiliation` | embedded | `actors` |
//! | `Dataset` | entity | `products` |
//! | `DatasetVersion` | entity | `products` |

pub mod actors;
pub mod products;

pub use actors::{Affiliation, ContactInformation, Organization, Person};
pub use products::{Dataset, DatasetVersion};

use crate::model::{Descriptor, EntityRef, PropertyType, ScalarKind, Schema, Value};
use crate::registry::Registry;
use crate::{Error, Result};

/// Property namespace.
pub const VOCAB: &str = "https://openminds.ebrains.eu/vocab/";

/// Type namespace of the core module.
pub const CORE: &str = "https://openminds.ebrains.eu/core/";

pub(crate) const TEXT: &[PropertyType] = &[PropertyType::Scalar(ScalarKind::Text)];
pub(crate) const DATE: &[PropertyType] = &[PropertyType::Scalar(ScalarKind::Date)];
pub(crate) const IRI: &[PropertyType] = &[PropertyType::Scalar(ScalarKind::Iri)];
pub(crate) const AGENT: &[PropertyType] =
    &[PropertyType::Schema("Person"), PropertyType::Schema("Organization")];

/// Registry holding every class of this module.
pub fn registry() -> Registry {
    Registry::new()
        .with(Person::SCHEMA)
        .with(Organization::SCHEMA)
        .with(ContactInformation::SCHEMA)
        .with(Affiliation::SCHEMA)
        .with(Dataset::SCHEMA)
        .with(DatasetVersion::SCHEMA)
}

// ============================================================================
// Accessor helpers shared by the wrappers
// ============================================================================

fn expect_schema(entity: &EntityRef, schema: &'static Schema) -> Result<()> {
    if entity.schema() == schema {
        Ok(())
    } else {
        Err(Error::InvalidDocument(format!(
            "expected a {}, got a {}",
            schema.name,
            entity.schema().name
        )))
    }
}

fn text(entity: &EntityRef, d: &Descriptor) -> Option<String> {
    entity.read().get(d.name).and_then(Value::as_str).map(str::to_owned)
}

fn texts(entity: &EntityRef, d: &Descriptor) -> Vec<String> {
    entity
        .read()
        .get(d.name)
        .map(|v| v.items().iter().filter_map(Value::as_str).map(str::to_owned).collect())
        .unwrap_or_default()
}

/// Elements of a property, empty when unset.
fn items(entity: &EntityRef, d: &Descriptor) -> Vec<Value> {
    entity.get(d.name).map(|v| v.items().to_vec()).unwrap_or_default()
}

/// Append to a multiple-valued property.
fn push(entity: &EntityRef, d: &Descriptor, value: Value) {
    let mut guard = entity.write();
    let mut values = guard.get(d.name).map(|v| v.items().to_vec()).unwrap_or_default();
    values.push(value);
    guard.put(d, values);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SchemaKind;

    #[test]
    fn test_registry_is_consistent() {
        let registry = registry();
        assert_eq!(registry.len(), 6);

        for schema in registry.schemas() {
            assert!(schema.type_uri.starts_with(CORE), "{}", schema.name);
            assert_eq!(schema.kind == SchemaKind::Embedded, schema.default_space.is_empty());

            for d in schema.properties {
                assert!(d.path.starts_with(VOCAB), "{}.{}", schema.name, d.name);
                for target in d.schema_targets() {
                    assert!(registry.get(target).is_some(), "{}.{} -> {target}", schema.name, d.name);
                }
            }
            for key in schema.existence_key {
                assert!(schema.descriptor(key).is_some(), "{}: key {key}", schema.name);
            }
            for r in schema.reverse_properties {
                for source in r.sources {
                    let source = registry.get(source).expect("reverse source registered");
                    assert!(source.descriptor_by_path(r.forward_path).is_some(), "{}", r.name);
                }
            }
        }
    }
}
