//! # openMINDS Object Model
//!
//! Types that describe nodes of the knowledge graph and the values they hold.
//! Schema tables, entities, embedded values and the JSON-LD codec live here.
//!
//! Design rule: no transport, no session state. Everything that needs the
//! network goes through [`crate::session::Session`].

pub mod node;
pub mod value;
pub mod property_map;
pub mod descriptor;
pub mod document;
pub mod validation;
pub mod entity;
pub mod embedded;
pub(crate) mod codec;

pub use node::{NodeId, ReleaseStatus};
pub use value::Value;
pub use property_map::PropertyMap;
pub use descriptor::{
    Descriptor, Multiplicity, PropertyType, ReverseDescriptor, ScalarKind, Schema, SchemaKind,
};
pub use document::Document;
pub use validation::ValidationIssue;
pub use entity::{Entity, EntityRef};
pub use embedded::EmbeddedValue;
