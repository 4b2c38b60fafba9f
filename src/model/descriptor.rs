//! Static schema metadata: property descriptors and per-type schema tables.
//!
//! Generated openMINDS classes declare one [`Schema`] each, built entirely
//! from `const` [`Descriptor`]s. The core reads these tables and never
//! mutates them.

/// Scalar kinds a property may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Text,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
    /// IRI / URL, stored as a string.
    Iri,
}

/// One admissible target of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    Scalar(ScalarKind),
    /// Another schema, by name. Entity schemas are linked by reference,
    /// embedded schemas are inlined.
    Schema(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Multiplicity {
    Single,
    Multiple,
}

/// A named, typed, forward property of a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    /// Local property name.
    pub name: &'static str,
    /// Wire key in the JSON-LD document.
    pub path: &'static str,
    /// Admissible targets. More than one means a union.
    pub types: &'static [PropertyType],
    pub multiplicity: Multiplicity,
    pub required: bool,
    /// Name of the paired reverse property on the target type(s).
    pub reverse: Option<&'static str>,
}

impl Descriptor {
    pub const fn new(
        name: &'static str,
        path: &'static str,
        types: &'static [PropertyType],
    ) -> Self {
        Self {
            name,
            path,
            types,
            multiplicity: Multiplicity::Single,
            required: false,
            reverse: None,
        }
    }

    pub const fn multiple(self) -> Self {
        Self { multiplicity: Multiplicity::Multiple, ..self }
    }

    pub const fn mark_required(self) -> Self {
        Self { required: true, ..self }
    }

    pub const fn with_reverse(self, reverse: &'static str) -> Self {
        Self { reverse: Some(reverse), ..self }
    }

    pub fn is_multiple(&self) -> bool {
        self.multiplicity == Multiplicity::Multiple
    }

    pub fn is_union(&self) -> bool {
        self.types.len() > 1
    }

    /// Names of the schemas this property may point at.
    pub fn schema_targets(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.types.iter().filter_map(|t| match t {
            PropertyType::Schema(name) => Some(*name),
            PropertyType::Scalar(_) => None,
        })
    }

    pub fn admits_scalar(&self, kind: ScalarKind) -> bool {
        self.types.contains(&PropertyType::Scalar(kind))
    }

    pub fn admits_schema(&self, name: &str) -> bool {
        self.schema_targets().any(|t| t == name)
    }
}

/// A property populated from the other side of a forward [`Descriptor`].
///
/// Never serialized. On read it becomes a [`crate::DeferredQuery`] over the
/// source types, filtered on `forward_path == this node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReverseDescriptor {
    pub name: &'static str,
    /// Wire path of the forward property on the source types.
    pub forward_path: &'static str,
    /// Schemas that carry the forward property.
    pub sources: &'static [&'static str],
    pub multiplicity: Multiplicity,
}

impl ReverseDescriptor {
    pub const fn new(
        name: &'static str,
        forward_path: &'static str,
        sources: &'static [&'static str],
    ) -> Self {
        Self { name, forward_path, sources, multiplicity: Multiplicity::Multiple }
    }

    pub const fn single(self) -> Self {
        Self { multiplicity: Multiplicity::Single, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    /// Identified, independently persisted node.
    Entity,
    /// Identifier-less value inlined into its owner.
    Embedded,
}

/// Static metadata of one generated openMINDS class.
#[derive(Debug)]
pub struct Schema {
    /// Class name, unique within a registry.
    pub name: &'static str,
    pub type_uri: &'static str,
    pub kind: SchemaKind,
    /// Space new nodes are created in. Empty for embedded schemas.
    pub default_space: &'static str,
    pub properties: &'static [Descriptor],
    pub reverse_properties: &'static [ReverseDescriptor],
    /// Property names sufficient to find an equivalent remote node.
    pub existence_key: &'static [&'static str],
}

impl Schema {
    pub fn descriptor(&self, name: &str) -> Option<&'static Descriptor> {
        self.properties.iter().find(|d| d.name == name)
    }

    pub fn descriptor_by_path(&self, path: &str) -> Option<&'static Descriptor> {
        self.properties.iter().find(|d| d.path == path)
    }

    pub fn reverse(&self, name: &str) -> Option<&'static ReverseDescriptor> {
        self.reverse_properties.iter().find(|r| r.name == name)
    }

    pub fn is_embedded(&self) -> bool {
        self.kind == SchemaKind::Embedded
    }

    /// Whether `name` is a forward or reverse property of this schema.
    pub fn has_property(&self, name: &str) -> bool {
        self.descriptor(name).is_some() || self.reverse(name).is_some()
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.type_uri == other.type_uri
    }
}

impl Eq for Schema {}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &[PropertyType] = &[PropertyType::Scalar(ScalarKind::Text)];
    const OWNER: &[PropertyType] = &[PropertyType::Schema("Person"), PropertyType::Schema("Organization")];

    static THING: Schema = Schema {
        name: "Thing",
        type_uri: "https://example.org/Thing",
        kind: SchemaKind::Entity,
        default_space: "common",
        properties: &[
            Descriptor::new("label", "https://example.org/label", TEXT).mark_required(),
            Descriptor::new("owners", "https://example.org/owner", OWNER)
                .multiple()
                .with_reverse("owns"),
        ],
        reverse_properties: &[],
        existence_key: &["label"],
    };

    #[test]
    fn test_descriptor_builders() {
        let label = THING.descriptor("label").unwrap();
        assert!(label.required);
        assert!(!label.is_multiple());
        assert!(label.admits_scalar(ScalarKind::Text));

        let owners = THING.descriptor_by_path("https://example.org/owner").unwrap();
        assert!(owners.is_multiple());
        assert!(owners.is_union());
        assert_eq!(owners.reverse, Some("owns"));
        assert_eq!(owners.schema_targets().collect::<Vec<_>>(), vec!["Person", "Organization"]);
    }

    #[test]
    fn test_schema_lookup() {
        assert!(THING.has_property("owners"));
        assert!(!THING.has_property("missing"));
        assert!(!THING.is_embedded());
    }
}
